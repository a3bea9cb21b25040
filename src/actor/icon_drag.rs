//! Pointer state machine for dragging an app icon between preview items.

use tracing::{debug, trace};

use crate::sys::event::Key;
use crate::sys::geometry::{Point, Rect};
use crate::sys::workspace::{AppId, WorkspaceId};

pub const FALLBACK_DRAG_THRESHOLD: u32 = 8;

/// A preview item's position together with the workspace it was bound to
/// when the pointer interaction started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundItem {
    pub index: usize,
    pub workspace: WorkspaceId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub item: BoundItem,
    pub bounds: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Armed {
        app: AppId,
        source: BoundItem,
        origin: Point,
    },
    Dragging {
        app: AppId,
        source: BoundItem,
        /// Snapshotted when the drag starts.
        targets: Vec<DropTarget>,
        hover: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    Nothing,
    Started { app: AppId, hover: Option<usize> },
    Hover(Option<usize>),
    /// Released without moving far enough: a plain click.
    Activate { app: AppId, on: BoundItem },
    Move { app: AppId, from: BoundItem, to: BoundItem },
    /// Released over the source item or outside every item.
    Dropped,
    Cancelled,
}

#[derive(Debug)]
pub struct InteractionController {
    state: DragState,
    threshold: u32,
}

impl InteractionController {
    pub fn new(threshold: Option<u32>) -> Self {
        Self {
            state: DragState::Idle,
            threshold: threshold.unwrap_or(FALLBACK_DRAG_THRESHOLD),
        }
    }

    pub fn state(&self) -> &DragState { &self.state }

    pub fn is_idle(&self) -> bool { self.state == DragState::Idle }

    pub fn is_dragging(&self) -> bool { matches!(self.state, DragState::Dragging { .. }) }

    pub fn threshold(&self) -> u32 { self.threshold }

    pub fn press(&mut self, app: AppId, source: BoundItem, at: Point) {
        if !self.is_idle() {
            debug!(state = ?self.state, "press while busy; restarting");
        }
        self.state = DragState::Armed { app, source, origin: at };
    }

    /// `targets` is only called when the pointer first crosses the threshold.
    pub fn motion(
        &mut self,
        at: Point,
        targets: impl FnOnce() -> Vec<DropTarget>,
    ) -> DragOutcome {
        match &mut self.state {
            DragState::Idle => DragOutcome::Nothing,
            DragState::Armed { app, source, origin } => {
                let t = self.threshold as i64;
                if origin.distance_squared(at) < t * t {
                    return DragOutcome::Nothing;
                }
                let targets = targets();
                let hover = hit(&targets, at).map(|t| t.index);
                let app = std::mem::take(app);
                trace!(%app, source = source.index, ?hover, "drag started");
                self.state = DragState::Dragging {
                    app: app.clone(),
                    source: *source,
                    targets,
                    hover,
                };
                DragOutcome::Started { app, hover }
            }
            DragState::Dragging { targets, hover, .. } => {
                let now = hit(targets, at).map(|t| t.index);
                if now == *hover {
                    return DragOutcome::Nothing;
                }
                *hover = now;
                DragOutcome::Hover(now)
            }
        }
    }

    pub fn release(&mut self, at: Point) -> DragOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Idle => DragOutcome::Nothing,
            DragState::Armed { app, source, .. } => DragOutcome::Activate { app, on: source },
            DragState::Dragging { app, source, targets, .. } => match hit(&targets, at) {
                Some(to) if to.index != source.index => {
                    DragOutcome::Move { app, from: source, to }
                }
                _ => DragOutcome::Dropped,
            },
        }
    }

    pub fn key(&mut self, key: Key) -> DragOutcome {
        match key {
            Key::Escape => self.cancel(),
            Key::Other => DragOutcome::Nothing,
        }
    }

    pub fn cancel(&mut self) -> DragOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Idle => DragOutcome::Nothing,
            _ => DragOutcome::Cancelled,
        }
    }
}

fn hit(targets: &[DropTarget], at: Point) -> Option<BoundItem> {
    targets.iter().find(|t| t.bounds.contains_inclusive(at)).map(|t| t.item)
}
