//! Keeps one panel's preview items in step with the live workspace
//! collection.
//!
//! The common cases (workspaces appended or removed at the end) are applied
//! incrementally. Anything else, including a count that cannot be trusted, is
//! handled by a full rebuild. Timing is owned by the shell actor: methods
//! here run synchronously and report what they did.

use std::rc::Rc;

use slotmap::SlotMap;
use tracing::{debug, instrument, trace, warn};

use super::icon_drag::{BoundItem, DragOutcome, DragState, DropTarget, InteractionController};
use crate::layout_engine::graph::Side;
use crate::layout_engine::preview_size::{
    DEFAULT_ICON_SIZE, FALLBACK_ITEM_HEIGHT, MAX_ITEMS, NamePosition, Stack, available_height,
    clamp_icon_size, ideal_height, thumbnail_geometry,
};
use crate::model::app_cache::WindowAppCache;
use crate::model::icon_order::{IconOrderCache, IconOrderMode, IconStrip, dedup};
use crate::model::panel::{Panel, PanelId};
use crate::model::preview::{ItemId, PreviewItem, label_text};
use crate::model::shortcuts;
use crate::sys::Host;
use crate::sys::event::{Key, MouseButton, PointerEvent, PreviewTarget};
use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::screen::Monitor;
use crate::sys::settings::{SettingKey, SettingValue, SettingsStore};
use crate::sys::workspace::{AppId, WindowInfo, WorkspaceId};
use crate::ui::preview::{PreviewLayout, PreviewRenderer};

/// Counts outside `0..=MAX_WORKSPACES` are treated as malformed.
pub const MAX_WORKSPACES: i64 = MAX_ITEMS as i64;
pub const DEFAULT_SPACING: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Incremental { added: usize, removed: usize },
    Rebuilt,
    /// A rebuild was already running.
    Skipped,
}

impl SyncOutcome {
    pub fn changed(self) -> bool {
        match self {
            SyncOutcome::Incremental { added, removed } => added + removed > 0,
            SyncOutcome::Rebuilt => true,
            SyncOutcome::Skipped => false,
        }
    }
}

/// Preview settings read from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    pub spacing: i32,
    pub icon_size: i32,
    pub names: NamePosition,
    pub icon_order: IconOrderMode,
    pub isolate_monitors: bool,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_SPACING,
            icon_size: DEFAULT_ICON_SIZE,
            names: NamePosition::default(),
            icon_order: IconOrderMode::Stable,
            isolate_monitors: false,
        }
    }
}

impl PreviewOptions {
    pub fn load(store: &dyn SettingsStore) -> PreviewOptions {
        let stable = match store.get(SettingKey::StableIconOrder) {
            Some(SettingValue::Bool(b)) => b,
            _ => true,
        };
        PreviewOptions {
            spacing: store
                .get_int(SettingKey::PreviewSpacing)
                .map(|s| s.clamp(0, 64) as i32)
                .unwrap_or(DEFAULT_SPACING),
            icon_size: store
                .get_int(SettingKey::AppIconSize)
                .map(clamp_icon_size)
                .unwrap_or(DEFAULT_ICON_SIZE),
            names: store
                .get_string(SettingKey::NamePosition)
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            icon_order: if stable { IconOrderMode::Stable } else { IconOrderMode::Recency },
            isolate_monitors: store.get_bool(SettingKey::IsolateMonitors),
        }
    }
}

pub struct WorkspacePreview {
    panel: PanelId,
    monitor: Monitor,
    side: Side,
    thickness: i32,
    host: Host,
    renderer: Rc<dyn PreviewRenderer>,
    app_cache: WindowAppCache,
    options: PreviewOptions,
    items: SlotMap<ItemId, PreviewItem>,
    order: Vec<ItemId>,
    icon_order: IconOrderCache,
    drag: InteractionController,
    /// Workspace index and app of the icon currently styled as focused.
    focused: Option<(usize, AppId)>,
    work_area: Rect,
    item_size: Size,
    layout: Option<PreviewLayout>,
    rebuilding: bool,
}

impl WorkspacePreview {
    /// Creates an empty preview; call [`WorkspacePreview::rebuild_all`] to
    /// populate it.
    pub fn new(
        host: Host,
        renderer: Rc<dyn PreviewRenderer>,
        panel: &Panel,
        thickness: i32,
        app_cache: WindowAppCache,
    ) -> WorkspacePreview {
        let options = PreviewOptions::load(&*host.settings);
        let work_area = host.topology.work_area(panel.monitor.index).unwrap_or(panel.monitor.frame);
        let drag = InteractionController::new(host.topology.drag_threshold());
        WorkspacePreview {
            panel: panel.id,
            monitor: panel.monitor.clone(),
            side: panel.geometry.position,
            thickness,
            host,
            renderer,
            app_cache,
            options,
            items: SlotMap::with_key(),
            order: vec![],
            icon_order: IconOrderCache::new(),
            drag,
            focused: None,
            work_area,
            item_size: Size::new(thickness, FALLBACK_ITEM_HEIGHT),
            layout: None,
            rebuilding: false,
        }
    }

    pub fn panel(&self) -> PanelId { self.panel }

    pub fn monitor(&self) -> &Monitor { &self.monitor }

    pub fn len(&self) -> usize { self.order.len() }

    pub fn is_empty(&self) -> bool { self.order.is_empty() }

    pub fn item_ids(&self) -> &[ItemId] { &self.order }

    pub fn item(&self, index: usize) -> Option<&PreviewItem> {
        self.order.get(index).and_then(|&id| self.items.get(id))
    }

    pub fn item_size(&self) -> Size { self.item_size }

    pub fn options(&self) -> PreviewOptions { self.options }

    pub fn is_dragging(&self) -> bool { self.drag.is_dragging() }

    fn live_count(&self) -> Option<usize> {
        let raw = self.host.workspaces.count();
        if !(0..=MAX_WORKSPACES).contains(&raw) {
            warn!(raw, "implausible workspace count");
            return None;
        }
        Some(raw as usize)
    }

    fn first_stale_binding(&self, upto: usize) -> Option<usize> {
        (0..upto).find(|&i| {
            let bound = self.items.get(self.order[i]).map(|item| item.workspace);
            bound.is_none() || bound != self.host.workspaces.get(i)
        })
    }

    fn push_item(&mut self, workspace: WorkspaceId, index: usize) {
        let id = self.items.insert(PreviewItem::new(workspace, index));
        self.order.push(id);
        self.renderer.create_item(id, index);
    }

    fn clear_items(&mut self) {
        for id in self.order.drain(..) {
            self.renderer.destroy_item(id);
        }
        self.items.clear();
    }

    /// Brings the item list in line with the workspace collection.
    #[instrument(name = "workspace_preview::sync_items", skip(self), fields(panel = ?self.panel))]
    pub fn sync_items(&mut self) -> SyncOutcome {
        if self.rebuilding {
            debug!("sync requested during rebuild");
            return SyncOutcome::Skipped;
        }
        let Some(desired) = self.live_count() else {
            self.rebuild_all();
            return SyncOutcome::Rebuilt;
        };
        let current = self.order.len();
        if let Some(index) = self.first_stale_binding(current.min(desired)) {
            debug!(index, "workspace binding changed; rebuilding");
            self.rebuild_all();
            return SyncOutcome::Rebuilt;
        }

        let (mut added, mut removed) = (0, 0);
        if current > desired {
            let dropped: Vec<ItemId> = self.order.drain(desired..).collect();
            for id in dropped {
                self.items.remove(id);
                self.renderer.destroy_item(id);
                removed += 1;
            }
            self.icon_order.clear();
            if self.focused.as_ref().is_some_and(|(index, _)| *index >= desired) {
                self.focused = None;
            }
        }
        for index in current..desired {
            let Some(workspace) = self.host.workspaces.get(index) else {
                debug!(index, "workspace vanished while appending; rebuilding");
                self.rebuild_all();
                return SyncOutcome::Rebuilt;
            };
            self.push_item(workspace, index);
            added += 1;
        }

        self.update_layout();
        self.refresh_active();
        self.refresh_labels();
        for index in current..desired {
            self.refresh_icons(index);
        }
        self.geometry_pass();
        trace!(added, removed, "incremental sync");
        SyncOutcome::Incremental { added, removed }
    }

    /// Recreates every item from the current collection.
    #[instrument(name = "workspace_preview::rebuild_all", skip(self), fields(panel = ?self.panel))]
    pub fn rebuild_all(&mut self) {
        if self.rebuilding {
            return;
        }
        self.rebuilding = true;
        self.clear_items();
        self.icon_order.clear();
        self.focused = None;

        let count = self.host.workspaces.count().clamp(0, MAX_WORKSPACES) as usize;
        for index in 0..count {
            let Some(workspace) = self.host.workspaces.get(index) else {
                debug!(index, count, "workspace list shorter than its count");
                break;
            };
            self.push_item(workspace, index);
        }

        self.update_layout();
        self.refresh_active();
        self.refresh_labels();
        for index in 0..self.order.len() {
            self.refresh_icons(index);
        }
        self.refresh_shortcuts();
        self.geometry_pass();
        self.on_focus_changed();
        self.rebuilding = false;
        debug!(items = self.order.len(), "rebuilt preview");
    }

    /// Recomputes item size and pushes the pane layout when it changed.
    fn update_layout(&mut self) {
        let o = self.options;
        let stack = Stack::for_preview(o.spacing, o.icon_size, o.names);
        let wa = self.work_area.size();
        let ideal = ideal_height(self.thickness, Some(wa));
        let available = available_height(
            self.renderer.allocation(),
            self.side,
            self.monitor.frame.height,
            self.thickness,
            o.icon_size,
        );
        let height = stack.fit(ideal, self.order.len(), Some(available));
        let width = if height >= ideal || wa.is_empty() {
            self.thickness
        } else {
            (height as f64 * wa.width as f64 / wa.height as f64).round() as i32
        };
        self.item_size = Size::new(width, height);

        let layout = PreviewLayout::new(
            self.side,
            self.thickness,
            &stack,
            self.item_size,
            o.icon_size,
            o.names,
        );
        if self.layout != Some(layout) {
            trace!(?layout, "preview layout changed");
            self.renderer.set_layout(&layout);
            self.layout = Some(layout);
        }
    }

    /// Pushes thumbnail geometry to items whose size or work area changed.
    /// Returns the number of items updated.
    pub fn geometry_pass(&mut self) -> usize {
        let key = (self.item_size, self.work_area);
        let Some(geometry) = thumbnail_geometry(self.item_size, self.work_area) else {
            return 0;
        };
        let mut pushed = 0;
        for &id in &self.order {
            let Some(item) = self.items.get_mut(id) else { continue };
            if item.geometry_key == Some(key) {
                continue;
            }
            item.geometry_key = Some(key);
            self.renderer.set_item_geometry(id, self.item_size, geometry);
            pushed += 1;
        }
        pushed
    }

    /// Re-reads this monitor's work area. Returns whether it changed.
    pub fn on_workarea_changed(&mut self) -> bool {
        let Some(work_area) = self.host.topology.work_area(self.monitor.index) else {
            debug!(monitor = self.monitor.index, "monitor has no work area");
            return false;
        };
        if work_area == self.work_area {
            return false;
        }
        self.work_area = work_area;
        self.update_layout();
        self.geometry_pass();
        true
    }

    pub fn on_allocation_changed(&mut self) {
        self.update_layout();
        self.geometry_pass();
    }

    pub fn refresh_active(&mut self) {
        let active = self.host.workspaces.active_index();
        for (index, &id) in self.order.iter().enumerate() {
            let Some(item) = self.items.get_mut(id) else { continue };
            let is_active = active == Some(index);
            if item.is_active != is_active {
                item.is_active = is_active;
                self.renderer.set_item_active(id, is_active);
            }
        }
    }

    pub fn refresh_labels(&mut self) {
        for (index, &id) in self.order.iter().enumerate() {
            let Some(item) = self.items.get_mut(id) else { continue };
            let label = label_text(index, self.host.workspaces.name(index).as_deref());
            if item.label != label {
                self.renderer.set_item_label(id, &label);
                item.label = label;
            }
        }
    }

    /// Re-renders the icon strip of one item if its content changed.
    pub fn refresh_icons(&mut self, index: usize) -> bool {
        let Some(&id) = self.order.get(index) else { return false };
        let Some(workspace) = self.items.get(id).map(|item| item.workspace) else { return false };
        if self.host.workspaces.get(index) != Some(workspace) {
            debug!(index, "workspace moved before icon refresh");
            return false;
        }

        let monitor = self.monitor.index;
        let isolate = self.options.isolate_monitors;
        let entries = dedup(
            self.host
                .workspaces
                .windows(workspace)
                .into_iter()
                .filter(|w| !w.skip_taskbar)
                .filter(|w| !isolate || w.monitor.is_none_or(|m| m == monitor))
                .filter_map(|w| {
                    let app = self.app_cache.app_for(w.id, &*self.host.apps)?;
                    Some((app, w.user_time))
                }),
        );
        let strip = IconStrip::new(self.icon_order.order(index, &entries, self.options.icon_order));
        let signature = strip.signature(self.options.icon_size);

        let Some(item) = self.items.get_mut(id) else { return false };
        if item.icon_signature == Some(signature) {
            return false;
        }
        item.icon_signature = Some(signature);
        self.renderer.set_item_icons(id, &strip);
        if let Some((focused_index, app)) = &self.focused
            && *focused_index == index
            && strip.shown.contains(app)
        {
            self.renderer.set_icon_focused(id, app, true);
        }
        true
    }

    pub fn refresh_all_icons(&mut self) {
        for index in 0..self.order.len() {
            self.refresh_icons(index);
        }
    }

    /// Restyles only the previously and newly focused icons.
    pub fn on_focus_changed(&mut self) {
        let focused = self
            .host
            .workspaces
            .focus_window()
            .and_then(|w| self.app_cache.app_for(w, &*self.host.apps))
            .zip(self.host.workspaces.active_index())
            .map(|(app, index)| (index, app));
        if focused == self.focused {
            return;
        }
        if let Some((index, app)) = self.focused.take()
            && let Some(&id) = self.order.get(index)
        {
            self.renderer.set_icon_focused(id, &app, false);
        }
        if let Some((index, app)) = &focused
            && let Some(&id) = self.order.get(*index)
        {
            self.renderer.set_icon_focused(id, app, true);
        }
        self.focused = focused;
    }

    /// Re-reads the preview settings. Returns whether anything changed.
    pub fn reload_options(&mut self) -> bool {
        let options = PreviewOptions::load(&*self.host.settings);
        if options == self.options {
            return false;
        }
        let reorder = options.icon_order != self.options.icon_order
            || options.isolate_monitors != self.options.isolate_monitors;
        self.options = options;
        if reorder {
            self.icon_order.clear();
            for item in self.items.values_mut() {
                item.icon_signature = None;
            }
        }
        self.update_layout();
        self.geometry_pass();
        self.refresh_all_icons();
        true
    }

    pub fn refresh_shortcuts(&self) {
        self.renderer.set_shortcuts(&shortcuts::load(&*self.host.settings, &*self.host.apps));
    }

    #[instrument(
        name = "workspace_preview::handle_pointer",
        skip(self),
        fields(panel = ?self.panel)
    )]
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Press { button: MouseButton::Primary, at, target } => match target {
                PreviewTarget::AppIcon { workspace, app } => self.press_icon(app, workspace, at),
                PreviewTarget::Item(index) => self.activate_workspace(index),
                PreviewTarget::Background => {}
            },
            PointerEvent::Press {
                button: MouseButton::Secondary,
                target: PreviewTarget::Background,
                ..
            } => self.toggle_intellihide(),
            PointerEvent::Press { .. } => {}
            PointerEvent::Motion { at } => self.drag_motion(at),
            PointerEvent::Release { button: MouseButton::Primary, at } => {
                let was_dragging = self.drag.is_dragging();
                let outcome = self.drag.release(at);
                if was_dragging {
                    self.end_drag_visuals();
                }
                self.apply(outcome);
            }
            PointerEvent::Release { .. } => {}
        }
    }

    pub fn handle_key(&mut self, key: Key) {
        let was_dragging = self.drag.is_dragging();
        if self.drag.key(key) == DragOutcome::Cancelled && was_dragging {
            self.end_drag_visuals();
        }
    }

    fn bound_item(&self, index: usize) -> Option<BoundItem> {
        let id = self.order.get(index)?;
        let workspace = self.items.get(*id)?.workspace;
        Some(BoundItem { index, workspace })
    }

    fn press_icon(&mut self, app: AppId, index: usize, at: Point) {
        match self.bound_item(index) {
            Some(source) => self.drag.press(app, source, at),
            None => debug!(index, %app, "pressed icon has no bound item"),
        }
    }

    fn drag_motion(&mut self, at: Point) {
        let order = &self.order;
        let items = &self.items;
        let renderer = &self.renderer;
        let targets = || {
            order
                .iter()
                .enumerate()
                .filter_map(|(index, &id)| {
                    let workspace = items.get(id)?.workspace;
                    Some(DropTarget {
                        item: BoundItem { index, workspace },
                        bounds: renderer.item_bounds(id)?,
                    })
                })
                .collect()
        };
        match self.drag.motion(at, targets) {
            DragOutcome::Started { hover, .. } | DragOutcome::Hover(hover) => {
                self.renderer.set_drop_target(hover.and_then(|i| self.order.get(i).copied()));
            }
            _ => {}
        }
        if let DragState::Dragging { app, .. } = self.drag.state() {
            self.renderer.show_drag_ghost(app, at);
        }
    }

    fn end_drag_visuals(&self) {
        self.renderer.hide_drag_ghost();
        self.renderer.set_drop_target(None);
    }

    fn apply(&mut self, outcome: DragOutcome) {
        match outcome {
            DragOutcome::Activate { app, on } => self.activate_app_on(on, &app),
            DragOutcome::Move { app, from, to } => self.move_app(&app, from, to),
            _ => {}
        }
    }

    fn toggle_intellihide(&self) {
        let on = self.host.settings.get_bool(SettingKey::Intellihide);
        if let Err(err) = self.host.settings.set(SettingKey::Intellihide, SettingValue::Bool(!on)) {
            warn!(%err, "could not toggle intellihide");
        }
    }

    fn activate_workspace(&self, index: usize) {
        if self.host.workspaces.get(index).is_none() {
            debug!(index, "clicked workspace is gone");
            return;
        }
        self.host.workspaces.activate_workspace(index);
    }

    fn app_windows(&self, workspace: WorkspaceId, app: &str) -> Vec<WindowInfo> {
        self.host
            .workspaces
            .windows(workspace)
            .into_iter()
            .filter(|w| self.app_cache.app_for(w.id, &*self.host.apps).as_deref() == Some(app))
            .collect()
    }

    /// True when the item still points at the workspace it was bound to.
    fn still_bound(&self, item: BoundItem) -> bool {
        let live = self.host.workspaces.get(item.index);
        if live != Some(item.workspace) {
            debug!(
                index = item.index,
                bound = ?item.workspace,
                ?live,
                "workspace changed under the pointer"
            );
            return false;
        }
        true
    }

    /// Focuses the app's focused window if it has one on the workspace, else
    /// its most recently used one, else launches the app.
    fn activate_app_on(&self, on: BoundItem, app: &str) {
        if !self.still_bound(on) {
            return;
        }
        let (index, workspace) = (on.index, on.workspace);
        let windows = self.app_windows(workspace, app);
        let focus = self.host.workspaces.focus_window();
        let target = windows
            .iter()
            .find(|w| Some(w.id) == focus)
            .or_else(|| windows.iter().max_by_key(|w| w.user_time));
        match target {
            Some(window) => {
                if self.host.workspaces.active_index() != Some(index) {
                    self.host.workspaces.activate_workspace(index);
                }
                self.host.workspaces.activate_window(window.id);
            }
            None => self.host.apps.activate_app(app),
        }
    }

    fn move_app(&self, app: &str, from: BoundItem, to: BoundItem) {
        if !self.still_bound(from) || !self.still_bound(to) {
            return;
        }
        let windows = self.app_windows(from.workspace, app);
        if windows.is_empty() {
            debug!(app, from = from.index, "no windows left to move");
            return;
        }
        for window in &windows {
            let monitor = window.monitor.unwrap_or(self.monitor.index);
            self.host.workspaces.move_window(window.id, monitor, to.index);
        }
        self.host.workspaces.activate_workspace(to.index);
    }

    pub fn shortcut_clicked(&self, slot: usize, button: MouseButton) {
        let slots = shortcuts::load(&*self.host.settings, &*self.host.apps);
        let Some(current) = slots.get(slot) else { return };
        match button {
            MouseButton::Primary => {
                if let Some(app) = current
                    && self.host.apps.app_exists(app)
                {
                    self.host.apps.activate_app(app);
                    return;
                }
            }
            MouseButton::Secondary => {}
            MouseButton::Middle => return,
        }
        self.renderer.open_shortcut_chooser(slot, current.as_deref(), &self.host.apps.favorites());
    }

    pub fn choose_shortcut(&self, slot: usize, app: Option<AppId>) {
        shortcuts::set_slot(&*self.host.settings, &*self.host.apps, slot, app);
        self.refresh_shortcuts();
    }

    /// Removes every item and drops any drag in progress.
    pub fn destroy(&mut self) {
        let was_dragging = self.drag.is_dragging();
        if self.drag.cancel() == DragOutcome::Cancelled && was_dragging {
            self.end_drag_visuals();
        }
        self.clear_items();
        self.icon_order.clear();
        self.focused = None;
    }
}
