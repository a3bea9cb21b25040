use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::geometry::{Point, Rect};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    /// Position in the host's monitor list. Not stable across hot-plug.
    pub index: usize,
    /// Connector name, used to key per-monitor settings.
    pub connector: String,
    pub frame: Rect,
    #[serde(default)]
    pub is_primary: bool,
}

impl Monitor {
    pub fn new(index: usize, connector: impl Into<String>, frame: Rect) -> Self {
        Self {
            index,
            connector: connector.into(),
            frame,
            is_primary: false,
        }
    }

    /// Key for per-monitor settings.
    pub fn id(&self) -> &str { &self.connector }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }
}

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("could not parse topology: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("monitor at position {position} declares index {found}")]
    MonitorIndex { position: usize, found: usize },
    #[error("monitor {0} has an empty frame")]
    EmptyFrame(usize),
    #[error("more than one monitor is marked primary")]
    MultiplePrimaries,
}

/// Read access to the host's monitor layout.
///
/// Change notifications (`monitors-changed`, `workareas-changed`) are
/// delivered by the host as [`crate::actor::shell::Event`]s.
pub trait DisplayTopology {
    fn monitors(&self) -> Vec<Monitor>;

    /// The system-designated primary monitor, if any.
    fn primary_index(&self) -> Option<usize>;

    /// The monitor area left over after all struts are subtracted.
    fn work_area(&self, index: usize) -> Option<Rect>;

    fn is_rtl(&self) -> bool { false }

    /// Pointer distance before a press becomes a drag, if the host exposes one.
    fn drag_threshold(&self) -> Option<u32> { None }

    fn snapshot(&self) -> TopologySnapshot {
        let monitors = self.monitors();
        let work_areas =
            monitors.iter().map(|m| self.work_area(m.index).unwrap_or(m.frame)).collect();
        TopologySnapshot {
            primary: self.primary_index(),
            monitors,
            work_areas,
            rtl: self.is_rtl(),
        }
    }
}

/// A point-in-time copy of the display layout. The resolver only ever works
/// on snapshots so that a single pass sees a consistent topology.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub monitors: Vec<Monitor>,
    #[serde(default)]
    pub primary: Option<usize>,
    #[serde(default)]
    pub work_areas: Vec<Rect>,
    #[serde(default)]
    pub rtl: bool,
}

impl TopologySnapshot {
    pub fn new(monitors: Vec<Monitor>) -> Self {
        let primary = monitors.iter().find(|m| m.is_primary).map(|m| m.index);
        Self {
            monitors,
            primary,
            work_areas: vec![],
            rtl: false,
        }
    }

    pub fn from_ron(text: &str) -> Result<Self, TopologyError> {
        let mut snapshot: TopologySnapshot = ron::from_str(text)?;
        snapshot.validate()?;
        if snapshot.primary.is_none() {
            snapshot.primary = snapshot.monitors.iter().find(|m| m.is_primary).map(|m| m.index);
        }
        debug!(monitors = snapshot.monitors.len(), primary = ?snapshot.primary, "loaded topology");
        Ok(snapshot)
    }

    pub fn validate(&self) -> Result<(), TopologyError> {
        for (position, monitor) in self.monitors.iter().enumerate() {
            if monitor.index != position {
                return Err(TopologyError::MonitorIndex { position, found: monitor.index });
            }
            if monitor.frame.size().is_empty() {
                return Err(TopologyError::EmptyFrame(position));
            }
        }
        if self.monitors.iter().filter(|m| m.is_primary).count() > 1 {
            return Err(TopologyError::MultiplePrimaries);
        }
        Ok(())
    }

    pub fn monitor(&self, index: usize) -> Option<&Monitor> { self.monitors.get(index) }

    pub fn primary_monitor(&self) -> Option<&Monitor> {
        self.primary.and_then(|i| self.monitor(i))
    }

    pub fn find_connector(&self, connector: &str) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.connector == connector)
    }

    /// Index of the monitor whose frame contains `point` (half-open).
    pub fn monitor_at(&self, point: Point) -> Option<usize> {
        self.monitors.iter().find(|m| m.frame.contains(point)).map(|m| m.index)
    }

    pub fn work_area_of(&self, index: usize) -> Option<Rect> {
        match self.work_areas.get(index) {
            Some(wa) => Some(*wa),
            None => self.monitor(index).map(|m| m.frame),
        }
    }
}

impl DisplayTopology for TopologySnapshot {
    fn monitors(&self) -> Vec<Monitor> { self.monitors.clone() }

    fn primary_index(&self) -> Option<usize> {
        match self.primary {
            Some(i) if i < self.monitors.len() => Some(i),
            Some(i) => {
                warn!(index = i, "primary index out of range");
                None
            }
            None => None,
        }
    }

    fn work_area(&self, index: usize) -> Option<Rect> { self.work_area_of(index) }

    fn is_rtl(&self) -> bool { self.rtl }
}
