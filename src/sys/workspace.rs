use serde::{Deserialize, Serialize};

/// Opaque workspace identity. Two indices may swap identities between
/// notifications, so bindings compare these rather than indices.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct WorkspaceId(u64);

impl WorkspaceId {
    pub fn new(id: u64) -> WorkspaceId { WorkspaceId(id) }

    pub fn get(&self) -> u64 { self.0 }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct WindowId(u64);

impl WindowId {
    pub fn new(id: u64) -> WindowId { WindowId(id) }

    pub fn get(&self) -> u64 { self.0 }
}

/// Desktop application identifier (e.g. `org.gnome.Nautilus.desktop`).
pub type AppId = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    /// Last user interaction timestamp; larger is more recent.
    pub user_time: u64,
    /// Monitor the window lives on, if known.
    pub monitor: Option<usize>,
    pub skip_taskbar: bool,
}

/// The host's live, externally mutable workspace list.
pub trait WorkspaceCollection {
    /// Raw workspace count as reported by the host. May be malformed.
    fn count(&self) -> i64;

    fn get(&self, index: usize) -> Option<WorkspaceId>;

    fn active_index(&self) -> Option<usize>;

    fn name(&self, _index: usize) -> Option<String> { None }

    fn windows(&self, workspace: WorkspaceId) -> Vec<WindowInfo>;

    fn focus_window(&self) -> Option<WindowId>;

    fn move_window(&self, window: WindowId, monitor: usize, workspace: usize);

    fn activate_workspace(&self, index: usize);

    fn activate_window(&self, window: WindowId);
}
