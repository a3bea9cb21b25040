use slotmap::new_key_type;

use crate::sys::geometry::{Rect, Size};
use crate::sys::workspace::WorkspaceId;

new_key_type! {
    pub struct ItemId;
}

/// One workspace's entry in a preview pane.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewItem {
    /// Re-validated against the live collection before incremental updates.
    pub workspace: WorkspaceId,
    pub index: usize,
    pub is_active: bool,
    pub label: String,
    pub icon_signature: Option<u64>,
    /// Last `(thumbnail size, work area)` pushed to the renderer.
    pub geometry_key: Option<(Size, Rect)>,
}

impl PreviewItem {
    pub fn new(workspace: WorkspaceId, index: usize) -> PreviewItem {
        PreviewItem {
            workspace,
            index,
            is_active: false,
            label: String::new(),
            icon_signature: None,
            geometry_key: None,
        }
    }
}

/// `"{n}"`, or `"{n}. {name}"` when the workspace has a name.
pub fn label_text(index: usize, name: Option<&str>) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("{}. {}", index + 1, name),
        None => format!("{}", index + 1),
    }
}
