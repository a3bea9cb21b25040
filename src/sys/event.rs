use serde::{Deserialize, Serialize};

use super::geometry::Point;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub enum MouseButton {
    Primary,
    Middle,
    Secondary,
}

/// What sits under the pointer in a preview pane, as reported by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewTarget {
    AppIcon { workspace: usize, app: String },
    Item(usize),
    Background,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerEvent {
    Press {
        button: MouseButton,
        at: Point,
        target: PreviewTarget,
    },
    Motion { at: Point },
    Release { button: MouseButton, at: Point },
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub enum Key {
    Escape,
    Other,
}
