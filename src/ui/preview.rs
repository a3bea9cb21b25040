//! The rendering side of a workspace preview pane.
//!
//! The preview engine decides what is shown; a [`PreviewRenderer`] owned by
//! the host draws it. Renderers receive plain data and never call back into
//! the engine; pointer input returns through [`crate::actor::shell::Event`].

use serde::{Deserialize, Serialize};

use crate::layout_engine::graph::{Orientation, Side};
use crate::layout_engine::preview_size::{NamePosition, Stack, ThumbnailGeometry};
use crate::model::icon_order::IconStrip;
use crate::model::preview::ItemId;
use crate::model::shortcuts::Slots;
use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::workspace::AppId;

/// Pane and list metrics pushed to the renderer whenever they change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewLayout {
    /// Fixed pane width for side panels.
    pub fixed_width: Option<i32>,
    /// Fixed pane height for top and bottom panels.
    pub fixed_height: Option<i32>,
    pub list_spacing: i32,
    pub list_bottom_padding: i32,
    pub item_width: i32,
    pub item_height: i32,
    pub icon_size: i32,
    pub names: NamePosition,
    pub shortcut_bar_height: i32,
}

impl PreviewLayout {
    pub fn new(
        side: Side,
        thickness: i32,
        stack: &Stack,
        item: Size,
        icon_size: i32,
        names: NamePosition,
    ) -> Self {
        let (fixed_width, fixed_height) = match side.orientation() {
            Orientation::Vertical => (Some(thickness), None),
            Orientation::Horizontal => (None, Some(thickness)),
        };
        PreviewLayout {
            fixed_width,
            fixed_height,
            list_spacing: stack.spacing,
            list_bottom_padding: stack.bottom_pad,
            item_width: item.width,
            item_height: item.height,
            icon_size,
            names,
            shortcut_bar_height: crate::layout_engine::preview_size::shortcut_bar_height(icon_size),
        }
    }
}

/// Draws one preview pane.
pub trait PreviewRenderer {
    fn create_item(&self, item: ItemId, index: usize);

    fn destroy_item(&self, item: ItemId);

    fn set_item_active(&self, item: ItemId, active: bool);

    fn set_item_label(&self, item: ItemId, text: &str);

    fn set_item_geometry(&self, item: ItemId, size: Size, content: ThumbnailGeometry);

    fn set_item_icons(&self, item: ItemId, icons: &IconStrip);

    fn set_icon_focused(&self, item: ItemId, app: &str, focused: bool);

    fn set_layout(&self, layout: &PreviewLayout);

    fn set_shortcuts(&self, slots: &Slots);

    /// Current size of the pane, once the host has laid it out.
    fn allocation(&self) -> Option<Size>;

    /// Screen bounds of an item, for drop-target hit testing.
    fn item_bounds(&self, item: ItemId) -> Option<Rect>;

    fn show_drag_ghost(&self, app: &str, at: Point);

    fn hide_drag_ghost(&self);

    fn set_drop_target(&self, item: Option<ItemId>);

    /// Offers `candidates` for shortcut slot `slot`.
    fn open_shortcut_chooser(&self, slot: usize, current: Option<&str>, candidates: &[AppId]);
}
