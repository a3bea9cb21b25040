//! Capabilities of the host desktop shell that the engines drive.

use std::rc::Rc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::screen::Monitor;
use super::workspace::{AppId, WindowId};
use crate::layout_engine::graph::Side;
use crate::layout_engine::hot_corner::HotCorner;
use crate::model::panel::PanelId;
use crate::ui::preview::PreviewRenderer;

bitflags! {
    /// How the host treats a panel container.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChromeFlags: u8 {
        const AFFECTS_STRUTS = 1 << 0;
        const TRACK_FULLSCREEN = 1 << 1;
        const AFFECTS_INPUT = 1 << 2;
    }
}

/// A child widget of a panel, as declared by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelChild {
    /// Opens a popup menu; its arrow follows the panel edge.
    MenuButton { id: u64, arrow_side: Side },
    Other { id: u64 },
}

/// Usable-area insets handed to the desktop icon layer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

impl Margins {
    pub fn on(side: Side, size: i32) -> Margins {
        let mut m = Margins::default();
        match side {
            Side::Top => m.top = size,
            Side::Bottom => m.bottom = size,
            Side::Left => m.left = size,
            Side::Right => m.right = size,
        }
        m
    }
}

/// Named interception points in collaborator subsystems. While installed,
/// the host routes the corresponding behavior through the panel engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverridePoint {
    HotCorners,
    OverviewWorkspacesViews,
    PopupPreferredHeight,
    BannerOffset,
    TopPanelBoxUpdate,
}

/// Subsystems that are set up once per enable and survive resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Integration {
    NotificationsMonitor,
    DesktopIconsUsableArea,
}

pub trait ShellChrome {
    fn create_panel_box(&self, panel: PanelId, monitor: &Monitor, frame: Rect, flags: ChromeFlags);

    fn destroy_panel_box(&self, panel: PanelId);

    /// Moves the host's own top panel box into `panel`.
    fn adopt_native_box(&self, panel: PanelId, frame: Rect, flags: ChromeFlags);

    /// Reparents the native box to its original container and places it.
    fn release_native_box(&self, frame: Rect);

    /// Whether the native box still sits in its original container.
    fn native_box_parented(&self) -> bool;

    fn set_native_box_frame(&self, frame: Rect);

    fn set_panel_flags(&self, panel: PanelId, flags: ChromeFlags);

    fn set_panel_visible(&self, panel: PanelId, visible: bool);

    /// Shows or hides the taskbar part of a panel, leaving the preview pane.
    fn set_taskbar_visible(&self, panel: PanelId, visible: bool);

    fn panel_children(&self, panel: PanelId) -> Vec<PanelChild>;

    fn set_menu_arrow_side(&self, child: u64, side: Side);

    fn set_usable_area_margins(&self, monitor: usize, margins: Margins);

    fn clear_usable_area_margins(&self);

    fn overview_primary(&self) -> Option<usize>;

    fn set_overview_primary(&self, index: usize);

    fn update_overview_workarea(&self);

    /// Whether another panel extension that owns hot corners is running.
    fn conflicting_panel_active(&self) -> bool { false }

    fn install_override(&self, point: OverridePoint);

    fn restore_override(&self, point: OverridePoint);

    fn set_hot_corners(&self, corners: &[HotCorner]);

    fn reset_global_styles(&self, border_radius: i64);

    fn bind_key(&self, action: &str, accelerator: &str) -> bool;

    fn unbind_key(&self, action: &str);

    fn attach_integration(&self, integration: Integration);

    fn detach_integration(&self, integration: Integration);

    fn preview_renderer(&self, panel: PanelId) -> Option<Rc<dyn PreviewRenderer>>;
}

pub trait AppSystem {
    fn app_for_window(&self, window: WindowId) -> Option<AppId>;

    fn app_exists(&self, app: &str) -> bool;

    fn activate_app(&self, app: &str);

    fn favorites(&self) -> Vec<AppId>;
}
