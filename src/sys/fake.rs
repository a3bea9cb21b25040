//! Recording stand-ins for the host collaborators, used by engine tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::Host;
use super::geometry::{Point, Rect, Size};
use super::screen::{DisplayTopology, Monitor};
use super::settings::MemorySettings;
use super::shell::{
    AppSystem, ChromeFlags, Integration, Margins, OverridePoint, PanelChild, ShellChrome,
};
use super::workspace::{AppId, WindowId, WindowInfo, WorkspaceCollection, WorkspaceId};
use crate::common::collections::{HashMap, HashSet};
use crate::layout_engine::graph::Side;
use crate::layout_engine::hot_corner::HotCorner;
use crate::layout_engine::preview_size::ThumbnailGeometry;
use crate::model::icon_order::IconStrip;
use crate::model::panel::PanelId;
use crate::model::preview::ItemId;
use crate::model::shortcuts::Slots;
use crate::ui::preview::{PreviewLayout, PreviewRenderer};

pub fn monitor(index: usize, x: i32) -> Monitor {
    let m = Monitor::new(index, format!("DP-{index}"), Rect::new(x, 0, 1920, 1080));
    if index == 0 { m.primary() } else { m }
}

#[derive(Default)]
pub struct FakeTopology {
    pub monitors: RefCell<Vec<Monitor>>,
    pub primary: Cell<Option<usize>>,
    pub work_areas: RefCell<HashMap<usize, Rect>>,
    pub rtl: Cell<bool>,
    pub threshold: Cell<Option<u32>>,
}

impl FakeTopology {
    /// `n` side-by-side 1920x1080 monitors, the first one primary.
    pub fn row(n: usize) -> FakeTopology {
        let topo = FakeTopology::default();
        topo.set_monitors((0..n).map(|i| monitor(i, i as i32 * 1920)).collect());
        topo
    }

    pub fn set_monitors(&self, monitors: Vec<Monitor>) {
        self.primary.set(monitors.iter().find(|m| m.is_primary).map(|m| m.index));
        *self.monitors.borrow_mut() = monitors;
    }

    pub fn set_work_area(&self, index: usize, rect: Rect) {
        self.work_areas.borrow_mut().insert(index, rect);
    }
}

impl DisplayTopology for FakeTopology {
    fn monitors(&self) -> Vec<Monitor> { self.monitors.borrow().clone() }

    fn primary_index(&self) -> Option<usize> { self.primary.get() }

    fn work_area(&self, index: usize) -> Option<Rect> {
        let wa = self.work_areas.borrow().get(&index).copied();
        wa.or_else(|| self.monitors.borrow().get(index).map(|m| m.frame))
    }

    fn is_rtl(&self) -> bool { self.rtl.get() }

    fn drag_threshold(&self) -> Option<u32> { self.threshold.get() }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceCall {
    Move { window: WindowId, monitor: usize, workspace: usize },
    ActivateWorkspace(usize),
    ActivateWindow(WindowId),
}

#[derive(Default)]
pub struct FakeWorkspaces {
    pub ids: RefCell<Vec<WorkspaceId>>,
    /// Overrides the reported count when set.
    pub raw_count: Cell<Option<i64>>,
    pub active: Cell<Option<usize>>,
    pub names: RefCell<HashMap<usize, String>>,
    pub windows: RefCell<HashMap<WorkspaceId, Vec<WindowInfo>>>,
    pub focus: Cell<Option<WindowId>>,
    pub calls: RefCell<Vec<WorkspaceCall>>,
    next: Cell<u64>,
}

impl FakeWorkspaces {
    pub fn with(n: usize) -> FakeWorkspaces {
        let ws = FakeWorkspaces::default();
        for _ in 0..n {
            ws.push();
        }
        ws.active.set(Some(0));
        ws
    }

    pub fn push(&self) -> WorkspaceId {
        let id = WorkspaceId::new(self.next.get() + 1);
        self.next.set(id.get());
        self.ids.borrow_mut().push(id);
        id
    }

    pub fn pop(&self) -> Option<WorkspaceId> { self.ids.borrow_mut().pop() }

    /// Replaces the workspace at `index` with a fresh one.
    pub fn replace(&self, index: usize) -> WorkspaceId {
        let id = WorkspaceId::new(self.next.get() + 1);
        self.next.set(id.get());
        self.ids.borrow_mut()[index] = id;
        id
    }

    pub fn id(&self, index: usize) -> WorkspaceId { self.ids.borrow()[index] }

    pub fn add_window(
        &self,
        index: usize,
        id: u64,
        user_time: u64,
        monitor: Option<usize>,
    ) -> WindowId {
        let window = WindowId::new(id);
        let ws = self.id(index);
        self.windows.borrow_mut().entry(ws).or_default().push(WindowInfo {
            id: window,
            user_time,
            monitor,
            skip_taskbar: false,
        });
        window
    }

    pub fn take_calls(&self) -> Vec<WorkspaceCall> { self.calls.take() }
}

impl WorkspaceCollection for FakeWorkspaces {
    fn count(&self) -> i64 { self.raw_count.get().unwrap_or(self.ids.borrow().len() as i64) }

    fn get(&self, index: usize) -> Option<WorkspaceId> { self.ids.borrow().get(index).copied() }

    fn active_index(&self) -> Option<usize> { self.active.get() }

    fn name(&self, index: usize) -> Option<String> { self.names.borrow().get(&index).cloned() }

    fn windows(&self, workspace: WorkspaceId) -> Vec<WindowInfo> {
        self.windows.borrow().get(&workspace).cloned().unwrap_or_default()
    }

    fn focus_window(&self) -> Option<WindowId> { self.focus.get() }

    fn move_window(&self, window: WindowId, monitor: usize, workspace: usize) {
        self.calls.borrow_mut().push(WorkspaceCall::Move { window, monitor, workspace });
    }

    fn activate_workspace(&self, index: usize) {
        self.calls.borrow_mut().push(WorkspaceCall::ActivateWorkspace(index));
    }

    fn activate_window(&self, window: WindowId) {
        self.calls.borrow_mut().push(WorkspaceCall::ActivateWindow(window));
    }
}

#[derive(Default)]
pub struct FakeApps {
    pub by_window: RefCell<HashMap<WindowId, AppId>>,
    pub installed: RefCell<HashSet<AppId>>,
    pub favorites: RefCell<Vec<AppId>>,
    pub activated: RefCell<Vec<AppId>>,
    pub lookups: Cell<usize>,
}

impl FakeApps {
    pub fn assign(&self, window: WindowId, app: &str) {
        self.by_window.borrow_mut().insert(window, app.to_string());
        self.installed.borrow_mut().insert(app.to_string());
    }
}

impl AppSystem for FakeApps {
    fn app_for_window(&self, window: WindowId) -> Option<AppId> {
        self.lookups.set(self.lookups.get() + 1);
        self.by_window.borrow().get(&window).cloned()
    }

    fn app_exists(&self, app: &str) -> bool { self.installed.borrow().contains(app) }

    fn activate_app(&self, app: &str) { self.activated.borrow_mut().push(app.to_string()); }

    fn favorites(&self) -> Vec<AppId> { self.favorites.borrow().clone() }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChromeCall {
    CreateBox { panel: PanelId, monitor: usize, frame: Rect, flags: ChromeFlags },
    DestroyBox(PanelId),
    AdoptNative { panel: PanelId, frame: Rect },
    ReleaseNative(Rect),
    NativeFrame(Rect),
    Flags(PanelId, ChromeFlags),
    Visible(PanelId, bool),
    Taskbar(PanelId, bool),
    Arrow(u64, Side),
    UsableArea(usize, Margins),
    ClearUsableArea,
    OverviewPrimary(usize),
    OverviewWorkarea,
    Install(OverridePoint),
    Restore(OverridePoint),
    HotCorners(Vec<HotCorner>),
    ResetStyles(i64),
    Bind(String, String),
    Unbind(String),
    Attach(Integration),
    Detach(Integration),
}

pub struct FakeChrome {
    pub calls: RefCell<Vec<ChromeCall>>,
    pub native_parented: Cell<bool>,
    pub overview_primary: Cell<Option<usize>>,
    pub conflicting: Cell<bool>,
    pub accept_bindings: Cell<bool>,
    pub children: RefCell<Vec<PanelChild>>,
    pub renderers: RefCell<HashMap<PanelId, Rc<FakeRenderer>>>,
}

impl Default for FakeChrome {
    fn default() -> Self {
        Self {
            calls: RefCell::default(),
            native_parented: Cell::new(true),
            overview_primary: Cell::new(None),
            conflicting: Cell::new(false),
            accept_bindings: Cell::new(true),
            children: RefCell::default(),
            renderers: RefCell::default(),
        }
    }
}

impl FakeChrome {
    fn record(&self, call: ChromeCall) { self.calls.borrow_mut().push(call); }

    pub fn take_calls(&self) -> Vec<ChromeCall> { self.calls.take() }

    pub fn count(&self, pred: impl Fn(&ChromeCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn renderer(&self, panel: PanelId) -> Option<Rc<FakeRenderer>> {
        self.renderers.borrow().get(&panel).cloned()
    }
}

impl ShellChrome for FakeChrome {
    fn create_panel_box(&self, panel: PanelId, monitor: &Monitor, frame: Rect, flags: ChromeFlags) {
        self.record(ChromeCall::CreateBox { panel, monitor: monitor.index, frame, flags });
    }

    fn destroy_panel_box(&self, panel: PanelId) {
        self.renderers.borrow_mut().remove(&panel);
        self.record(ChromeCall::DestroyBox(panel));
    }

    fn adopt_native_box(&self, panel: PanelId, frame: Rect, _flags: ChromeFlags) {
        self.record(ChromeCall::AdoptNative { panel, frame });
    }

    fn release_native_box(&self, frame: Rect) { self.record(ChromeCall::ReleaseNative(frame)); }

    fn native_box_parented(&self) -> bool { self.native_parented.get() }

    fn set_native_box_frame(&self, frame: Rect) { self.record(ChromeCall::NativeFrame(frame)); }

    fn set_panel_flags(&self, panel: PanelId, flags: ChromeFlags) {
        self.record(ChromeCall::Flags(panel, flags));
    }

    fn set_panel_visible(&self, panel: PanelId, visible: bool) {
        self.record(ChromeCall::Visible(panel, visible));
    }

    fn set_taskbar_visible(&self, panel: PanelId, visible: bool) {
        self.record(ChromeCall::Taskbar(panel, visible));
    }

    fn panel_children(&self, _panel: PanelId) -> Vec<PanelChild> { self.children.borrow().clone() }

    fn set_menu_arrow_side(&self, child: u64, side: Side) {
        self.record(ChromeCall::Arrow(child, side));
    }

    fn set_usable_area_margins(&self, monitor: usize, margins: Margins) {
        self.record(ChromeCall::UsableArea(monitor, margins));
    }

    fn clear_usable_area_margins(&self) { self.record(ChromeCall::ClearUsableArea); }

    fn overview_primary(&self) -> Option<usize> { self.overview_primary.get() }

    fn set_overview_primary(&self, index: usize) {
        self.overview_primary.set(Some(index));
        self.record(ChromeCall::OverviewPrimary(index));
    }

    fn update_overview_workarea(&self) { self.record(ChromeCall::OverviewWorkarea); }

    fn conflicting_panel_active(&self) -> bool { self.conflicting.get() }

    fn install_override(&self, point: OverridePoint) { self.record(ChromeCall::Install(point)); }

    fn restore_override(&self, point: OverridePoint) { self.record(ChromeCall::Restore(point)); }

    fn set_hot_corners(&self, corners: &[HotCorner]) {
        self.record(ChromeCall::HotCorners(corners.to_vec()));
    }

    fn reset_global_styles(&self, border_radius: i64) {
        self.record(ChromeCall::ResetStyles(border_radius));
    }

    fn bind_key(&self, action: &str, accelerator: &str) -> bool {
        self.record(ChromeCall::Bind(action.to_string(), accelerator.to_string()));
        self.accept_bindings.get()
    }

    fn unbind_key(&self, action: &str) { self.record(ChromeCall::Unbind(action.to_string())); }

    fn attach_integration(&self, integration: Integration) {
        self.record(ChromeCall::Attach(integration));
    }

    fn detach_integration(&self, integration: Integration) {
        self.record(ChromeCall::Detach(integration));
    }

    fn preview_renderer(&self, panel: PanelId) -> Option<Rc<dyn PreviewRenderer>> {
        let renderer = self.renderers.borrow_mut().entry(panel).or_default().clone();
        Some(renderer as Rc<dyn PreviewRenderer>)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FakeItem {
    pub index: usize,
    pub active: bool,
    pub label: String,
    pub geometry: Option<(Size, ThumbnailGeometry)>,
    pub icons: Option<IconStrip>,
    pub focused: HashSet<AppId>,
}

/// Items are laid out in a column, 110 px apart.
#[derive(Default)]
pub struct FakeRenderer {
    pub items: RefCell<HashMap<ItemId, FakeItem>>,
    pub created: Cell<usize>,
    pub destroyed: Cell<usize>,
    pub geometry_pushes: Cell<usize>,
    pub icon_pushes: Cell<usize>,
    pub layouts: RefCell<Vec<PreviewLayout>>,
    pub shortcuts: RefCell<Option<Slots>>,
    pub allocation: Cell<Option<Size>>,
    pub ghost: RefCell<Option<(AppId, Point)>>,
    pub drop_target: Cell<Option<ItemId>>,
    pub chooser: RefCell<Option<(usize, Option<String>, Vec<AppId>)>>,
}

impl FakeRenderer {
    pub fn item(&self, id: ItemId) -> Option<FakeItem> { self.items.borrow().get(&id).cloned() }

    pub fn bounds_of(index: usize) -> Rect { Rect::new(0, index as i32 * 110, 180, 100) }

    fn with_item(&self, id: ItemId, f: impl FnOnce(&mut FakeItem)) {
        if let Some(item) = self.items.borrow_mut().get_mut(&id) {
            f(item);
        }
    }
}

impl PreviewRenderer for FakeRenderer {
    fn create_item(&self, item: ItemId, index: usize) {
        self.created.set(self.created.get() + 1);
        self.items.borrow_mut().insert(item, FakeItem { index, ..FakeItem::default() });
    }

    fn destroy_item(&self, item: ItemId) {
        self.destroyed.set(self.destroyed.get() + 1);
        self.items.borrow_mut().remove(&item);
    }

    fn set_item_active(&self, item: ItemId, active: bool) {
        self.with_item(item, |i| i.active = active);
    }

    fn set_item_label(&self, item: ItemId, text: &str) {
        self.with_item(item, |i| i.label = text.to_string());
    }

    fn set_item_geometry(&self, item: ItemId, size: Size, content: ThumbnailGeometry) {
        self.geometry_pushes.set(self.geometry_pushes.get() + 1);
        self.with_item(item, |i| i.geometry = Some((size, content)));
    }

    fn set_item_icons(&self, item: ItemId, icons: &IconStrip) {
        self.icon_pushes.set(self.icon_pushes.get() + 1);
        self.with_item(item, |i| i.icons = Some(icons.clone()));
    }

    fn set_icon_focused(&self, item: ItemId, app: &str, focused: bool) {
        self.with_item(item, |i| {
            if focused {
                i.focused.insert(app.to_string());
            } else {
                i.focused.remove(app);
            }
        });
    }

    fn set_layout(&self, layout: &PreviewLayout) { self.layouts.borrow_mut().push(*layout); }

    fn set_shortcuts(&self, slots: &Slots) { *self.shortcuts.borrow_mut() = Some(slots.clone()); }

    fn allocation(&self) -> Option<Size> { self.allocation.get() }

    fn item_bounds(&self, item: ItemId) -> Option<Rect> {
        self.items.borrow().get(&item).map(|i| Self::bounds_of(i.index))
    }

    fn show_drag_ghost(&self, app: &str, at: Point) {
        *self.ghost.borrow_mut() = Some((app.to_string(), at));
    }

    fn hide_drag_ghost(&self) { *self.ghost.borrow_mut() = None; }

    fn set_drop_target(&self, item: Option<ItemId>) { self.drop_target.set(item); }

    fn open_shortcut_chooser(&self, slot: usize, current: Option<&str>, candidates: &[AppId]) {
        *self.chooser.borrow_mut() =
            Some((slot, current.map(str::to_string), candidates.to_vec()));
    }
}

/// A full set of collaborators with typed handles kept for assertions.
pub struct FakeHost {
    pub settings: Rc<MemorySettings>,
    pub topology: Rc<FakeTopology>,
    pub workspaces: Rc<FakeWorkspaces>,
    pub apps: Rc<FakeApps>,
    pub chrome: Rc<FakeChrome>,
}

impl FakeHost {
    pub fn new(monitors: usize, workspaces: usize) -> FakeHost {
        FakeHost {
            settings: Rc::new(MemorySettings::new()),
            topology: Rc::new(FakeTopology::row(monitors)),
            workspaces: Rc::new(FakeWorkspaces::with(workspaces)),
            apps: Rc::new(FakeApps::default()),
            chrome: Rc::new(FakeChrome::default()),
        }
    }

    pub fn host(&self) -> Host {
        Host {
            settings: self.settings.clone(),
            topology: self.topology.clone(),
            workspaces: self.workspaces.clone(),
            apps: self.apps.clone(),
            chrome: self.chrome.clone(),
        }
    }
}
