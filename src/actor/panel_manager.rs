//! Owns the live panel set: creates one panel per resolved monitor, wires
//! them into the host shell and tears everything down again.

pub mod overrides;

use std::rc::Rc;

use slotmap::{SecondaryMap, SlotMap};
use tracing::{debug, info, instrument, trace, warn};

use self::overrides::OverrideRegistry;
use super::broadcast::{BroadcastEvent, BroadcastSender};
use super::shell::{self, Event};
use super::workspace_preview::WorkspacePreview;
use crate::common::config::is_valid_accelerator;
use crate::layout_engine::graph::Side;
use crate::layout_engine::hot_corner::{
    HotCorner, HotCornerPolicy, PanelEdge, STOCK_PANEL_SIZE, hot_corners,
};
use crate::layout_engine::panel_settings::{PanelSettings, PanelSettingsCache};
use crate::layout_engine::resolver::{ResolvedPanel, resolve};
use crate::model::app_cache::WindowAppCache;
use crate::model::panel::{Panel, PanelId};
use crate::model::server::PanelData;
use crate::sys::Host;
use crate::sys::geometry::Rect;
use crate::sys::settings::{HandlerId, SettingKey, SettingValue};
use crate::sys::shell::{Integration, Margins, OverridePoint, PanelChild};

pub const TOGGLE_INTELLIHIDE_ACTION: &str = "intellihide-toggle";
/// Gap kept between a clamped popup and the monitor edge.
pub const POPUP_EDGE_MARGIN: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Disabled,
    Enabling,
    Enabled,
    Disabling,
}

/// Where the host's native top panel box goes when it is handed back.
fn native_box_frame(monitor: Rect) -> Rect {
    Rect::new(monitor.x, monitor.y, monitor.width, STOCK_PANEL_SIZE)
}

pub struct PanelLayoutEngine {
    host: Host,
    events: shell::Sender,
    broadcast: BroadcastSender,
    state: Lifecycle,
    settings: PanelSettingsCache,
    panels: SlotMap<PanelId, Panel>,
    /// Primary panel first.
    order: Vec<PanelId>,
    previews: SecondaryMap<PanelId, WorkspacePreview>,
    overrides: OverrideRegistry,
    integrations: Vec<Integration>,
    settings_handler: Option<HandlerId>,
    keybinding: Option<String>,
    /// Arrow sides of menu buttons before they were pointed at a panel edge.
    menu_arrows: Vec<(u64, Side)>,
    saved_overview_primary: Option<usize>,
    focused_monitor: Option<usize>,
    app_cache: WindowAppCache,
}

impl PanelLayoutEngine {
    pub fn new(host: Host, events: shell::Sender, broadcast: BroadcastSender) -> Self {
        Self {
            host,
            events,
            broadcast,
            state: Lifecycle::Disabled,
            settings: PanelSettingsCache::new(),
            panels: SlotMap::with_key(),
            order: vec![],
            previews: SecondaryMap::new(),
            overrides: OverrideRegistry::new(),
            integrations: vec![],
            settings_handler: None,
            keybinding: None,
            menu_arrows: vec![],
            saved_overview_primary: None,
            focused_monitor: None,
            app_cache: WindowAppCache::new(),
        }
    }

    pub fn state(&self) -> Lifecycle { self.state }

    pub fn is_enabled(&self) -> bool { self.state == Lifecycle::Enabled }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> + '_ {
        self.order.iter().filter_map(|id| self.panels.get(*id))
    }

    pub fn panel(&self, id: PanelId) -> Option<&Panel> { self.panels.get(id) }

    pub fn primary_panel(&self) -> Option<&Panel> { self.panels().find(|p| p.is_primary) }

    pub fn panel_on(&self, monitor: usize) -> Option<&Panel> {
        self.panels().find(|p| p.monitor.index == monitor)
    }

    pub fn panel_data(&self) -> Vec<PanelData> { self.panels().map(PanelData::from).collect() }

    pub fn preview(&self, id: PanelId) -> Option<&WorkspacePreview> { self.previews.get(id) }

    pub fn preview_mut(&mut self, id: PanelId) -> Option<&mut WorkspacePreview> {
        self.previews.get_mut(id)
    }

    pub fn previews_mut(&mut self) -> impl Iterator<Item = &mut WorkspacePreview> + '_ {
        self.previews.values_mut()
    }

    pub fn focused_monitor(&self) -> Option<usize> { self.focused_monitor }

    pub fn app_cache(&self) -> &WindowAppCache { &self.app_cache }

    pub fn keybinding(&self) -> Option<&str> { self.keybinding.as_deref() }

    fn current_settings(&mut self) -> Rc<PanelSettings> { self.settings.get(&*self.host.settings) }

    #[instrument(name = "panel_manager::enable", skip(self))]
    pub fn enable(&mut self, is_reset: bool) {
        if self.state != Lifecycle::Disabled {
            debug!(state = ?self.state, "enable ignored");
            return;
        }
        self.state = Lifecycle::Enabling;
        let chrome = self.host.chrome.clone();
        if !is_reset {
            self.settings.clear();
            let integrations =
                [Integration::NotificationsMonitor, Integration::DesktopIconsUsableArea];
            for integration in integrations {
                chrome.attach_integration(integration);
                self.integrations.push(integration);
            }
        }

        let settings = self.current_settings();
        let topology = self.host.topology.snapshot();
        for resolved in resolve(&settings, &topology) {
            self.create_panel(resolved, &settings);
        }
        if let Some(primary) = self.primary_panel().map(|p| p.monitor.index) {
            self.saved_overview_primary = chrome.overview_primary();
            self.set_focused_monitor(primary);
        }
        self.apply_usable_area_margins();

        if chrome.conflicting_panel_active() {
            info!("another panel owns hot corners and overview views; leaving them alone");
        } else {
            self.overrides.install(&*chrome, OverridePoint::HotCorners);
            self.overrides.install(&*chrome, OverridePoint::OverviewWorkspacesViews);
        }
        self.overrides.install(&*chrome, OverridePoint::PopupPreferredHeight);
        self.overrides.set(&*chrome, OverridePoint::TopPanelBoxUpdate, settings.keep_top_panel);
        self.update_banner_override(&settings);
        self.update_hot_corners();
        self.update_keybinding();

        let tx = self.events.clone();
        self.settings_handler = Some(
            self.host.settings.connect(Box::new(move |key| tx.send(Event::SettingChanged(key)))),
        );

        self.state = Lifecycle::Enabled;
        info!(panels = self.order.len(), is_reset, "panels enabled");
        self.broadcast.send(BroadcastEvent::PanelsCreated { panels: self.panel_data() });
    }

    fn create_panel(&mut self, resolved: ResolvedPanel, settings: &PanelSettings) {
        let standalone = !resolved.is_primary || settings.keep_top_panel;
        let id = self.panels.insert_with_key(|id| Panel::new(id, resolved, standalone));
        self.order.push(id);
        let chrome = self.host.chrome.clone();
        let Some(panel) = self.panels.get_mut(id) else { return };

        let flags = panel.chrome_flags(settings.intellihide);
        if standalone {
            chrome.create_panel_box(id, &panel.monitor, panel.geometry.frame, flags);
        } else {
            chrome.adopt_native_box(id, panel.geometry.frame, flags);
        }
        chrome.set_taskbar_visible(id, settings.display_mode.shows_taskbar());

        panel.children = chrome.panel_children(id);
        for child in &panel.children {
            if let PanelChild::MenuButton { id: child, arrow_side } = child {
                self.menu_arrows.push((*child, *arrow_side));
                chrome.set_menu_arrow_side(*child, panel.geometry.position);
            }
        }
        trace!(
            monitor = panel.monitor.index,
            standalone,
            frame = ?panel.geometry.frame,
            "panel created"
        );

        if !settings.display_mode.shows_preview() {
            return;
        }
        let Some(renderer) = chrome.preview_renderer(id) else {
            debug!(?id, "host offers no preview renderer");
            return;
        };
        let mut preview = WorkspacePreview::new(
            self.host.clone(),
            renderer,
            panel,
            settings.preview_thickness(),
            self.app_cache.clone(),
        );
        preview.rebuild_all();
        self.previews.insert(id, preview);
    }

    /// Tears down whatever exists. Safe on a partially enabled engine.
    #[instrument(name = "panel_manager::disable", skip(self))]
    pub fn disable(&mut self, is_reset: bool) {
        if self.state == Lifecycle::Disabled {
            return;
        }
        self.state = Lifecycle::Disabling;
        let chrome = self.host.chrome.clone();

        if let Some(id) = self.settings_handler.take() {
            self.host.settings.disconnect(id);
        }
        if self.keybinding.take().is_some() {
            chrome.unbind_key(TOGGLE_INTELLIHIDE_ACTION);
        }
        self.overrides.restore_all(&*chrome);
        for (child, side) in self.menu_arrows.drain(..).rev() {
            chrome.set_menu_arrow_side(child, side);
        }
        for (_, mut preview) in self.previews.drain() {
            preview.destroy();
        }
        for id in self.order.drain(..).rev() {
            let Some(panel) = self.panels.remove(id) else { continue };
            if panel.is_standalone {
                chrome.destroy_panel_box(id);
            } else {
                chrome.release_native_box(native_box_frame(panel.monitor.frame));
            }
        }
        self.panels.clear();
        chrome.clear_usable_area_margins();
        if let Some(index) = self.saved_overview_primary.take()
            && chrome.overview_primary() != Some(index)
        {
            chrome.set_overview_primary(index);
            chrome.update_overview_workarea();
        }
        self.focused_monitor = None;
        if !is_reset {
            for integration in self.integrations.drain(..).rev() {
                chrome.detach_integration(integration);
            }
        }
        self.state = Lifecycle::Disabled;
        info!(is_reset, "panels disabled");
    }

    /// Rebuilds the panel set from the current settings and topology.
    pub fn reset(&mut self) {
        if self.state != Lifecycle::Enabled {
            debug!(state = ?self.state, "reset ignored");
            return;
        }
        self.disable(true);
        self.enable(true);
    }

    /// Makes `monitor` the overview's primary. Returns false when it
    /// already was.
    pub fn set_focused_monitor(&mut self, monitor: usize) -> bool {
        self.focused_monitor = Some(monitor);
        if self.host.chrome.overview_primary() == Some(monitor) {
            trace!(monitor, "overview already on monitor");
            return false;
        }
        self.host.chrome.set_overview_primary(monitor);
        self.host.chrome.update_overview_workarea();
        let connector = self.panel_on(monitor).map(|p| p.monitor.connector.clone());
        self.broadcast.send(BroadcastEvent::FocusedMonitorChanged { monitor, connector });
        true
    }

    fn apply_usable_area_margins(&self) {
        let chrome = &self.host.chrome;
        chrome.clear_usable_area_margins();
        for panel in self.panels().filter(|p| !p.hidden) {
            chrome.set_usable_area_margins(
                panel.monitor.index,
                Margins::on(panel.geometry.position, panel.geometry.outer_size),
            );
        }
    }

    fn banner_offset_active(&self, settings: &PanelSettings) -> bool {
        !settings.intellihide
            && self.primary_panel().is_some_and(|p| p.geometry.position == Side::Top && !p.hidden)
    }

    fn update_banner_override(&mut self, settings: &PanelSettings) {
        let on = self.banner_offset_active(settings);
        self.overrides.set(&*self.host.chrome, OverridePoint::BannerOffset, on);
    }

    /// Hot corners for the current panels. Empty while another panel
    /// extension owns them.
    pub fn hot_corners(&self) -> Vec<HotCorner> {
        if self.host.chrome.conflicting_panel_active() {
            return vec![];
        }
        let store = &self.host.settings;
        let policy = HotCornerPolicy {
            enabled: !matches!(
                store.get(SettingKey::EnableHotCorners),
                Some(SettingValue::Bool(false))
            ),
            force: store.get_bool(SettingKey::ForceHotCorner),
        };
        let edges: Vec<PanelEdge> = self
            .panels()
            .map(|p| PanelEdge {
                monitor: p.monitor.index,
                side: p.geometry.position,
                inner_size: p.geometry.inner_size,
            })
            .collect();
        hot_corners(&self.host.topology.snapshot(), &edges, policy)
    }

    pub fn update_hot_corners(&self) {
        if !self.overrides.is_installed(OverridePoint::HotCorners) {
            return;
        }
        self.host.chrome.set_hot_corners(&self.hot_corners());
    }

    /// Registers the intellihide toggle while intellihide is on and the
    /// accelerator parses.
    fn update_keybinding(&mut self) {
        let chrome = self.host.chrome.clone();
        let mut wanted = self
            .current_settings()
            .intellihide
            .then(|| self.host.settings.get_string(SettingKey::IntellihideKeyToggleText))
            .flatten()
            .filter(|text| !text.is_empty());
        if let Some(text) = &wanted
            && !is_valid_accelerator(text)
        {
            warn!(accelerator = %text, "invalid intellihide toggle accelerator");
            wanted = None;
        }
        if wanted == self.keybinding {
            return;
        }
        if self.keybinding.take().is_some() {
            chrome.unbind_key(TOGGLE_INTELLIHIDE_ACTION);
        }
        if let Some(text) = wanted {
            if chrome.bind_key(TOGGLE_INTELLIHIDE_ACTION, &text) {
                self.keybinding = Some(text);
            } else {
                warn!(accelerator = %text, "host refused the intellihide binding");
            }
        }
    }

    fn apply_intellihide(&mut self) {
        let settings = self.current_settings();
        let chrome = self.host.chrome.clone();
        for &id in &self.order {
            let Some(panel) = self.panels.get_mut(id) else { continue };
            if !settings.intellihide && panel.hidden {
                panel.hidden = false;
                chrome.set_panel_visible(id, true);
            }
            chrome.set_panel_flags(id, panel.chrome_flags(settings.intellihide));
        }
        self.apply_usable_area_margins();
        self.update_banner_override(&settings);
        self.update_keybinding();
    }

    /// Hides every panel, or reveals them all if any is hidden.
    #[instrument(name = "panel_manager::toggle_intellihide", skip(self))]
    pub fn toggle_intellihide(&mut self) {
        if !self.is_enabled() {
            return;
        }
        let settings = self.current_settings();
        let chrome = self.host.chrome.clone();
        let hide = !self.panels.values().any(|p| p.hidden);
        for &id in &self.order {
            let Some(panel) = self.panels.get_mut(id) else { continue };
            panel.hidden = hide;
            chrome.set_panel_visible(id, !hide);
            chrome.set_panel_flags(id, panel.chrome_flags(settings.intellihide));
        }
        self.apply_usable_area_margins();
        self.update_banner_override(&settings);
        self.broadcast.send(BroadcastEvent::IntellihideToggled { hidden: hide });
    }

    /// Shrinks a popup anchored in the panel on `monitor` so that it stays
    /// on screen while intellihide may slide the panel.
    pub fn popup_preferred_height(&mut self, monitor: usize, natural: i32) -> i32 {
        if !self.current_settings().intellihide {
            return natural;
        }
        let Some(panel) = self.panel_on(monitor) else { return natural };
        let excess =
            natural + panel.geometry.outer_size + POPUP_EDGE_MARGIN - panel.monitor.frame.height;
        natural - excess.max(0)
    }

    /// Target y for a message-tray banner animating to `y`.
    pub fn banner_target_y(&self, y: i32) -> i32 {
        if y != 0 || !self.overrides.is_installed(OverridePoint::BannerOffset) {
            return y;
        }
        self.primary_panel().map_or(y, |p| y + p.geometry.outer_size)
    }

    /// Fits a kept native top panel to the primary monitor's work area.
    pub fn update_top_panel_box(&self) -> bool {
        if !self.overrides.is_installed(OverridePoint::TopPanelBoxUpdate) {
            return false;
        }
        if !self.host.chrome.native_box_parented() {
            debug!("native panel box was reparented by someone else");
            return false;
        }
        let Some(primary) = self.primary_panel() else { return false };
        let Some(work_area) = self.host.topology.work_area(primary.monitor.index) else {
            return false;
        };
        let frame =
            Rect::new(work_area.x, primary.monitor.frame.y, work_area.width, STOCK_PANEL_SIZE);
        self.host.chrome.set_native_box_frame(frame);
        true
    }

    /// Runs the deferred work-area pass: the native box, then each preview.
    pub fn on_workareas_changed(&mut self) {
        self.update_top_panel_box();
        for preview in self.previews.values_mut() {
            preview.on_workarea_changed();
        }
    }

    /// Applies a setting change in place. Returns true when the change
    /// needs a full reset instead.
    #[instrument(name = "panel_manager::on_setting_changed", skip(self))]
    pub fn on_setting_changed(&mut self, key: SettingKey) -> bool {
        self.settings.clear();
        if !self.is_enabled() {
            return false;
        }
        if key.requires_reset() {
            return true;
        }
        match key {
            SettingKey::Intellihide => self.apply_intellihide(),
            SettingKey::IntellihideKeyToggleText => self.update_keybinding(),
            SettingKey::EnableHotCorners | SettingKey::ForceHotCorner => self.update_hot_corners(),
            SettingKey::GlobalBorderRadius => {
                let radius = self.host.settings.get_int(key).unwrap_or(0);
                self.host.chrome.reset_global_styles(radius);
            }
            SettingKey::PreviewSpacing
            | SettingKey::NamePosition
            | SettingKey::AppIconSize
            | SettingKey::StableIconOrder => {
                for preview in self.previews.values_mut() {
                    preview.reload_options();
                }
            }
            SettingKey::ShortcutApps => {
                for preview in self.previews.values() {
                    preview.refresh_shortcuts();
                }
            }
            _ => trace!(%key, "no reaction"),
        }
        false
    }
}
