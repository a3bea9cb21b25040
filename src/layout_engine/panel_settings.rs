use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::{debug, warn};

use super::graph::{Anchor, Side};
use crate::common::collections::HashMap;
use crate::sys::screen::Monitor;
use crate::sys::settings::{SettingKey, SettingValue, SettingsStore};

pub const DEFAULT_PANEL_SIZE: u32 = 48;
pub const MIN_PANEL_SIZE: u32 = 16;
pub const MAX_PANEL_SIZE: u32 = 128;
pub const MIN_LENGTH_PERCENT: u32 = 10;
pub const DEFAULT_PREVIEW_WIDTH: u32 = 180;
pub const MAX_PREVIEW_WIDTH: u32 = 1024;
pub const MAX_PANEL_MARGIN: u32 = 64;

/// Which parts of a panel are shown.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DisplayMode {
    Panel,
    Preview,
    #[default]
    Both,
}

impl DisplayMode {
    pub fn shows_preview(self) -> bool { matches!(self, DisplayMode::Preview | DisplayMode::Both) }

    pub fn shows_taskbar(self) -> bool { matches!(self, DisplayMode::Panel | DisplayMode::Both) }
}

const WILDCARD: &str = "*";

/// A per-monitor setting keyed by connector name.
#[derive(Debug, Clone, PartialEq)]
pub struct PerMonitor<T> {
    by_connector: HashMap<String, T>,
    fallback: Option<T>,
}

impl<T> Default for PerMonitor<T> {
    fn default() -> Self {
        Self {
            by_connector: HashMap::default(),
            fallback: None,
        }
    }
}

impl<T: Clone> PerMonitor<T> {
    /// Parses a JSON object. Entries whose value `f` rejects are dropped.
    pub fn parse(key: SettingKey, text: &str, f: impl Fn(&Value) -> Option<T>) -> Self {
        let mut out = PerMonitor::default();
        if text.trim().is_empty() {
            return out;
        }
        let map: serde_json::Map<String, Value> = match serde_json::from_str(text) {
            Ok(map) => map,
            Err(err) => {
                warn!(%key, %err, "malformed per-monitor setting");
                return out;
            }
        };
        for (connector, value) in map {
            let Some(parsed) = f(&value) else {
                warn!(%key, %connector, %value, "ignoring invalid value");
                continue;
            };
            if connector == WILDCARD {
                out.fallback = Some(parsed);
            } else {
                out.by_connector.insert(connector, parsed);
            }
        }
        out
    }

    pub fn get(&self, monitor: &Monitor) -> Option<T> {
        self.by_connector.get(monitor.id()).or(self.fallback.as_ref()).cloned()
    }
}

fn parse_enum<T: std::str::FromStr>(v: &Value) -> Option<T> { v.as_str()?.parse().ok() }

fn parse_u32(v: &Value) -> Option<u32> { v.as_u64().and_then(|n| u32::try_from(n).ok()) }

/// Parsed view of the panel-related settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSettings {
    pub primary_monitor: Option<String>,
    pub multi_monitors: bool,
    pub isolate_monitors: bool,
    pub keep_top_panel: bool,
    pub intellihide: bool,
    pub display_mode: DisplayMode,
    pub preview_width: u32,
    pub positions: PerMonitor<Side>,
    pub lengths: PerMonitor<u32>,
    pub anchors: PerMonitor<Anchor>,
    pub sizes: PerMonitor<u32>,
    pub margins: PerMonitor<u32>,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            primary_monitor: None,
            multi_monitors: true,
            isolate_monitors: false,
            keep_top_panel: false,
            intellihide: false,
            display_mode: DisplayMode::Both,
            preview_width: DEFAULT_PREVIEW_WIDTH,
            positions: PerMonitor::default(),
            lengths: PerMonitor::default(),
            anchors: PerMonitor::default(),
            sizes: PerMonitor::default(),
            margins: PerMonitor::default(),
        }
    }
}

impl PanelSettings {
    pub fn load(store: &dyn SettingsStore) -> PanelSettings {
        let text = |key| store.get_string(key).unwrap_or_default();
        let defaults = PanelSettings::default();
        let bool_or = |key, default: bool| match store.get(key) {
            Some(SettingValue::Bool(b)) => b,
            _ => default,
        };
        PanelSettings {
            primary_monitor: store.get_string(SettingKey::PrimaryMonitor).filter(|s| !s.is_empty()),
            multi_monitors: bool_or(SettingKey::MultiMonitors, defaults.multi_monitors),
            isolate_monitors: store.get_bool(SettingKey::IsolateMonitors),
            keep_top_panel: store.get_bool(SettingKey::KeepTopPanel),
            intellihide: store.get_bool(SettingKey::Intellihide),
            display_mode: store
                .get_string(SettingKey::DisplayMode)
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            preview_width: store
                .get_int(SettingKey::PreviewWidth)
                .map(|w| w.clamp(0, MAX_PREVIEW_WIDTH as i64) as u32)
                .unwrap_or(DEFAULT_PREVIEW_WIDTH),
            positions: PerMonitor::parse(
                SettingKey::PanelPositions,
                &text(SettingKey::PanelPositions),
                parse_enum,
            ),
            lengths: PerMonitor::parse(
                SettingKey::PanelLengths,
                &text(SettingKey::PanelLengths),
                parse_u32,
            ),
            anchors: PerMonitor::parse(
                SettingKey::PanelAnchors,
                &text(SettingKey::PanelAnchors),
                parse_enum,
            ),
            sizes: PerMonitor::parse(
                SettingKey::PanelSizes,
                &text(SettingKey::PanelSizes),
                parse_u32,
            ),
            margins: PerMonitor::parse(
                SettingKey::PanelMargins,
                &text(SettingKey::PanelMargins),
                parse_u32,
            ),
        }
    }

    pub fn position(&self, monitor: &Monitor) -> Side {
        self.positions.get(monitor).unwrap_or_default()
    }

    pub fn anchor(&self, monitor: &Monitor) -> Anchor {
        self.anchors.get(monitor).unwrap_or_default()
    }

    /// Panel length as a percentage of the edge.
    pub fn length_percent(&self, monitor: &Monitor) -> u32 {
        self.lengths.get(monitor).unwrap_or(100).clamp(MIN_LENGTH_PERCENT, 100)
    }

    pub fn size(&self, monitor: &Monitor) -> u32 {
        self.sizes.get(monitor).unwrap_or(DEFAULT_PANEL_SIZE).clamp(MIN_PANEL_SIZE, MAX_PANEL_SIZE)
    }

    pub fn margin(&self, monitor: &Monitor) -> u32 {
        self.margins.get(monitor).unwrap_or(0).min(MAX_PANEL_MARGIN)
    }

    /// Thickness of the preview pane, zero when it is hidden.
    pub fn preview_thickness(&self) -> i32 {
        if self.display_mode.shows_preview() {
            self.preview_width.min(MAX_PREVIEW_WIDTH) as i32
        } else {
            0
        }
    }
}

/// Caches the parsed settings until a relevant key changes.
#[derive(Debug, Default)]
pub struct PanelSettingsCache {
    cached: Option<Rc<PanelSettings>>,
}

impl PanelSettingsCache {
    pub fn new() -> Self { Self::default() }

    pub fn get(&mut self, store: &dyn SettingsStore) -> Rc<PanelSettings> {
        if let Some(cached) = &self.cached {
            return cached.clone();
        }
        let loaded = Rc::new(PanelSettings::load(store));
        debug!(?loaded.display_mode, loaded.multi_monitors, "panel settings loaded");
        self.cached = Some(loaded.clone());
        loaded
    }

    pub fn clear(&mut self) { self.cached = None; }

    pub fn is_cached(&self) -> bool { self.cached.is_some() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::geometry::Rect;
    use crate::sys::settings::MemorySettings;

    fn monitor(connector: &str) -> Monitor {
        Monitor::new(0, connector, Rect::new(0, 0, 1920, 1080))
    }

    #[test]
    fn per_monitor_prefers_connector_over_wildcard() {
        let map = PerMonitor::parse(
            SettingKey::PanelPositions,
            r#"{"*": "BOTTOM", "HDMI-1": "left"}"#,
            parse_enum::<Side>,
        );
        assert_eq!(map.get(&monitor("HDMI-1")), Some(Side::Left));
        assert_eq!(map.get(&monitor("DP-1")), Some(Side::Bottom));
    }

    #[test]
    fn malformed_json_yields_defaults() {
        let map = PerMonitor::parse(SettingKey::PanelLengths, "{not json", parse_u32);
        assert_eq!(map.get(&monitor("DP-1")), None);
        let text = r#"{"DP-1": "long", "*": 70}"#;
        let map = PerMonitor::parse(SettingKey::PanelLengths, text, parse_u32);
        assert_eq!(map.get(&monitor("DP-1")), Some(70));
    }

    #[test]
    fn load_applies_defaults_and_clamps() {
        let store = MemorySettings::new();
        store
            .set(SettingKey::PanelLengths, SettingValue::Str(r#"{"*": 5}"#.into()))
            .unwrap();
        store
            .set(SettingKey::PanelSizes, SettingValue::Str(r#"{"*": 400}"#.into()))
            .unwrap();
        store.set(SettingKey::PrimaryMonitor, SettingValue::Str(String::new())).unwrap();
        let settings = PanelSettings::load(&store);
        let m = monitor("DP-1");
        assert_eq!(settings.position(&m), Side::Right);
        assert_eq!(settings.anchor(&m), Anchor::Middle);
        assert_eq!(settings.length_percent(&m), MIN_LENGTH_PERCENT);
        assert_eq!(settings.size(&m), MAX_PANEL_SIZE);
        assert_eq!(settings.primary_monitor, None);
        assert!(settings.multi_monitors);
        assert_eq!(settings.display_mode, DisplayMode::Both);
    }

    #[test]
    fn margin_and_preview_width_are_bounded() {
        let store = MemorySettings::new();
        store
            .set(SettingKey::PanelMargins, SettingValue::Str(r#"{"*": 2000000000}"#.into()))
            .unwrap();
        store.set(SettingKey::PreviewWidth, SettingValue::Int(3_000_000_000)).unwrap();
        let settings = PanelSettings::load(&store);
        let m = monitor("DP-1");
        assert_eq!(settings.margin(&m), MAX_PANEL_MARGIN);
        assert_eq!(settings.preview_width, MAX_PREVIEW_WIDTH);

        store.set(SettingKey::PreviewWidth, SettingValue::Int(-5)).unwrap();
        assert_eq!(PanelSettings::load(&store).preview_width, 0);

        let direct = PanelSettings { preview_width: u32::MAX, ..PanelSettings::default() };
        assert_eq!(direct.preview_thickness(), MAX_PREVIEW_WIDTH as i32);
    }

    #[test]
    fn cache_holds_until_cleared() {
        let store = MemorySettings::new();
        let mut cache = PanelSettingsCache::new();
        assert!(!cache.get(&store).isolate_monitors);
        store.set(SettingKey::IsolateMonitors, SettingValue::Bool(true)).unwrap();
        assert!(!cache.get(&store).isolate_monitors);
        cache.clear();
        assert!(cache.get(&store).isolate_monitors);
    }
}
