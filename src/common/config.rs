use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use thiserror::Error;
use tracing::{debug, warn};

use crate::layout_engine::graph::{Anchor, Side};
use crate::layout_engine::panel_settings::DisplayMode;
use crate::layout_engine::preview_size::NamePosition;
use crate::sys::settings::{SettingKey, SettingValue};

pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("edgepanel")
        .join("config.toml")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid intellihide toggle key {0:?}")]
    InvalidAccelerator(String),
    #[error("could not watch config: {0}")]
    Watch(#[from] notify::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub panel: PanelConfig,
    pub preview: PreviewConfig,
    pub intellihide: IntellihideConfig,
    pub style: StyleConfig,
    pub timing: Timing,
}

/// Per-monitor maps are keyed by connector name; `"*"` applies to every
/// monitor without its own entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub primary_monitor: Option<String>,
    pub multi_monitors: bool,
    pub isolate_monitors: bool,
    pub keep_top_panel: bool,
    pub force_hot_corner: bool,
    pub enable_hot_corners: bool,
    pub positions: BTreeMap<String, Side>,
    pub lengths: BTreeMap<String, u32>,
    pub anchors: BTreeMap<String, Anchor>,
    pub sizes: BTreeMap<String, u32>,
    pub margins: BTreeMap<String, u32>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            primary_monitor: None,
            multi_monitors: true,
            isolate_monitors: false,
            keep_top_panel: false,
            force_hot_corner: false,
            enable_hot_corners: true,
            positions: BTreeMap::new(),
            lengths: BTreeMap::new(),
            anchors: BTreeMap::new(),
            sizes: BTreeMap::new(),
            margins: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub width: u32,
    pub spacing: u32,
    pub display_mode: DisplayMode,
    pub name_position: NamePosition,
    pub app_icon_size: u32,
    pub stable_icon_order: bool,
    pub shortcut_apps: Vec<String>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            width: 180,
            spacing: 4,
            display_mode: DisplayMode::Both,
            name_position: NamePosition::BottomLeft,
            app_icon_size: 48,
            stable_icon_order: true,
            shortcut_apps: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntellihideConfig {
    pub enabled: bool,
    pub toggle_key: String,
}

impl Default for IntellihideConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            toggle_key: "<Super>i".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub global_border_radius: i64,
}

/// Debounce delays for the deferred operations.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub workspace_sync: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub workarea_geometry: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub allocation_geometry: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub monitors_rebuild: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub first_window: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub app_icons: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            workspace_sync: Duration::from_millis(100),
            workarea_geometry: Duration::from_millis(80),
            allocation_geometry: Duration::from_millis(50),
            monitors_rebuild: Duration::from_millis(100),
            first_window: Duration::from_millis(150),
            app_icons: Duration::from_millis(80),
        }
    }
}

static ACCELERATOR: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^(<(Super|Control|Ctrl|Primary|Alt|Shift|Meta|Hyper)>)*[A-Za-z0-9_]+$").ok()
});

/// Accepts GTK-style accelerators such as `<Super><Shift>i`.
pub fn is_valid_accelerator(text: &str) -> bool {
    ACCELERATOR.as_ref().is_some_and(|re| re.is_match(text))
}

fn json_map<V: Serialize>(map: &BTreeMap<String, V>) -> SettingValue {
    SettingValue::Str(serde_json::to_string(map).unwrap_or_else(|_| "{}".into()))
}

impl Config {
    pub fn read(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = Config::parse(&text)?;
        debug!(?path, "loaded config");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let key = &self.intellihide.toggle_key;
        if !key.is_empty() && !is_valid_accelerator(key) {
            return Err(ConfigError::InvalidAccelerator(key.clone()));
        }
        Ok(())
    }

    /// The store representation of this config. Per-monitor maps are held
    /// as JSON strings.
    pub fn to_settings(&self) -> Vec<(SettingKey, SettingValue)> {
        use SettingKey::*;
        use SettingValue::*;
        let p = &self.panel;
        let v = &self.preview;
        vec![
            (PrimaryMonitor, Str(p.primary_monitor.clone().unwrap_or_default())),
            (MultiMonitors, Bool(p.multi_monitors)),
            (IsolateMonitors, Bool(p.isolate_monitors)),
            (KeepTopPanel, Bool(p.keep_top_panel)),
            (ForceHotCorner, Bool(p.force_hot_corner)),
            (EnableHotCorners, Bool(p.enable_hot_corners)),
            (PanelPositions, json_map(&p.positions)),
            (PanelLengths, json_map(&p.lengths)),
            (PanelAnchors, json_map(&p.anchors)),
            (PanelSizes, json_map(&p.sizes)),
            (PanelMargins, json_map(&p.margins)),
            (GlobalBorderRadius, Int(self.style.global_border_radius)),
            (Intellihide, Bool(self.intellihide.enabled)),
            (IntellihideKeyToggleText, Str(self.intellihide.toggle_key.clone())),
            (PreviewWidth, Int(v.width as i64)),
            (PreviewSpacing, Int(v.spacing as i64)),
            (DisplayMode, Str(v.display_mode.to_string())),
            (NamePosition, Str(v.name_position.to_string())),
            (AppIconSize, Int(v.app_icon_size as i64)),
            (StableIconOrder, Bool(v.stable_icon_order)),
            (ShortcutApps, StrList(v.shortcut_apps.clone())),
        ]
    }
}

/// Watches `path` and calls `on_change` with every successfully parsed
/// revision. The returned debouncer must be kept alive.
pub fn watch(
    path: PathBuf,
    on_change: impl Fn(Config) + Send + 'static,
) -> Result<Debouncer<RecommendedWatcher>, ConfigError> {
    let target = path.clone();
    let mut debouncer =
        new_debouncer(Duration::from_millis(250), move |res: DebounceEventResult| match res {
            Ok(events) => {
                if !events.iter().any(|e| e.path == target) {
                    return;
                }
                match Config::read(&target) {
                    Ok(config) => on_change(config),
                    Err(err) => warn!(%err, "ignoring config update"),
                }
            }
            Err(err) => warn!(?err, "config watch error"),
        })?;
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    debouncer.watcher().watch(&dir, RecursiveMode::NonRecursive)?;
    Ok(debouncer)
}
