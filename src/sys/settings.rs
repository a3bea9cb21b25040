use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;
use tracing::trace;

use crate::common::collections::HashMap;
use crate::common::config::Config;

/// Every setting the panel engines read or subscribe to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SettingKey {
    PrimaryMonitor,
    MultiMonitors,
    IsolateMonitors,
    PanelPositions,
    PanelLengths,
    PanelAnchors,
    PanelSizes,
    PanelMargins,
    KeepTopPanel,
    ForceHotCorner,
    EnableHotCorners,
    GlobalBorderRadius,
    Intellihide,
    IntellihideKeyToggleText,
    PreviewWidth,
    PreviewSpacing,
    DisplayMode,
    NamePosition,
    AppIconSize,
    StableIconOrder,
    ShortcutApps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Str,
    StrList,
}

impl SettingKey {
    pub fn kind(self) -> ValueKind {
        use SettingKey::*;
        match self {
            MultiMonitors | IsolateMonitors | KeepTopPanel | ForceHotCorner | EnableHotCorners
            | Intellihide | StableIconOrder => ValueKind::Bool,
            GlobalBorderRadius | PreviewWidth | PreviewSpacing | AppIconSize => ValueKind::Int,
            PrimaryMonitor | PanelPositions | PanelLengths | PanelAnchors | PanelSizes
            | PanelMargins | IntellihideKeyToggleText | DisplayMode | NamePosition => {
                ValueKind::Str
            }
            ShortcutApps => ValueKind::StrList,
        }
    }

    /// Keys whose change invalidates the panel set and forces a reset.
    pub fn requires_reset(self) -> bool {
        use SettingKey::*;
        matches!(
            self,
            PrimaryMonitor
                | MultiMonitors
                | IsolateMonitors
                | PanelPositions
                | PanelLengths
                | PanelAnchors
                | PanelSizes
                | PanelMargins
                | KeepTopPanel
                | DisplayMode
                | PreviewWidth
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Str(String),
    StrList(Vec<String>),
}

impl SettingValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SettingValue::Bool(_) => ValueKind::Bool,
            SettingValue::Int(_) => ValueKind::Int,
            SettingValue::Str(_) => ValueKind::Str,
            SettingValue::StrList(_) => ValueKind::StrList,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("setting {key} expects a {expected:?} value, got {found:?}")]
    TypeMismatch {
        key: SettingKey,
        expected: ValueKind,
        found: ValueKind,
    },
}

pub type HandlerId = u64;

/// Key/value store with change notification.
pub trait SettingsStore {
    fn get(&self, key: SettingKey) -> Option<SettingValue>;

    fn set(&self, key: SettingKey, value: SettingValue) -> Result<(), SettingsError>;

    /// Registers a handler that runs after every effective change.
    fn connect(&self, handler: Box<dyn Fn(SettingKey)>) -> HandlerId;

    fn disconnect(&self, id: HandlerId) -> bool;

    fn get_bool(&self, key: SettingKey) -> bool {
        matches!(self.get(key), Some(SettingValue::Bool(true)))
    }

    fn get_int(&self, key: SettingKey) -> Option<i64> {
        match self.get(key) {
            Some(SettingValue::Int(v)) => Some(v),
            _ => None,
        }
    }

    fn get_string(&self, key: SettingKey) -> Option<String> {
        match self.get(key) {
            Some(SettingValue::Str(v)) => Some(v),
            _ => None,
        }
    }

    fn get_strv(&self, key: SettingKey) -> Vec<String> {
        match self.get(key) {
            Some(SettingValue::StrList(v)) => v,
            _ => vec![],
        }
    }
}

/// In-process [`SettingsStore`], seeded from a [`Config`].
#[derive(Default)]
pub struct MemorySettings {
    values: RefCell<HashMap<SettingKey, SettingValue>>,
    handlers: RefCell<Vec<(HandlerId, Rc<dyn Fn(SettingKey)>)>>,
    next_handler: Cell<HandlerId>,
}

impl MemorySettings {
    pub fn new() -> Self { Self::default() }

    pub fn from_config(config: &Config) -> Self {
        let store = Self::new();
        store.values.borrow_mut().extend(config.to_settings());
        store
    }

    pub fn handler_count(&self) -> usize { self.handlers.borrow().len() }

    fn notify(&self, key: SettingKey) {
        let handlers: Vec<_> = self.handlers.borrow().iter().map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            handler(key);
        }
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: SettingKey) -> Option<SettingValue> {
        self.values.borrow().get(&key).cloned()
    }

    fn set(&self, key: SettingKey, value: SettingValue) -> Result<(), SettingsError> {
        if key.kind() != value.kind() {
            return Err(SettingsError::TypeMismatch {
                key,
                expected: key.kind(),
                found: value.kind(),
            });
        }
        let previous = self.values.borrow_mut().insert(key, value.clone());
        if previous.as_ref() == Some(&value) {
            return Ok(());
        }
        trace!(%key, ?value, "setting changed");
        self.notify(key);
        Ok(())
    }

    fn connect(&self, handler: Box<dyn Fn(SettingKey)>) -> HandlerId {
        let id = self.next_handler.get() + 1;
        self.next_handler.set(id);
        self.handlers.borrow_mut().push((id, Rc::from(handler)));
        id
    }

    fn disconnect(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != id);
        handlers.len() != before
    }
}
