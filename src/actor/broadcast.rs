use serde::{Deserialize, Serialize};

use crate::model::server::PanelData;

/// Notifications for subsystems outside the engine, such as a taskbar
/// icon provider.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum BroadcastEvent {
    PanelsCreated {
        panels: Vec<PanelData>,
    },
    FocusedMonitorChanged {
        monitor: usize,
        connector: Option<String>,
    },
    IntellihideToggled {
        hidden: bool,
    },
}

pub type BroadcastSender = crate::actor::Sender<BroadcastEvent>;
pub type BroadcastReceiver = crate::actor::Receiver<BroadcastEvent>;
