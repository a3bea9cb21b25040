use slotmap::new_key_type;

use crate::layout_engine::resolver::{PanelGeometry, ResolvedPanel};
use crate::sys::screen::Monitor;
use crate::sys::shell::{ChromeFlags, PanelChild};

new_key_type! {
    pub struct PanelId;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub id: PanelId,
    pub monitor: Monitor,
    pub geometry: PanelGeometry,
    /// Owns its own container. Otherwise the panel lives in the host's
    /// native top panel box and must hand it back on teardown.
    pub is_standalone: bool,
    pub is_primary: bool,
    pub children: Vec<PanelChild>,
    /// Hidden by the intellihide toggle.
    pub hidden: bool,
}

impl Panel {
    pub fn new(id: PanelId, resolved: ResolvedPanel, is_standalone: bool) -> Panel {
        Panel {
            id,
            monitor: resolved.monitor,
            geometry: resolved.geometry,
            is_standalone,
            is_primary: resolved.is_primary,
            children: vec![],
            hidden: false,
        }
    }

    /// Container flags. Intellihide panels and hidden panels do not reserve
    /// a strut.
    pub fn chrome_flags(&self, intellihide: bool) -> ChromeFlags {
        let mut flags = ChromeFlags::TRACK_FULLSCREEN;
        if !self.hidden {
            flags |= ChromeFlags::AFFECTS_INPUT;
        }
        if !intellihide && !self.hidden {
            flags |= ChromeFlags::AFFECTS_STRUTS;
        }
        flags
    }
}
