//! Interception points installed into host subsystems.
//!
//! Every installed point is recorded so that teardown restores the host in
//! reverse installation order, whatever subset was applied.

use tracing::trace;

use crate::sys::shell::{OverridePoint, ShellChrome};

#[derive(Debug, Default)]
pub struct OverrideRegistry {
    installed: Vec<OverridePoint>,
}

impl OverrideRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn install(&mut self, chrome: &dyn ShellChrome, point: OverridePoint) -> bool {
        if self.is_installed(point) {
            return false;
        }
        trace!(?point, "installing override");
        chrome.install_override(point);
        self.installed.push(point);
        true
    }

    pub fn retract(&mut self, chrome: &dyn ShellChrome, point: OverridePoint) -> bool {
        let Some(pos) = self.installed.iter().position(|p| *p == point) else {
            return false;
        };
        self.installed.remove(pos);
        chrome.restore_override(point);
        true
    }

    pub fn set(&mut self, chrome: &dyn ShellChrome, point: OverridePoint, on: bool) -> bool {
        if on { self.install(chrome, point) } else { self.retract(chrome, point) }
    }

    pub fn restore_all(&mut self, chrome: &dyn ShellChrome) {
        while let Some(point) = self.installed.pop() {
            chrome.restore_override(point);
        }
    }

    pub fn is_installed(&self, point: OverridePoint) -> bool { self.installed.contains(&point) }

    pub fn is_empty(&self) -> bool { self.installed.is_empty() }
}
