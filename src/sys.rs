pub mod event;
pub mod geometry;
pub mod screen;
pub mod settings;
pub mod shell;
pub mod timer;
pub mod workspace;

#[cfg(test)]
pub mod fake;

use std::rc::Rc;

use self::screen::DisplayTopology;
use self::settings::SettingsStore;
use self::shell::{AppSystem, ShellChrome};
use self::workspace::WorkspaceCollection;

/// The collaborators the engines are built on. All of them are owned by the
/// host shell and shared read-mostly with this crate.
#[derive(Clone)]
pub struct Host {
    pub settings: Rc<dyn SettingsStore>,
    pub topology: Rc<dyn DisplayTopology>,
    pub workspaces: Rc<dyn WorkspaceCollection>,
    pub apps: Rc<dyn AppSystem>,
    pub chrome: Rc<dyn ShellChrome>,
}
