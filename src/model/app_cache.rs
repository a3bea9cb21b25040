use std::sync::Arc;

use dashmap::DashMap;

use crate::sys::shell::AppSystem;
use crate::sys::workspace::{AppId, WindowId};

/// Memoized window to app lookups. Entries are evicted explicitly when the
/// host reports the window destroyed.
#[derive(Clone, Default, Debug)]
pub struct WindowAppCache(Arc<DashMap<WindowId, AppId>>);

impl WindowAppCache {
    pub fn new() -> Self { Self::default() }

    /// Returns the cached app, asking `apps` on a miss. Failed lookups are
    /// not cached so a window whose app appears later resolves next time.
    pub fn app_for(&self, window: WindowId, apps: &dyn AppSystem) -> Option<AppId> {
        if let Some(app) = self.0.get(&window) {
            return Some(app.clone());
        }
        let app = apps.app_for_window(window)?;
        self.0.insert(window, app.clone());
        Some(app)
    }

    pub fn evict(&self, window: WindowId) -> bool { self.0.remove(&window).is_some() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn clear(&self) { self.0.clear(); }
}
