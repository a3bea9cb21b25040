//! Per-workspace ordering of running-application icons.
//!
//! In stable mode an app keeps the ordinal it got when first seen on a
//! workspace, so focusing a window never reorders the strip.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::common::collections::HashMap;
use crate::layout_engine::preview_size::MAX_SHOWN_ICONS;
use crate::sys::workspace::AppId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconOrderMode {
    #[default]
    Stable,
    Recency,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEntry {
    pub app: AppId,
    /// Most recent user time across the app's windows.
    pub user_time: u64,
}

/// Collapses windows to one entry per app, in first-seen order, keeping
/// the latest user time.
pub fn dedup(windows: impl IntoIterator<Item = (AppId, u64)>) -> Vec<AppEntry> {
    let mut out: Vec<AppEntry> = vec![];
    let mut pos: HashMap<AppId, usize> = HashMap::default();
    for (app, t) in windows {
        match pos.get(&app) {
            Some(&i) => out[i].user_time = out[i].user_time.max(t),
            None => {
                pos.insert(app.clone(), out.len());
                out.push(AppEntry { app, user_time: t });
            }
        }
    }
    out
}

#[derive(Debug)]
struct StableOrder {
    ordinals: HashMap<AppId, u64>,
    next: u64,
}

impl Default for StableOrder {
    fn default() -> Self {
        Self {
            ordinals: HashMap::default(),
            next: 1,
        }
    }
}

/// Stable ordinals keyed by workspace index.
#[derive(Debug, Default)]
pub struct IconOrderCache {
    by_index: HashMap<usize, StableOrder>,
}

impl IconOrderCache {
    pub fn new() -> Self { Self::default() }

    pub fn order(&mut self, index: usize, apps: &[AppEntry], mode: IconOrderMode) -> Vec<AppId> {
        match mode {
            IconOrderMode::Recency => {
                let mut sorted: Vec<&AppEntry> = apps.iter().collect();
                sorted.sort_by(|a, b| b.user_time.cmp(&a.user_time));
                sorted.into_iter().map(|e| e.app.clone()).collect()
            }
            IconOrderMode::Stable => {
                let order = self.by_index.entry(index).or_default();
                for entry in apps {
                    if !order.ordinals.contains_key(&entry.app) {
                        order.ordinals.insert(entry.app.clone(), order.next);
                        order.next += 1;
                    }
                }
                order.ordinals.retain(|app, _| apps.iter().any(|e| &e.app == app));
                let mut sorted: Vec<(u64, &AppId)> = apps
                    .iter()
                    .map(|e| (order.ordinals.get(&e.app).copied().unwrap_or(0), &e.app))
                    .collect();
                sorted.sort_by_key(|(ordinal, _)| *ordinal);
                sorted.into_iter().map(|(_, app)| app.clone()).collect()
            }
        }
    }

    pub fn ordinal(&self, index: usize, app: &str) -> Option<u64> {
        self.by_index.get(&index)?.ordinals.get(app).copied()
    }

    /// Drops every index's ordinals. Indices shift when workspaces are
    /// removed or reordered, so nothing keyed by them survives.
    pub fn clear(&mut self) { self.by_index.clear(); }

    pub fn is_empty(&self) -> bool { self.by_index.is_empty() }
}

/// The icons rendered for one preview item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconStrip {
    pub shown: Vec<AppId>,
    pub overflow: Vec<AppId>,
}

impl IconStrip {
    pub fn new(mut ordered: Vec<AppId>) -> IconStrip {
        let overflow = if ordered.len() > MAX_SHOWN_ICONS {
            ordered.split_off(MAX_SHOWN_ICONS)
        } else {
            vec![]
        };
        IconStrip { shown: ordered, overflow }
    }

    /// Identifies what would be rendered, to skip redundant updates.
    pub fn signature(&self, icon_size: i32) -> u64 {
        let mut h = FxHasher::default();
        icon_size.hash(&mut h);
        self.shown.hash(&mut h);
        self.overflow.len().hash(&mut h);
        h.finish()
    }
}
