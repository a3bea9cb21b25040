//! Serializable snapshots of engine state, for broadcast and diagnostics.

use ascii_tree::Tree;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::actor::workspace_preview::PreviewOptions;
use crate::layout_engine::hot_corner::{HotCorner, HotCornerPolicy, PanelEdge, hot_corners};
use crate::layout_engine::panel_settings::{MAX_PREVIEW_WIDTH, PanelSettings};
use crate::layout_engine::preview_size::{
    HeightRequest, available_height, compute_height, shortcut_bar_height,
};
use crate::layout_engine::resolver::{PanelGeometry, ResolvedPanel, resolve};
use crate::model::panel::Panel;
use crate::sys::geometry::Size;
use crate::sys::screen::TopologySnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelData {
    pub monitor: usize,
    pub connector: String,
    pub is_primary: bool,
    pub is_standalone: bool,
    #[serde(default)]
    pub hidden: bool,
    pub geometry: PanelGeometry,
}

impl From<&Panel> for PanelData {
    fn from(panel: &Panel) -> Self {
        PanelData {
            monitor: panel.monitor.index,
            connector: panel.monitor.connector.clone(),
            is_primary: panel.is_primary,
            is_standalone: panel.is_standalone,
            hidden: panel.hidden,
            geometry: panel.geometry,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewData {
    pub monitor: usize,
    pub item_count: usize,
    pub item_height: i32,
    /// Estimated list height; absent when the preview is not shown.
    pub available_height: Option<i32>,
    pub shortcut_bar_height: i32,
}

/// What `edgepanel resolve` prints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveReport {
    pub panels: Vec<PanelData>,
    pub hot_corners: Vec<HotCorner>,
    pub previews: Vec<PreviewData>,
}

impl ResolveReport {
    /// Resolves panels offline, the way the engine would on enable.
    pub fn build(
        settings: &PanelSettings,
        options: &PreviewOptions,
        topology: &TopologySnapshot,
        policy: HotCornerPolicy,
        workspaces: usize,
    ) -> ResolveReport {
        let resolved = resolve(settings, topology);
        let edges: Vec<PanelEdge> = resolved
            .iter()
            .map(|r| PanelEdge {
                monitor: r.monitor.index,
                side: r.geometry.position,
                inner_size: r.geometry.inner_size,
            })
            .collect();
        let previews = resolved
            .iter()
            .map(|r| preview_data(settings, options, topology, r, workspaces))
            .collect();
        let panels = resolved
            .iter()
            .map(|r| PanelData {
                monitor: r.monitor.index,
                connector: r.monitor.connector.clone(),
                is_primary: r.is_primary,
                is_standalone: !r.is_primary || settings.keep_top_panel,
                hidden: false,
                geometry: r.geometry,
            })
            .collect();
        ResolveReport {
            panels,
            hot_corners: hot_corners(topology, &edges, policy),
            previews,
        }
    }
}

impl ResolveReport {
    /// Human-readable rendering, one node per monitor.
    pub fn tree(&self) -> Tree {
        let monitors = self
            .panels
            .iter()
            .map(|panel| {
                let g = &panel.geometry;
                let mut lines = vec![
                    format!("side: {:?}, anchor: {:?}", g.position, g.anchor),
                    format!(
                        "size: inner {} outer {} length {}",
                        g.inner_size, g.outer_size, g.length_px
                    ),
                    format!("frame: {:?}", g.frame),
                ];
                if let Some(p) = self.previews.iter().find(|p| p.monitor == panel.monitor) {
                    lines.push(format!("items: {} x {}px", p.item_count, p.item_height));
                }
                for c in self.hot_corners.iter().filter(|c| c.monitor == panel.monitor) {
                    lines.push(format!(
                        "hot corner: ({}, {}) barrier {}",
                        c.x, c.y, c.barrier_size
                    ));
                }
                let mut title = format!("{} [{}]", panel.connector, panel.monitor);
                if panel.is_primary {
                    title.push_str(" primary");
                }
                if panel.is_standalone {
                    title.push_str(" standalone");
                }
                Tree::Node(title, vec![Tree::Leaf(lines)])
            })
            .collect();
        Tree::Node("panels".into(), monitors)
    }
}

fn preview_data(
    settings: &PanelSettings,
    options: &PreviewOptions,
    topology: &TopologySnapshot,
    resolved: &ResolvedPanel,
    workspaces: usize,
) -> PreviewData {
    let thickness = settings.preview_width.min(MAX_PREVIEW_WIDTH) as i32;
    let shown = settings.display_mode.shows_preview();
    let available = shown.then(|| {
        available_height(
            None,
            resolved.geometry.position,
            resolved.monitor.frame.height,
            thickness,
            options.icon_size,
        )
    });
    let work_area: Option<Size> = topology.work_area_of(resolved.monitor.index).map(|r| r.size());
    PreviewData {
        monitor: resolved.monitor.index,
        item_count: workspaces,
        item_height: compute_height(&HeightRequest {
            preview_width: thickness,
            work_area,
            item_count: workspaces,
            names: options.names,
            available,
            base_spacing: options.spacing,
            icon_size: options.icon_size,
        }),
        available_height: available,
        shortcut_bar_height: shortcut_bar_height(options.icon_size),
    }
}
