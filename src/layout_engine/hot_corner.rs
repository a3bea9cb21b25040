use serde::{Deserialize, Serialize};

use super::graph::Side;
use crate::sys::geometry::Point;
use crate::sys::screen::TopologySnapshot;

/// Thickness of the host's stock top panel. Corner barriers never exceed it.
pub const STOCK_PANEL_SIZE: i32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotCorner {
    pub monitor: usize,
    pub x: i32,
    pub y: i32,
    pub barrier_size: i32,
}

/// Edge and strip thickness of the panel on one monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelEdge {
    pub monitor: usize,
    pub side: Side,
    pub inner_size: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotCornerPolicy {
    pub enabled: bool,
    pub force: bool,
}

/// Places one corner per monitor at its top-left (top-right when RTL),
/// unless another monitor touches that corner from the side or above.
///
/// The primary monitor skips the adjacency check when its panel sits on the
/// top or left edge, or when forced.
pub fn hot_corners(
    topology: &TopologySnapshot,
    panels: &[PanelEdge],
    policy: HotCornerPolicy,
) -> Vec<HotCorner> {
    if !policy.enabled {
        return vec![];
    }
    let mut out = vec![];
    for monitor in &topology.monitors {
        let panel = panels.iter().find(|p| p.monitor == monitor.index);
        let side = panel.map(|p| p.side).unwrap_or(Side::Bottom);
        let f = monitor.frame;
        let corner = Point::new(if topology.rtl { f.max_x() } else { f.x }, f.y);

        let is_primary = topology.primary == Some(monitor.index);
        let check_adjacent = !is_primary || (!side.is_top_left() && !policy.force);
        if check_adjacent {
            let beside_x = if topology.rtl { corner.x + 1 } else { corner.x - 1 };
            let beside = Point::new(beside_x, corner.y);
            let above = Point::new(corner.x, corner.y - 1);
            let blocked = topology
                .monitors
                .iter()
                .filter(|other| other.index != monitor.index)
                .any(|other| other.frame.contains(beside) || other.frame.contains(above));
            if blocked {
                continue;
            }
        }

        let size = panel.map(|p| p.inner_size).unwrap_or(STOCK_PANEL_SIZE);
        out.push(HotCorner {
            monitor: monitor.index,
            x: corner.x,
            y: corner.y,
            barrier_size: size.min(STOCK_PANEL_SIZE),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::geometry::Rect;
    use crate::sys::screen::Monitor;

    const ON: HotCornerPolicy = HotCornerPolicy { enabled: true, force: false };

    fn side_by_side() -> TopologySnapshot {
        TopologySnapshot::new(vec![
            Monitor::new(0, "A", Rect::new(0, 0, 1920, 1080)).primary(),
            Monitor::new(1, "B", Rect::new(1920, 0, 1920, 1080)),
        ])
    }

    fn edge(monitor: usize, side: Side, inner_size: i32) -> PanelEdge {
        PanelEdge { monitor, side, inner_size }
    }

    #[test]
    fn disabled_yields_nothing() {
        let policy = HotCornerPolicy { enabled: false, force: true };
        let corners = hot_corners(&side_by_side(), &[], policy);
        assert!(corners.is_empty());
    }

    #[test]
    fn right_monitor_has_neighbour_on_its_left() {
        let panels = [edge(0, Side::Left, 48), edge(1, Side::Left, 48)];
        let corners = hot_corners(&side_by_side(), &panels, ON);
        assert_eq!(corners, vec![HotCorner { monitor: 0, x: 0, y: 0, barrier_size: 32 }]);
    }

    #[test]
    fn barrier_uses_thinner_panel() {
        let panels = [edge(0, Side::Top, 24)];
        let corners = hot_corners(&side_by_side(), &panels, ON);
        assert_eq!(corners[0].barrier_size, 24);
    }

    #[test]
    fn primary_bottom_panel_is_checked_unless_forced() {
        // Primary on the right, so its top-left touches monitor 0.
        let mut topo = side_by_side();
        topo.primary = Some(1);
        let panels = [edge(1, Side::Bottom, 48)];
        assert!(hot_corners(&topo, &panels, ON).iter().all(|c| c.monitor != 1));
        let forced = hot_corners(&topo, &panels, HotCornerPolicy { enabled: true, force: true });
        assert!(forced.iter().any(|c| c.monitor == 1 && c.x == 1920));
    }

    #[test]
    fn rtl_uses_top_right_corner() {
        let mut topo = side_by_side();
        topo.rtl = true;
        let corners = hot_corners(&topo, &[], ON);
        // Monitor 0's top-right touches monitor 1; monitor 1 is free.
        assert_eq!(corners, vec![HotCorner { monitor: 1, x: 3840, y: 0, barrier_size: 32 }]);
    }

    #[test]
    fn monitor_above_blocks_corner() {
        let topo = TopologySnapshot::new(vec![
            Monitor::new(0, "A", Rect::new(0, 0, 1920, 1080)).primary(),
            Monitor::new(1, "B", Rect::new(0, 1080, 1920, 1080)),
        ]);
        let corners = hot_corners(&topo, &[], ON);
        assert_eq!(corners.iter().map(|c| c.monitor).collect::<Vec<_>>(), vec![0]);
    }
}
