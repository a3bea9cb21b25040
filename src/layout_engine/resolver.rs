//! Maps settings and a topology snapshot to per-monitor panel geometry.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::graph::{Anchor, Orientation, Side};
use super::panel_settings::PanelSettings;
use crate::sys::geometry::Rect;
use crate::sys::screen::{Monitor, TopologySnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelGeometry {
    pub position: Side,
    /// Thickness including margins and the preview pane.
    pub outer_size: i32,
    /// Thickness of the panel strip itself.
    pub inner_size: i32,
    pub length_px: i32,
    pub anchor: Anchor,
    /// Where the panel sits in global coordinates; also its strut.
    pub frame: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPanel {
    pub monitor: Monitor,
    pub geometry: PanelGeometry,
    pub is_primary: bool,
}

/// The monitor that hosts the primary panel: the configured connector if it
/// is still connected, else the system primary.
pub fn primary_monitor<'a>(
    settings: &PanelSettings,
    topology: &'a TopologySnapshot,
) -> Option<&'a Monitor> {
    if let Some(connector) = &settings.primary_monitor {
        match topology.find_connector(connector) {
            Some(m) => return Some(m),
            None => debug!(%connector, "configured primary monitor is gone"),
        }
    }
    topology.primary_monitor()
}

pub fn panel_geometry(settings: &PanelSettings, monitor: &Monitor) -> PanelGeometry {
    let position = settings.position(monitor);
    let anchor = settings.anchor(monitor);
    let inner = settings.size(monitor) as i32;
    let margin = settings.margin(monitor) as i32;
    let outer = inner + 2 * margin + settings.preview_thickness();

    let f = monitor.frame;
    let extent = match position.orientation() {
        Orientation::Horizontal => f.width,
        Orientation::Vertical => f.height,
    };
    let length = (extent as f64 * settings.length_percent(monitor) as f64 / 100.0).round() as i32;
    let offset = anchor.offset(extent, length);

    let frame = match position {
        Side::Top => Rect::new(f.x + offset, f.y, length, outer),
        Side::Bottom => Rect::new(f.x + offset, f.max_y() - outer, length, outer),
        Side::Left => Rect::new(f.x, f.y + offset, outer, length),
        Side::Right => Rect::new(f.max_x() - outer, f.y + offset, outer, length),
    };

    PanelGeometry {
        position,
        outer_size: outer,
        inner_size: inner,
        length_px: length,
        anchor,
        frame,
    }
}

/// One entry for the primary monitor, then one per other monitor when
/// multi-monitor mode is on. Empty when there is no primary monitor.
pub fn resolve(settings: &PanelSettings, topology: &TopologySnapshot) -> Vec<ResolvedPanel> {
    let Some(primary) = primary_monitor(settings, topology) else {
        debug!("no primary monitor; no panels");
        return vec![];
    };
    let mut out = vec![ResolvedPanel {
        monitor: primary.clone(),
        geometry: panel_geometry(settings, primary),
        is_primary: true,
    }];
    if settings.multi_monitors {
        out.extend(topology.monitors.iter().filter(|m| m.index != primary.index).map(|m| {
            ResolvedPanel {
                monitor: m.clone(),
                geometry: panel_geometry(settings, m),
                is_primary: false,
            }
        }));
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout_engine::panel_settings::{DisplayMode, PerMonitor};
    use crate::sys::settings::SettingKey;

    fn topology(n: usize) -> TopologySnapshot {
        let monitors = (0..n)
            .map(|i| {
                let frame = Rect::new(i as i32 * 1920, 0, 1920, 1080);
                let m = Monitor::new(i, format!("DP-{i}"), frame);
                if i == 0 { m.primary() } else { m }
            })
            .collect();
        TopologySnapshot::new(monitors)
    }

    fn settings() -> PanelSettings {
        PanelSettings {
            display_mode: DisplayMode::Panel,
            ..PanelSettings::default()
        }
    }

    #[test]
    fn resolving_twice_is_identical() {
        let topo = topology(3);
        let s = settings();
        assert_eq!(resolve(&s, &topo), resolve(&s, &topo));
    }

    #[test]
    fn panel_count_follows_multi_monitor_flag() {
        for n in 1..=4 {
            let topo = topology(n);
            let mut s = settings();
            s.multi_monitors = true;
            assert_eq!(resolve(&s, &topo).len(), n);
            s.multi_monitors = false;
            assert_eq!(resolve(&s, &topo).len(), 1);
        }
    }

    #[test]
    fn primary_is_listed_first() {
        let topo = topology(3);
        let mut s = settings();
        s.primary_monitor = Some("DP-2".into());
        let panels = resolve(&s, &topo);
        let order: Vec<usize> = panels.iter().map(|p| p.monitor.index).collect();
        assert_eq!(order, vec![2, 0, 1]);
        assert!(panels[0].is_primary && !panels[1].is_primary);
    }

    #[test]
    fn stale_primary_choice_falls_back_to_system_primary() {
        let topo = topology(2);
        let mut s = settings();
        s.primary_monitor = Some("HDMI-9".into());
        assert_eq!(primary_monitor(&s, &topo).map(|m| m.index), Some(0));
    }

    #[test]
    fn no_primary_means_no_panels() {
        let mut topo = topology(2);
        topo.primary = None;
        assert!(resolve(&settings(), &topo).is_empty());
        assert!(resolve(&settings(), &TopologySnapshot::default()).is_empty());
    }

    #[test]
    fn default_geometry_is_a_full_length_right_panel() {
        let topo = topology(1);
        let g = panel_geometry(&settings(), &topo.monitors[0]);
        assert_eq!(g, PanelGeometry {
            position: Side::Right,
            outer_size: 48,
            inner_size: 48,
            length_px: 1080,
            anchor: Anchor::Middle,
            frame: Rect::new(1872, 0, 48, 1080),
        });
    }

    #[test]
    fn anchored_partial_panels() {
        let topo = topology(2);
        let mut s = settings();
        s.positions = PerMonitor::parse(SettingKey::PanelPositions, r#"{"*": "bottom"}"#, |v| {
            v.as_str()?.parse().ok()
        });
        s.lengths = PerMonitor::parse(SettingKey::PanelLengths, r#"{"*": 50}"#, |v| {
            v.as_u64().map(|n| n as u32)
        });
        s.anchors = PerMonitor::parse(SettingKey::PanelAnchors, r#"{"DP-1": "end"}"#, |v| {
            v.as_str()?.parse().ok()
        });
        let panels = resolve(&s, &topo);
        assert_eq!(panels[0].geometry.frame, Rect::new(480, 1032, 960, 48));
        assert_eq!(panels[1].geometry.frame, Rect::new(1920 + 960, 1032, 960, 48));
    }

    #[test]
    fn preview_and_margins_widen_outer_size() {
        let topo = topology(1);
        let mut s = settings();
        s.display_mode = DisplayMode::Both;
        s.preview_width = 180;
        s.margins = PerMonitor::parse(SettingKey::PanelMargins, r#"{"*": 4}"#, |v| {
            v.as_u64().map(|n| n as u32)
        });
        let g = panel_geometry(&s, &topo.monitors[0]);
        assert_eq!((g.inner_size, g.outer_size), (48, 48 + 8 + 180));
        assert!(g.outer_size >= g.inner_size);
        assert_eq!(g.frame, Rect::new(1920 - 236, 0, 236, 1080));
    }

    #[test]
    fn oversized_margin_and_preview_are_bounded() {
        let topo = topology(1);
        let mut s = settings();
        s.display_mode = DisplayMode::Both;
        s.preview_width = 3_000_000_000;
        s.margins = PerMonitor::parse(SettingKey::PanelMargins, r#"{"*": 2000000000}"#, |v| {
            v.as_u64().and_then(|n| u32::try_from(n).ok())
        });
        let g = panel_geometry(&s, &topo.monitors[0]);
        assert_eq!(g.outer_size, 48 + 2 * 64 + 1024);
        assert!(g.outer_size >= g.inner_size);
        assert_eq!(g.frame, Rect::new(1920 - g.outer_size, 0, g.outer_size, 1080));
    }
}
