//! Sizing of the workspace preview pane and its items.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::graph::{Orientation, Side};
use crate::sys::geometry::{Point, Rect, Size};

/// Item height used when the work area aspect is unknown.
pub const FALLBACK_ITEM_HEIGHT: i32 = 120;
pub const MIN_ITEM_HEIGHT: i32 = 24;
/// Border and padding around each item's thumbnail.
pub const ITEM_CHROME: i32 = 4;
/// Extra height of a name label rendered under the thumbnail.
pub const LABEL_BELOW_HEIGHT: i32 = 34;
pub const DEFAULT_ICON_SIZE: i32 = 48;
pub const MIN_ICON_SIZE: i32 = 16;
pub const MAX_ICON_SIZE: i32 = 96;
pub const MAX_SHOWN_ICONS: usize = 8;
pub const SHORTCUT_SLOTS: usize = 5;
/// Most items a preview list holds.
pub const MAX_ITEMS: usize = 64;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum NamePosition {
    #[default]
    BottomLeft,
    BottomRight,
    Below,
}

pub fn clamp_icon_size(size: i64) -> i32 {
    size.clamp(MIN_ICON_SIZE as i64, MAX_ICON_SIZE as i64) as i32
}

/// How far app icons hang below a thumbnail's bottom edge.
pub fn icon_overflow(icon_size: i32, names: NamePosition) -> i32 {
    match names {
        NamePosition::Below => 0,
        _ => (icon_size + 6 + 1) / 2,
    }
}

/// Item height matching the work area's aspect ratio at `preview_width`.
pub fn ideal_height(preview_width: i32, work_area: Option<Size>) -> i32 {
    match work_area {
        Some(wa) if !wa.is_empty() && preview_width > 0 => {
            (preview_width as f64 * wa.height as f64 / wa.width as f64).round() as i32
        }
        _ => FALLBACK_ITEM_HEIGHT,
    }
}

/// Vertical metrics of the item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stack {
    pub spacing: i32,
    pub label_below: i32,
    pub chrome: i32,
    pub bottom_pad: i32,
}

impl Stack {
    pub fn for_preview(base_spacing: i32, icon_size: i32, names: NamePosition) -> Stack {
        let overflow = icon_overflow(icon_size, names);
        Stack {
            spacing: base_spacing + overflow,
            label_below: if names == NamePosition::Below { LABEL_BELOW_HEIGHT } else { 0 },
            chrome: ITEM_CHROME,
            bottom_pad: overflow,
        }
    }

    pub fn per_item_overhead(&self) -> i32 { self.label_below + self.chrome }

    pub fn fixed_overhead(&self, count: i32) -> i32 {
        (count - 1) * self.spacing + count * self.per_item_overhead() + self.bottom_pad
    }

    /// Height for each of `count` items so that the list fits `available`.
    ///
    /// Never shrinks before the container size is known, and never returns
    /// less than [`MIN_ITEM_HEIGHT`].
    pub fn fit(&self, ideal: i32, count: usize, available: Option<i32>) -> i32 {
        let n = count.clamp(1, MAX_ITEMS) as i32;
        let floor = ideal.max(MIN_ITEM_HEIGHT);
        let Some(avail) = available.filter(|&a| a > 0 && a >= MIN_ITEM_HEIGHT * n) else {
            return floor;
        };
        let fixed = self.fixed_overhead(n);
        let need =
            n * (ideal + self.per_item_overhead()) + (n - 1) * self.spacing + self.bottom_pad;
        if need <= avail {
            return floor;
        }
        let per = (avail - fixed).div_euclid(n);
        per.min(ideal).max(MIN_ITEM_HEIGHT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightRequest {
    pub preview_width: i32,
    pub work_area: Option<Size>,
    pub item_count: usize,
    pub names: NamePosition,
    pub available: Option<i32>,
    pub base_spacing: i32,
    pub icon_size: i32,
}

pub fn compute_height(req: &HeightRequest) -> i32 {
    let ideal = ideal_height(req.preview_width, req.work_area);
    Stack::for_preview(req.base_spacing, req.icon_size, req.names).fit(
        ideal,
        req.item_count,
        req.available,
    )
}

/// Height of the shortcut bar below the list.
pub fn shortcut_bar_height(icon_size: i32) -> i32 { icon_size + 10 }

/// Space the item list may use. Falls back to an estimate while the pane
/// has no allocation.
pub fn available_height(
    allocation: Option<Size>,
    side: Side,
    monitor_height: i32,
    thickness: i32,
    icon_size: i32,
) -> i32 {
    let base = match allocation {
        Some(a) if a.height > 0 => a.height,
        _ => match side.orientation() {
            Orientation::Vertical => monitor_height,
            Orientation::Horizontal => thickness,
        },
    };
    (base - shortcut_bar_height(icon_size)).max(0)
}

/// Placement of a workspace's content inside its thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailGeometry {
    pub scale: f64,
    pub offset: Point,
}

/// Scales the work area to cover the thumbnail and centers it.
pub fn thumbnail_geometry(thumb: Size, work_area: Rect) -> Option<ThumbnailGeometry> {
    if thumb.is_empty() || work_area.size().is_empty() {
        return None;
    }
    let sx = thumb.width as f64 / work_area.width as f64;
    let sy = thumb.height as f64 / work_area.height as f64;
    let scale = sx.max(sy);
    let ox = ((thumb.width as f64 - work_area.width as f64 * scale) / 2.0).floor() as i32;
    let oy = ((thumb.height as f64 - work_area.height as f64 * scale) / 2.0).floor() as i32;
    Some(ThumbnailGeometry { scale, offset: Point::new(ox, oy) })
}
