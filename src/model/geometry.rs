//! Bounding-box arithmetic.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page space with a top-left origin.
///
/// - `x0`: left edge
/// - `y0`: top edge (distance from the top of the page)
/// - `x1`: right edge
/// - `y1`: bottom edge
///
/// Serializes as `[x0, y0, x1, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    /// Create a box from its four edges.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Create a box from two corners in any order.
    pub fn from_corners(ax: f32, ay: f32, bx: f32, by: f32) -> Self {
        Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
        }
    }

    /// Width of the box.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Height of the box.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Whether all four coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// Whether width or height falls below `min_size`.
    pub fn is_degenerate(&self, min_size: f32) -> bool {
        self.width() < min_size || self.height() < min_size
    }

    /// Compute the union of two boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Union of every box in the iterator, or `None` when it is empty.
    pub fn union_all<'a, I>(boxes: I) -> Option<BBox>
    where
        I: IntoIterator<Item = &'a BBox>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BBox>, b| match acc {
                Some(u) => Some(u.union(b)),
                None => Some(*b),
            })
    }

    /// Length of the overlap of the two boxes' horizontal extents (0 when disjoint).
    pub fn horizontal_overlap(&self, other: &BBox) -> f32 {
        (self.x1.min(other.x1) - self.x0.max(other.x0)).max(0.0)
    }

    /// Horizontal overlap divided by the narrower width.
    ///
    /// Returns 0 when either box has no width.
    pub fn horizontal_overlap_ratio(&self, other: &BBox) -> f32 {
        let min_width = self.width().min(other.width());
        if min_width > 0.0 {
            self.horizontal_overlap(other) / min_width
        } else {
            0.0
        }
    }

    /// Whether `next` starts no further than `tolerance` below this box's bottom edge.
    pub fn continues_below(&self, next: &BBox, tolerance: f32) -> bool {
        next.y0 <= self.y1 + tolerance
    }

    /// Whether the vertical extents overlap, allowing `tolerance` of slack.
    pub fn same_line(&self, other: &BBox, tolerance: f32) -> bool {
        !(self.y1 < other.y0 - tolerance || other.y1 < self.y0 - tolerance)
    }

    /// Horizontal separation between the boxes, whichever side `other` is on.
    ///
    /// Negative when the boxes overlap horizontally.
    pub fn horizontal_gap(&self, other: &BBox) -> f32 {
        (other.x0 - self.x1).max(self.x0 - other.x1)
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains(&self, other: &BBox) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }

    /// Whether the point lies inside this box (edges included).
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Whether the two boxes share any area or edge.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }

    /// Reading-order comparison: top edge first, then left edge.
    pub fn reading_order(&self, other: &BBox) -> std::cmp::Ordering {
        self.y0
            .total_cmp(&other.y0)
            .then(self.x0.total_cmp(&other.x0))
    }
}

impl From<[f32; 4]> for BBox {
    fn from(v: [f32; 4]) -> Self {
        BBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}

impl std::fmt::Display for BBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.1}, {:.1}, {:.1}, {:.1})",
            self.x0, self.y0, self.x1, self.y1
        )
    }
}
