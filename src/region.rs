//! Document-space rectangles.
//!
//! An [`UpdateRegion`] is a half-open, axis-aligned rectangle `[x1, x2) × [y1, y2)` in scaled
//! document coordinates. It is the unit every other part of the backing store speaks in:
//! update targets, validity bookkeeping, availability queries and draw regions.
//!
//! ```
//! use gosub_backing_store::UpdateRegion;
//!
//! let a = UpdateRegion::new(0, 0, 200, 200);
//! let b = UpdateRegion::from_xywh(100, 150, 200, 100);
//!
//! assert_eq!(a.intersect(&b), UpdateRegion::new(100, 150, 200, 200));
//! assert_eq!(a.width(), 200);
//! assert!(!a.intersects(&UpdateRegion::new(200, 0, 300, 10)));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

mod set;

pub use set::RegionSet;

/// A half-open rectangle in scaled document coordinates.
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct UpdateRegion {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Debug for UpdateRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{} → {},{}]", self.x1, self.y1, self.x2, self.y2)
    }
}

impl Display for UpdateRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width(), self.height(), self.x1, self.y1)
    }
}

impl UpdateRegion {
    /// Creates a region from its corners. Inverted input collapses to an empty region at `(x1, y1)`.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x1,
            y1,
            x2: x2.max(x1),
            y2: y2.max(y1),
        }
    }

    /// Creates a region from an origin and a size.
    pub fn from_xywh(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self::new(
            x,
            y,
            x.saturating_add(clamp_u32(width)),
            y.saturating_add(clamp_u32(height)),
        )
    }

    // x1 <= x2, so the wrapped difference is the exact distance
    #[inline]
    pub fn width(&self) -> u32 {
        self.x2.wrapping_sub(self.x1) as u32
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.y2.wrapping_sub(self.y1) as u32
    }

    /// Number of pixels covered. Wide enough to never overflow.
    #[inline]
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    /// Returns true when `other` lies completely inside this region. Empty regions are
    /// contained everywhere.
    pub fn contains(&self, other: &UpdateRegion) -> bool {
        other.is_empty()
            || (other.x1 >= self.x1 && other.x2 <= self.x2 && other.y1 >= self.y1 && other.y2 <= self.y2)
    }

    pub fn intersects(&self, other: &UpdateRegion) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Returns the overlap of both regions (possibly empty).
    pub fn intersect(&self, other: &UpdateRegion) -> UpdateRegion {
        UpdateRegion::new(
            self.x1.max(other.x1),
            self.y1.max(other.y1),
            self.x2.min(other.x2),
            self.y2.min(other.y2),
        )
    }

    /// Smallest region containing both. Empty inputs are ignored.
    pub fn bounding_union(&self, other: &UpdateRegion) -> UpdateRegion {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        UpdateRegion::new(
            self.x1.min(other.x1),
            self.y1.min(other.y1),
            self.x2.max(other.x2),
            self.y2.max(other.y2),
        )
    }

    /// Moves the region by `(dx, dy)`, saturating at the coordinate range.
    pub fn translate(&self, dx: i32, dy: i32) -> UpdateRegion {
        UpdateRegion {
            x1: self.x1.saturating_add(dx),
            y1: self.y1.saturating_add(dy),
            x2: self.x2.saturating_add(dx),
            y2: self.y2.saturating_add(dy),
        }
    }

    /// Returns the parts of `self` not covered by `other`, as at most four disjoint bands:
    /// a full-width top and bottom band and the left and right pieces of the middle band.
    pub fn subtract(&self, other: &UpdateRegion) -> Vec<UpdateRegion> {
        let overlap = self.intersect(other);
        if overlap.is_empty() {
            return if self.is_empty() { Vec::new() } else { vec![*self] };
        }

        let candidates = [
            UpdateRegion::new(self.x1, self.y1, self.x2, overlap.y1),
            UpdateRegion::new(self.x1, overlap.y1, overlap.x1, overlap.y2),
            UpdateRegion::new(overlap.x2, overlap.y1, self.x2, overlap.y2),
            UpdateRegion::new(self.x1, overlap.y2, self.x2, self.y2),
        ];

        candidates.into_iter().filter(|r| !r.is_empty()).collect()
    }
}

fn clamp_u32(v: u32) -> i32 {
    v.min(i32::MAX as u32) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_corners_collapse_to_empty() {
        let r = UpdateRegion::new(10, 10, 5, 20);
        assert!(r.is_empty());
        assert_eq!(r.width(), 0);
        assert_eq!(r.height(), 10);
        assert_eq!(r.area(), 0);
    }

    #[test]
    fn intersection_of_disjoint_regions_is_empty() {
        let a = UpdateRegion::new(0, 0, 100, 100);
        let b = UpdateRegion::new(100, 0, 200, 100);
        assert!(a.intersect(&b).is_empty());
        assert!(!a.intersects(&b));
    }

    #[test]
    fn half_open_containment() {
        let r = UpdateRegion::new(0, 0, 10, 10);
        assert!(r.contains(&UpdateRegion::new(2, 2, 10, 10)));
        assert!(!r.contains(&UpdateRegion::new(2, 2, 11, 10)));
        assert!(r.contains(&UpdateRegion::new(50, 50, 50, 50)));
    }

    #[test]
    fn subtract_punches_a_hole_into_four_bands() {
        let outer = UpdateRegion::new(0, 0, 30, 30);
        let hole = UpdateRegion::new(10, 10, 20, 20);
        let parts = outer.subtract(&hole);

        assert_eq!(parts.len(), 4);
        let area: u64 = parts.iter().map(|r| r.area()).sum();
        assert_eq!(area, outer.area() - hole.area());
        for (i, a) in parts.iter().enumerate() {
            assert!(!a.intersects(&hole));
            for b in parts.iter().skip(i + 1) {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn subtract_covering_region_leaves_nothing() {
        let r = UpdateRegion::new(5, 5, 10, 10);
        assert!(r.subtract(&UpdateRegion::new(0, 0, 100, 100)).is_empty());
        assert_eq!(r.subtract(&UpdateRegion::new(50, 50, 60, 60)), vec![r]);
    }

    #[test]
    fn subtract_a_strip_keeps_the_rest() {
        let r = UpdateRegion::new(0, 0, 200, 200);
        let parts = r.subtract(&UpdateRegion::new(0, 0, 200, 50));
        assert_eq!(parts, vec![UpdateRegion::new(0, 50, 200, 200)]);
    }

    #[test]
    fn bounding_union_ignores_empty() {
        let a = UpdateRegion::new(0, 0, 10, 10);
        let empty = UpdateRegion::default();
        assert_eq!(a.bounding_union(&empty), a);
        assert_eq!(empty.bounding_union(&a), a);
        assert_eq!(
            a.bounding_union(&UpdateRegion::new(20, 5, 30, 40)),
            UpdateRegion::new(0, 0, 30, 40)
        );
    }

    #[test]
    fn from_xywh_and_display() {
        let r = UpdateRegion::from_xywh(10, 20, 30, 40);
        assert_eq!(r, UpdateRegion::new(10, 20, 40, 60));
        assert_eq!(r.to_string(), "30x40+10+20");
        assert_eq!(r.translate(-10, 5), UpdateRegion::new(0, 25, 30, 65));
    }

    #[test]
    fn extents_beyond_i32_range() {
        let r = UpdateRegion::new(-2_000_000_000, 0, 2_000_000_000, 100);
        assert_eq!(r.width(), 4_000_000_000);
        assert_eq!(r.area(), 400_000_000_000);

        let full = UpdateRegion::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(full.width(), u32::MAX);
        assert_eq!(full.area(), u32::MAX as u64 * u32::MAX as u64);
        assert_eq!(full.translate(10, 0).x2, i32::MAX);
    }
}
