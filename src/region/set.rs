use crate::region::UpdateRegion;

/// A set of pairwise disjoint rectangles.
///
/// Used to track which parts of a tile hold valid (or dirty, or low quality) pixels. The
/// representation is not canonical: the same area may be split differently depending on
/// insertion order. Queries only rely on coverage, never on the exact split.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionSet {
    rects: Vec<UpdateRegion>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_region(region: UpdateRegion) -> Self {
        let mut set = Self::new();
        set.add(region);
        set
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn rects(&self) -> &[UpdateRegion] {
        &self.rects
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Total covered area.
    pub fn area(&self) -> u64 {
        self.rects.iter().map(|r| r.area()).sum()
    }

    /// Bounding box of everything in the set, `None` when empty.
    pub fn bounds(&self) -> Option<UpdateRegion> {
        self.rects.iter().copied().reduce(|acc, r| acc.bounding_union(&r))
    }

    /// Adds `region` to the set, keeping the rectangles disjoint.
    pub fn add(&mut self, region: UpdateRegion) {
        if region.is_empty() {
            return;
        }

        let mut pieces = vec![region];
        for existing in &self.rects {
            pieces = pieces.into_iter().flat_map(|p| p.subtract(existing)).collect();
            if pieces.is_empty() {
                return;
            }
        }

        self.rects.extend(pieces);
        self.coalesce();
    }

    pub fn add_set(&mut self, other: &RegionSet) {
        for r in &other.rects {
            self.add(*r);
        }
    }

    /// Removes `region` from the set.
    pub fn subtract(&mut self, region: &UpdateRegion) {
        if region.is_empty() || self.rects.is_empty() {
            return;
        }

        let rects = std::mem::take(&mut self.rects);
        self.rects = rects.into_iter().flat_map(|r| r.subtract(region)).collect();
        self.coalesce();
    }

    pub fn subtract_set(&mut self, other: &RegionSet) {
        for r in &other.rects {
            self.subtract(r);
        }
    }

    /// Keeps only the part of the set inside `region`.
    pub fn clip(&mut self, region: &UpdateRegion) {
        self.rects = self
            .rects
            .iter()
            .map(|r| r.intersect(region))
            .filter(|r| !r.is_empty())
            .collect();
    }

    /// Returns the part of the set inside `region` without modifying the set.
    pub fn intersection(&self, region: &UpdateRegion) -> RegionSet {
        let mut out = self.clone();
        out.clip(region);
        out
    }

    /// Returns the part of `region` that is NOT covered by this set.
    pub fn uncovered(&self, region: &UpdateRegion) -> RegionSet {
        let mut out = RegionSet::from_region(*region);
        out.subtract_set(self);
        out
    }

    /// Area of `region` covered by this set.
    pub fn covered_area(&self, region: &UpdateRegion) -> u64 {
        self.rects.iter().map(|r| r.intersect(region).area()).sum()
    }

    /// Returns true when every point of `region` is in the set.
    pub fn covers(&self, region: &UpdateRegion) -> bool {
        self.covered_area(region) == region.area()
    }

    // Merges rectangles that share a full edge. Keeps fragmentation low when strips are
    // rendered one after another.
    fn coalesce(&mut self) {
        let mut merged = true;
        while merged {
            merged = false;
            'outer: for i in 0..self.rects.len() {
                for j in (i + 1)..self.rects.len() {
                    if let Some(m) = merge_adjacent(&self.rects[i], &self.rects[j]) {
                        self.rects[i] = m;
                        self.rects.swap_remove(j);
                        merged = true;
                        break 'outer;
                    }
                }
            }
        }
    }
}

fn merge_adjacent(a: &UpdateRegion, b: &UpdateRegion) -> Option<UpdateRegion> {
    if a.x1 == b.x1 && a.x2 == b.x2 && (a.y2 == b.y1 || b.y2 == a.y1) {
        return Some(UpdateRegion::new(a.x1, a.y1.min(b.y1), a.x2, a.y2.max(b.y2)));
    }
    if a.y1 == b.y1 && a.y2 == b.y2 && (a.x2 == b.x1 || b.x2 == a.x1) {
        return Some(UpdateRegion::new(a.x1.min(b.x1), a.y1, a.x2.max(b.x2), a.y2));
    }
    None
}
