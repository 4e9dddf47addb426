use crate::buffer::OwnedBuffer;
use crate::region::{RegionSet, UpdateRegion};
use crate::updater::UpdateQuality;

/// Regular grid of tiles, anchored at a document position.
///
/// Cell indices are `i64`: with the anchor following the viewport, a target can lie more than
/// `i32::MAX` pixels away from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TileGrid {
    pub(crate) anchor_x: i32,
    pub(crate) anchor_y: i32,
    pub(crate) tile_width: u32,
    pub(crate) tile_height: u32,
}

impl TileGrid {
    /// Document region of cell `(col, row)`, `None` when it does not fit the coordinate range.
    pub(crate) fn cell_rect(&self, col: i64, row: i64) -> Option<UpdateRegion> {
        let x1 = col.checked_mul(self.tile_width as i64)?.checked_add(self.anchor_x as i64)?;
        let y1 = row.checked_mul(self.tile_height as i64)?.checked_add(self.anchor_y as i64)?;
        let x2 = x1.checked_add(self.tile_width as i64)?;
        let y2 = y1.checked_add(self.tile_height as i64)?;

        Some(UpdateRegion::new(
            i32::try_from(x1).ok()?,
            i32::try_from(y1).ok()?,
            i32::try_from(x2).ok()?,
            i32::try_from(y2).ok()?,
        ))
    }

    /// Grid cells intersecting `region`, nearest to the region's center first. Cells outside
    /// the coordinate range are left out.
    pub(crate) fn cells_for(&self, region: &UpdateRegion) -> Vec<(i64, i64)> {
        if region.is_empty() {
            return Vec::new();
        }

        let tw = self.tile_width as i64;
        let th = self.tile_height as i64;
        let ax = self.anchor_x as i64;
        let ay = self.anchor_y as i64;
        let col_start = (region.x1 as i64 - ax).div_euclid(tw);
        let col_end = (region.x2 as i64 - 1 - ax).div_euclid(tw);
        let row_start = (region.y1 as i64 - ay).div_euclid(th);
        let row_end = (region.y2 as i64 - 1 - ay).div_euclid(th);

        let (cx, cy) = center(region);
        let mut cells = Vec::new();
        for row in row_start..=row_end {
            for col in col_start..=col_end {
                if let Some(rect) = self.cell_rect(col, row) {
                    let (tx, ty) = center(&rect);
                    cells.push(((tx - cx).abs() + (ty - cy).abs(), row, col));
                }
            }
        }

        cells.sort_unstable();
        cells.into_iter().map(|(_, row, col)| (col, row)).collect()
    }
}

/// Doubled center so it stays integral.
pub(crate) fn center(region: &UpdateRegion) -> (i64, i64) {
    (
        region.x1 as i64 + region.x2 as i64,
        region.y1 as i64 + region.y2 as i64,
    )
}

/// One buffer and the part of the document it caches.
///
/// `valid`, `dirty` and `low_quality` are in document coordinates and always inside `rect`;
/// `dirty` and `low_quality` are subsets of `valid`.
#[derive(Debug)]
pub(crate) struct Tile {
    pub(crate) col: i64,
    pub(crate) row: i64,
    /// Document region mapped onto the buffer's `(0, 0)..(width, height)`.
    pub(crate) rect: UpdateRegion,
    pub(crate) buffer: OwnedBuffer,
    /// Content that reflects the document as of its last render or scroll.
    pub(crate) valid: RegionSet,
    /// Valid content scheduled for an existing-region redraw.
    pub(crate) dirty: RegionSet,
    /// Valid content rendered with [`UpdateQuality::Low`].
    pub(crate) low_quality: RegionSet,
}

impl Tile {
    pub(crate) fn new(col: i64, row: i64, rect: UpdateRegion, buffer: OwnedBuffer) -> Self {
        Self {
            col,
            row,
            rect,
            buffer,
            valid: RegionSet::new(),
            dirty: RegionSet::new(),
            low_quality: RegionSet::new(),
        }
    }

    /// Buffer position of a document point.
    pub(crate) fn to_buffer(&self, x: i32, y: i32) -> (i32, i32) {
        (x - self.rect.x1, y - self.rect.y1)
    }

    pub(crate) fn clear_validity(&mut self) {
        self.valid.clear();
        self.dirty.clear();
        self.low_quality.clear();
    }

    /// Points the tile at another grid cell. Its pixels mean nothing there.
    pub(crate) fn reassign(&mut self, col: i64, row: i64, rect: UpdateRegion) {
        self.col = col;
        self.row = row;
        self.rect = rect;
        self.clear_validity();
    }

    /// Records that `region` was just rendered.
    pub(crate) fn mark_rendered(&mut self, region: &UpdateRegion, quality: UpdateQuality) {
        debug_assert!(self.rect.contains(region), "render outside tile: {region:?} / {:?}", self.rect);

        self.valid.add(*region);
        self.dirty.subtract(region);
        match quality {
            UpdateQuality::Low => self.low_quality.add(*region),
            UpdateQuality::High => self.low_quality.subtract(region),
        }
    }

    /// Marks the valid content inside `region` for redraw.
    pub(crate) fn mark_dirty(&mut self, region: &UpdateRegion) {
        let stale = self.valid.intersection(region);
        self.dirty.add_set(&stale);
    }

    /// Drops dirty content from the valid set.
    pub(crate) fn discard_dirty(&mut self) {
        self.valid.subtract_set(&self.dirty);
        self.low_quality.subtract_set(&self.dirty);
        self.dirty.clear();
    }

    /// Moves the tile to `rect`, a cell of the same size, while keeping the pixels that remain
    /// inside it.
    ///
    /// Returns the rectangle (in buffer coordinates, before the move) that has to be shifted
    /// inside the buffer, together with the shift. `None` when nothing is worth keeping.
    pub(crate) fn shift_to(&mut self, rect: UpdateRegion) -> Option<(UpdateRegion, i32, i32)> {
        let old = self.rect;
        self.rect = rect;
        self.valid.clip(&rect);
        self.dirty.clip(&rect);
        self.low_quality.clip(&rect);

        // kept lies in both cells, so every offset below is less than a tile size
        let kept = self.valid.bounds()?;
        let source = UpdateRegion::new(kept.x1 - old.x1, kept.y1 - old.y1, kept.x2 - old.x1, kept.y2 - old.y1);
        Some((source, old.x1 - rect.x1, old.y1 - rect.y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(anchor_x: i32, anchor_y: i32, w: u32, h: u32) -> TileGrid {
        TileGrid {
            anchor_x,
            anchor_y,
            tile_width: w,
            tile_height: h,
        }
    }

    #[test]
    fn aligned_region_hits_one_cell() {
        let g = grid(0, 0, 200, 200);
        assert_eq!(g.cells_for(&UpdateRegion::new(0, 0, 200, 200)), vec![(0, 0)]);
        assert_eq!(g.cell_rect(1, 2), Some(UpdateRegion::new(200, 400, 400, 600)));
    }

    #[test]
    fn unaligned_region_hits_neighbours_nearest_first() {
        let g = grid(0, 0, 200, 200);
        let cells = g.cells_for(&UpdateRegion::new(0, 50, 200, 250));
        assert_eq!(cells, vec![(0, 0), (0, 1)]);

        let cells = g.cells_for(&UpdateRegion::new(150, 150, 350, 350));
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0], (1, 1));
    }

    #[test]
    fn negative_offsets_use_floor_division() {
        let g = grid(100, 100, 50, 50);
        assert_eq!(g.cells_for(&UpdateRegion::new(60, 60, 100, 100)), vec![(-1, -1)]);
        assert_eq!(g.cell_rect(-1, -1), Some(UpdateRegion::new(50, 50, 100, 100)));
    }

    #[test]
    fn far_anchors_do_not_overflow() {
        let g = grid(i32::MIN, 0, 200, 200);
        let cells = g.cells_for(&UpdateRegion::new(0, 0, 100, 100));
        let col = (i32::MIN as i64).abs() / 200;
        assert_eq!(cells, vec![(col, 0)]);
        assert_eq!(g.cell_rect(col, 0), Some(UpdateRegion::new(-48, 0, 152, 200)));

        // cells past the coordinate range are skipped
        let g = grid(i32::MAX - 150, 0, 100, 100);
        assert_eq!(g.cells_for(&UpdateRegion::new(i32::MAX - 150, 0, i32::MAX, 10)), vec![(0, 0)]);
        assert_eq!(g.cell_rect(1, 0), None);
        assert_eq!(g.cell_rect(i64::MAX, 0), None);
    }

    #[test]
    fn shifting_keeps_the_overlap() {
        let g = grid(0, 0, 200, 200);
        let mut tile = Tile::new(0, 0, g.cell_rect(0, 0).unwrap(), dummy_buffer());
        tile.mark_rendered(&UpdateRegion::new(0, 0, 200, 200), UpdateQuality::High);

        let moved = tile.shift_to(UpdateRegion::new(0, 50, 200, 250));
        assert_eq!(moved, Some((UpdateRegion::new(0, 50, 200, 200), 0, -50)));
        assert!(tile.valid.covers(&UpdateRegion::new(0, 50, 200, 200)));
        assert_eq!(tile.valid.area(), 200 * 150);
    }

    #[test]
    fn shifting_across_the_coordinate_range() {
        let mut tile = Tile::new(0, 0, UpdateRegion::new(i32::MIN, 0, i32::MIN + 100, 100), dummy_buffer());
        tile.mark_rendered(&UpdateRegion::new(i32::MIN, 0, i32::MIN + 100, 100), UpdateQuality::High);

        let moved = tile.shift_to(UpdateRegion::new(i32::MIN + 30, 0, i32::MIN + 130, 100));
        assert_eq!(moved, Some((UpdateRegion::new(30, 0, 100, 100), -30, 0)));

        assert_eq!(tile.shift_to(UpdateRegion::new(i32::MAX - 100, 0, i32::MAX, 100)), None);
    }

    #[test]
    fn shifting_far_away_keeps_nothing() {
        let mut tile = Tile::new(0, 0, UpdateRegion::new(0, 0, 100, 100), dummy_buffer());
        tile.mark_rendered(&UpdateRegion::new(0, 0, 100, 100), UpdateQuality::Low);

        assert_eq!(tile.shift_to(UpdateRegion::new(0, 500, 100, 600)), None);
        assert!(tile.valid.is_empty());
        assert!(tile.low_quality.is_empty());
    }

    #[test]
    fn discard_dirty_drops_stale_content() {
        let mut tile = Tile::new(0, 0, UpdateRegion::new(0, 0, 100, 100), dummy_buffer());
        tile.mark_rendered(&UpdateRegion::new(0, 0, 100, 100), UpdateQuality::High);
        tile.mark_dirty(&UpdateRegion::new(0, 0, 100, 40));
        tile.mark_rendered(&UpdateRegion::new(0, 0, 100, 20), UpdateQuality::High);

        tile.discard_dirty();
        assert!(tile.valid.covers(&UpdateRegion::new(0, 0, 100, 20)));
        assert!(tile.valid.covers(&UpdateRegion::new(0, 40, 100, 100)));
        assert_eq!(tile.valid.area(), 100 * 80);
    }

    fn dummy_buffer() -> OwnedBuffer {
        use crate::render::backends::null::NullUpdater;
        use crate::Updater;

        let mut updater = NullUpdater::new();
        OwnedBuffer::new(updater.create_buffer(100, 100).unwrap(), 100, 100)
    }
}
