//! The update engine.
//!
//! An update runs in four steps:
//!
//! 1. clamp the target to the viewport size and the content,
//! 2. bring the tile grid in line with the viewport: drop everything on a zoom (content size
//!    change) or tile size change, and with in-place scrolling move the grid along with the
//!    viewport, shifting retained pixels inside their buffers,
//! 3. plan render jobs for every grid cell touching the target, obtaining buffers on the way,
//! 4. run the jobs, newly exposed content first, within the partial render budget.

use crate::buffer::OwnedBuffer;
use crate::errors::BackingStoreError;
use crate::region::UpdateRegion;
use crate::render::{ContentSize, Viewport};
use crate::store::tile::{center, Tile, TileGrid};
use crate::store::{BackingStore, RegionAvailability, TiledBackingStore, UpdateMode};
use crate::updater::UpdateQuality;

/// A single render request planned by an update.
#[derive(Debug)]
struct RenderJob {
    tile: usize,
    region: UpdateRegion,
    existing: bool,
}

impl TiledBackingStore {
    pub(crate) fn try_update(
        &mut self,
        target: Option<UpdateRegion>,
        mode: UpdateMode,
        viewport: Viewport,
        content: ContentSize,
        content_changed: bool,
    ) -> Result<bool, BackingStoreError> {
        if self.terminated {
            return Err(BackingStoreError::Terminated);
        }
        if self.failed {
            return Err(BackingStoreError::Failed);
        }
        if viewport.is_empty() {
            return Err(BackingStoreError::InvalidGeometry(format!("{viewport:?} is empty")));
        }
        if content.is_empty() {
            return Err(BackingStoreError::InvalidGeometry(format!("{content:?} is empty")));
        }
        let (tile_width, tile_height) = self.tile_size(&viewport);
        let limit = i32::MAX as u32;
        if viewport.width > limit || viewport.height > limit || tile_width > limit || tile_height > limit {
            return Err(BackingStoreError::InvalidGeometry(format!(
                "{viewport:?} with {tile_width}x{tile_height} tiles exceeds the coordinate range"
            )));
        }

        let target = self.resolve_target(target, &viewport, &content)?;

        self.sync_content(content);
        self.sync_grid(&viewport);

        if mode.redraws_existing() && content_changed {
            for tile in &mut self.tiles {
                tile.mark_dirty(&target);
            }
        }

        let jobs = self.plan(&target, mode);
        self.run(jobs);

        Ok(self.can_draw_region(&target) == RegionAvailability::FullyAvailable)
    }

    /// Picks the region to update: the requested one (or the viewport), cut down to the
    /// viewport size and clipped to the content.
    fn resolve_target(
        &self,
        target: Option<UpdateRegion>,
        viewport: &Viewport,
        content: &ContentSize,
    ) -> Result<UpdateRegion, BackingStoreError> {
        let requested = target.unwrap_or_else(|| viewport.as_region());

        let mut region = requested;
        if region.width() > viewport.width || region.height() > viewport.height {
            region = UpdateRegion::from_xywh(
                region.x1,
                region.y1,
                region.width().min(viewport.width),
                region.height().min(viewport.height),
            );
            log::debug!(
                "BackingStore[{}]: target {requested:?} exceeds the viewport, clamped to {region:?}",
                self.id()
            );
        }

        let region = region.intersect(&content.as_region());
        if region.is_empty() {
            return Err(BackingStoreError::RegionOutOfBounds(requested));
        }

        Ok(region)
    }

    /// A new content size means a new zoom level: none of the cached pixels match anymore.
    fn sync_content(&mut self, content: ContentSize) {
        if let Some(previous) = self.content {
            if previous != content {
                log::debug!(
                    "BackingStore[{}]: content resized {}x{} → {}x{}, dropping cached content",
                    self.id(),
                    previous.width,
                    previous.height,
                    content.width,
                    content.height
                );
                for tile in &mut self.tiles {
                    tile.clear_validity();
                }
                self.pending = false;
            }
        }
        self.content = Some(content);
    }

    /// Configured tile size, with `0` standing for the viewport size.
    fn tile_size(&self, viewport: &Viewport) -> (u32, u32) {
        let width = if self.config.tile_width == 0 { viewport.width } else { self.config.tile_width };
        let height = if self.config.tile_height == 0 { viewport.height } else { self.config.tile_height };
        (width, height)
    }

    /// The grid moves along with the viewport only while one tile spans the whole viewport.
    /// Smaller tiles stay put in document space, so content scrolled into a neighbouring cell
    /// is found in that cell's tile instead of being dropped.
    fn follows_viewport(&self, tile_width: u32, tile_height: u32, viewport: &Viewport) -> bool {
        self.config.allow_in_place_scroll && tile_width >= viewport.width && tile_height >= viewport.height
    }

    fn sync_grid(&mut self, viewport: &Viewport) {
        let (tile_width, tile_height) = self.tile_size(viewport);
        let follows = self.follows_viewport(tile_width, tile_height, viewport);

        let same_size = self
            .grid
            .is_some_and(|g| g.tile_width == tile_width && g.tile_height == tile_height);
        if !same_size {
            self.release_tiles();
            self.pending = false;

            let (anchor_x, anchor_y) = if follows {
                (viewport.x, viewport.y)
            } else {
                (0, 0)
            };
            self.grid = Some(TileGrid {
                anchor_x,
                anchor_y,
                tile_width,
                tile_height,
            });
        }

        // Buffers allocated before a texture coordinate change have the wrong size.
        let allocation = self.allocation_size(tile_width, tile_height);
        if self.tiles.iter().any(|t| t.buffer.size() != allocation) {
            self.release_tiles();
            self.pending = false;
        }

        if follows {
            self.scroll_grid_to(viewport.x, viewport.y);
        }
    }

    fn allocation_size(&self, width: u32, height: u32) -> (u32, u32) {
        if self.config.allow_texture_coordinate {
            (width.next_power_of_two(), height.next_power_of_two())
        } else {
            (width, height)
        }
    }

    /// Moves the grid anchor to `(x, y)`, shifting what stays visible inside each buffer.
    fn scroll_grid_to(&mut self, x: i32, y: i32) {
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        if grid.anchor_x == x && grid.anchor_y == y {
            return;
        }

        grid.anchor_x = x;
        grid.anchor_y = y;
        let grid = *grid;

        let updater = &mut self.updater;
        let mut scrolled = 0;
        let mut dropped = 0;
        // tiles whose cell left the coordinate range are released
        self.tiles.retain_mut(|tile| {
            let Some(rect) = grid.cell_rect(tile.col, tile.row) else {
                dropped += 1;
                return false;
            };
            if let Some((source, dx, dy)) = tile.shift_to(rect) {
                if let Some(buffer) = tile.buffer.get_mut() {
                    updater.in_place_scroll(buffer, source.x1, source.y1, source.width(), source.height(), dx, dy);
                    scrolled += 1;
                }
            }
            true
        });

        log::debug!(
            "BackingStore[{}]: grid moved to ({x}, {y}), {scrolled} buffer(s) scrolled in place, {dropped} dropped",
            self.id()
        );
    }

    fn plan(&mut self, target: &UpdateRegion, mode: UpdateMode) -> Vec<RenderJob> {
        let Some(grid) = self.grid else {
            return Vec::new();
        };

        let cells = grid.cells_for(target);
        let mut exposed = Vec::new();
        let mut existing = Vec::new();

        for &(col, row) in &cells {
            let existing_tile = self.tiles.iter().position(|t| t.col == col && t.row == row);
            let index = match existing_tile {
                Some(index) => index,
                None => match self.obtain_tile(&grid, col, row, &cells, target) {
                    Ok(index) => index,
                    Err(e) => {
                        log::warn!("BackingStore[{}]: cell ({col}, {row}) left uncovered: {e}", self.id());
                        if self.failed {
                            break;
                        }
                        continue;
                    }
                },
            };

            let tile = &self.tiles[index];
            let wanted = tile.rect.intersect(target);

            for region in tile.valid.uncovered(&wanted).rects() {
                exposed.push(RenderJob {
                    tile: index,
                    region: *region,
                    existing: false,
                });
            }

            if mode.redraws_existing() {
                let mut stale = tile.dirty.intersection(&wanted);
                if self.config.quality == UpdateQuality::High {
                    stale.add_set(&tile.low_quality.intersection(&wanted));
                }
                for region in stale.rects() {
                    existing.push(RenderJob {
                        tile: index,
                        region: *region,
                        existing: true,
                    });
                }
            }
        }

        exposed.extend(existing);
        exposed
    }

    /// Finds a buffer for grid cell `(col, row)`: an idle empty tile, a fresh buffer while below
    /// the limit, or the tile farthest from the target that the target does not need.
    fn obtain_tile(
        &mut self,
        grid: &TileGrid,
        col: i64,
        row: i64,
        needed: &[(i64, i64)],
        target: &UpdateRegion,
    ) -> Result<usize, BackingStoreError> {
        let rect = grid
            .cell_rect(col, row)
            .ok_or_else(|| BackingStoreError::InvalidGeometry(format!("cell ({col}, {row}) is out of range")))?;
        let idle = |t: &Tile| !needed.contains(&(t.col, t.row));

        if let Some(index) = self.tiles.iter().position(|t| idle(t) && t.valid.is_empty()) {
            self.tiles[index].reassign(col, row, rect);
            return Ok(index);
        }

        if self.tiles.len() < self.config.max_buffers {
            let (width, height) = self.allocation_size(grid.tile_width, grid.tile_height);
            return match self.updater.create_buffer(width, height) {
                Ok(handle) => {
                    self.consecutive_failures = 0;
                    self.tiles
                        .push(Tile::new(col, row, rect, OwnedBuffer::new(handle, width, height)));
                    log::debug!(
                        "BackingStore[{}]: created {width}x{height} buffer for {rect:?}",
                        self.id()
                    );
                    Ok(self.tiles.len() - 1)
                }
                Err(source) => {
                    self.consecutive_failures += 1;
                    if self.consecutive_failures >= self.config.buffer_failure_limit {
                        self.failed = true;
                        log::error!(
                            "BackingStore[{}]: {} consecutive buffer creation failures, giving up",
                            self.id(),
                            self.consecutive_failures
                        );
                    }
                    Err(BackingStoreError::BufferCreation { width, height, source })
                }
            };
        }

        let (cx, cy) = center(target);
        let victim = self
            .tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| idle(*t))
            .max_by_key(|(_, t)| {
                let (tx, ty) = center(&t.rect);
                (tx - cx).abs() + (ty - cy).abs()
            })
            .map(|(index, _)| index);

        match victim {
            Some(index) => {
                log::debug!(
                    "BackingStore[{}]: reusing buffer of {:?} for {rect:?}",
                    self.id(),
                    self.tiles[index].rect
                );
                self.tiles[index].reassign(col, row, rect);
                Ok(index)
            }
            None => Err(BackingStoreError::BufferLimitReached(self.config.max_buffers)),
        }
    }

    fn run(&mut self, jobs: Vec<RenderJob>) {
        let budget = self.config.render_budget();
        let quality = self.config.quality;
        let total = jobs.len();
        let mut done = 0;

        for job in jobs {
            if budget.is_some_and(|budget| done >= budget) {
                break;
            }

            let tile = &mut self.tiles[job.tile];
            let (buffer_x, buffer_y) = tile.to_buffer(job.region.x1, job.region.y1);
            let Some(buffer) = tile.buffer.get_mut() else {
                continue;
            };

            self.updater
                .render_to_backing_store_region(buffer, buffer_x, buffer_y, &job.region, quality, job.existing);
            tile.mark_rendered(&job.region, quality);
            done += 1;
        }

        self.pending = done < total;
        if total > 0 {
            log::debug!(
                "BackingStore[{}]: rendered {done}/{total} region(s){}",
                self.id(),
                if self.pending { ", update pending" } else { "" }
            );
        }
    }
}
