use crate::config::{BackingStoreConfig, Param};
use crate::region::UpdateRegion;
use crate::render::{ContentSize, Viewport};
use crate::store::draw::{DrawRegion, DrawRegionIter};
use crate::store::tile::{Tile, TileGrid};
use crate::store::{BackingStore, RegionAvailability, UpdateMode};
use crate::updater::Updater;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

/// A unique identifier for a backing store, used to tell stores apart in logs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId(Uuid);

impl StoreId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backing store that caches the document in a grid of equally sized tiles.
///
/// Tiles are viewport sized unless configured otherwise. With in-place scrolling enabled and
/// tiles at least as large as the viewport, the grid follows the viewport and scrolling shifts
/// pixels inside the existing buffers. Otherwise the grid stays put in document space and
/// scrolling brings in neighbouring tiles.
pub struct TiledBackingStore {
    /// ID of the store
    id: StoreId,
    /// Renders and scrolls on our behalf, and supplies the buffers
    pub(crate) updater: Box<dyn Updater>,
    pub(crate) config: BackingStoreConfig,
    pub(crate) tiles: Vec<Tile>,
    /// Grid the tiles are laid out on, `None` until the first update
    pub(crate) grid: Option<TileGrid>,
    /// Content size seen by the last update
    pub(crate) content: Option<ContentSize>,
    /// An incremental update stopped before its target was done
    pub(crate) pending: bool,
    pub(crate) consecutive_failures: u32,
    pub(crate) failed: bool,
    pub(crate) terminated: bool,
}

impl std::fmt::Debug for TiledBackingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiledBackingStore")
            .field("id", &self.id)
            .field("tiles", &self.tiles.len())
            .field("grid", &self.grid)
            .field("content", &self.content)
            .field("pending", &self.pending)
            .field("failed", &self.failed)
            .field("terminated", &self.terminated)
            .finish()
    }
}

impl TiledBackingStore {
    /// Creates a store with the default configuration.
    pub fn new(updater: Box<dyn Updater>) -> Self {
        Self::with_config(updater, BackingStoreConfig::default())
    }

    pub fn with_config(updater: Box<dyn Updater>, config: BackingStoreConfig) -> Self {
        Self {
            id: StoreId::new(),
            updater,
            config,
            tiles: Vec::new(),
            grid: None,
            content: None,
            pending: false,
            consecutive_failures: 0,
            failed: false,
            terminated: false,
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    pub fn config(&self) -> &BackingStoreConfig {
        &self.config
    }

    /// Current value of a parameter.
    pub fn param(&self, param: Param) -> Option<i32> {
        self.config.param(param)
    }

    /// Sets a parameter by raw id. Unknown ids below the extension range are ignored.
    pub fn set_param_raw(&mut self, id: u32, value: i32) {
        match Param::from_raw(id) {
            Some(param) => self.set_param(param, value),
            None => log::warn!("BackingStore[{}]: ignoring unknown parameter {id}", self.id),
        }
    }

    /// Number of buffers currently held.
    pub fn buffer_count(&self) -> usize {
        self.tiles.len()
    }

    /// True when the last update stopped before its target was fully rendered.
    pub fn has_pending_update(&self) -> bool {
        self.pending
    }

    pub(crate) fn release_tiles(&mut self) {
        for tile in &mut self.tiles {
            tile.buffer.release();
        }
        if !self.tiles.is_empty() {
            log::debug!("BackingStore[{}]: released {} buffer(s)", self.id, self.tiles.len());
        }
        self.tiles.clear();
    }

    fn covered_area(&self, requested: &UpdateRegion) -> u64 {
        self.tiles
            .iter()
            .filter(|t| t.rect.intersects(requested))
            .map(|t| t.valid.covered_area(requested))
            .sum()
    }
}

impl BackingStore for TiledBackingStore {
    fn set_param(&mut self, param: Param, value: i32) {
        if self.terminated {
            return;
        }

        if self.config.set_param(param, value) {
            log::debug!("BackingStore[{}]: {param:?} = {value}", self.id);
        }
    }

    fn cleanup(&mut self) {
        if self.terminated {
            return;
        }

        self.release_tiles();
        self.grid = None;
        self.content = None;
        self.pending = false;
        self.terminated = true;
        log::debug!("BackingStore[{}]: cleaned up", self.id);
    }

    fn check_error(&self) -> bool {
        self.failed
    }

    fn has_content(&self) -> bool {
        self.tiles.iter().any(|t| !t.valid.is_empty())
    }

    fn invalidate(&mut self) {
        for tile in &mut self.tiles {
            tile.clear_validity();
        }
        self.pending = false;
    }

    fn finish(&mut self) {
        let stale: u64 = self.tiles.iter().map(|t| t.dirty.area()).sum();
        if !self.pending && stale == 0 {
            return;
        }

        for tile in &mut self.tiles {
            tile.discard_dirty();
        }
        self.pending = false;
        log::debug!("BackingStore[{}]: update finished early, {stale} stale pixel(s) dropped", self.id);
    }

    fn update(
        &mut self,
        target: Option<UpdateRegion>,
        mode: UpdateMode,
        viewport: Viewport,
        content: ContentSize,
        content_changed: bool,
    ) -> bool {
        match self.try_update(target, mode, viewport, content, content_changed) {
            Ok(available) => available,
            Err(e) => {
                log::debug!("BackingStore[{}]: update skipped: {e}", self.id);
                false
            }
        }
    }

    fn can_draw_region(&self, requested: &UpdateRegion) -> RegionAvailability {
        if requested.is_empty() {
            return RegionAvailability::NotAvailable;
        }

        let covered = self.covered_area(requested);
        if covered == 0 {
            RegionAvailability::NotAvailable
        } else if covered == requested.area() {
            RegionAvailability::FullyAvailable
        } else {
            RegionAvailability::PartiallyAvailable
        }
    }

    fn drawable_bounds(&self, requested: &UpdateRegion) -> Option<UpdateRegion> {
        self.tiles
            .iter()
            .filter_map(|t| t.valid.intersection(requested).bounds())
            .reduce(|acc, r| acc.bounding_union(&r))
    }

    fn begin_draw_region(&self, region: &UpdateRegion, viewport_x: i32, viewport_y: i32) -> DrawRegionIter<'_> {
        let mut tiles: Vec<&Tile> = self.tiles.iter().filter(|t| t.rect.intersects(region)).collect();
        tiles.sort_by_key(|t| (t.row, t.col));

        let mut regions = Vec::new();
        for tile in tiles {
            let Some(buffer) = tile.buffer.get() else {
                continue;
            };

            let mut rects: Vec<UpdateRegion> = tile.valid.intersection(region).rects().to_vec();
            rects.sort_by_key(|r| (r.y1, r.x1));

            for r in rects {
                let (src_x, src_y) = tile.to_buffer(r.x1, r.y1);
                regions.push(DrawRegion {
                    buffer,
                    src_x,
                    src_y,
                    dst_x: r.x1.saturating_sub(viewport_x),
                    dst_y: r.y1.saturating_sub(viewport_y),
                    width: r.width(),
                    height: r.height(),
                });
            }
        }

        DrawRegionIter::new(regions)
    }
}

impl Drop for TiledBackingStore {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PARAM_EXTENSIONS_START;
    use crate::store::testing::recording_store;

    const CONTENT: ContentSize = ContentSize {
        width: 1000,
        height: 1000,
    };

    fn r(x1: i32, y1: i32, x2: i32, y2: i32) -> UpdateRegion {
        UpdateRegion::new(x1, y1, x2, y2)
    }

    #[test]
    fn cleanup_releases_every_buffer_once() {
        let config = BackingStoreConfig::default().with_tile_size(100, 100);
        let (mut store, recorder) = recording_store(config);
        assert!(store.update(None, UpdateMode::All, Viewport::new(0, 0, 200, 200), CONTENT, false));
        assert_eq!(store.buffer_count(), 4);

        store.cleanup();
        store.cleanup();
        assert_eq!(recorder.releases(), 4);
        assert_eq!(store.buffer_count(), 0);
        assert!(!store.has_content());

        recorder.clear();
        store.set_param(Param::Priority, 5);
        assert_eq!(store.param(Param::Priority), Some(0));
        assert!(!store.update(None, UpdateMode::All, Viewport::new(0, 0, 200, 200), CONTENT, false));
        assert!(recorder.calls().is_empty());

        drop(store);
        assert_eq!(recorder.releases(), 0);
    }

    #[test]
    fn dropping_the_store_releases_buffers() {
        let (mut store, recorder) = recording_store(BackingStoreConfig::default());
        assert!(store.update(None, UpdateMode::All, Viewport::new(0, 0, 200, 200), CONTENT, false));

        drop(store);
        assert_eq!(recorder.releases(), 1);
    }

    #[test]
    fn fresh_store_has_nothing_to_draw() {
        let (store, recorder) = recording_store(BackingStoreConfig::default());

        assert!(!store.has_content());
        assert!(!store.check_error());
        assert_eq!(store.can_draw_region(&r(0, 0, 10, 10)), RegionAvailability::NotAvailable);
        assert_eq!(store.begin_draw_region(&r(0, 0, 10, 10), 0, 0).count(), 0);
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn empty_requests_are_not_available() {
        let (mut store, _recorder) = recording_store(BackingStoreConfig::default());
        assert!(store.update(None, UpdateMode::All, Viewport::new(0, 0, 200, 200), CONTENT, false));

        assert_eq!(store.can_draw_region(&r(10, 10, 10, 50)), RegionAvailability::NotAvailable);
        assert_eq!(store.drawable_bounds(&r(10, 10, 10, 50)), None);
    }

    #[test]
    fn drawable_bounds_cover_valid_content() {
        let (mut store, _recorder) = recording_store(BackingStoreConfig::default());
        assert!(store.update(
            Some(r(20, 30, 120, 80)),
            UpdateMode::All,
            Viewport::new(0, 0, 200, 200),
            CONTENT,
            false
        ));

        assert_eq!(store.drawable_bounds(&r(0, 0, 200, 200)), Some(r(20, 30, 120, 80)));
        assert_eq!(store.drawable_bounds(&r(100, 0, 300, 50)), Some(r(100, 30, 120, 50)));
        assert_eq!(store.can_draw_region(&r(0, 0, 200, 200)), RegionAvailability::PartiallyAvailable);
        assert_eq!(store.can_draw_region(&r(300, 300, 400, 400)), RegionAvailability::NotAvailable);
    }

    #[test]
    fn draw_regions_are_relative_to_the_viewport() {
        let (mut store, _recorder) = recording_store(BackingStoreConfig::default());
        let vp = Viewport::new(100, 300, 200, 200);
        assert!(store.update(None, UpdateMode::All, vp, CONTENT, false));

        let mut regions = store.begin_draw_region(&r(150, 350, 250, 400), vp.x, vp.y);
        assert_eq!(regions.len(), 1);

        let d = regions.next().unwrap();
        assert_eq!((d.src_x, d.src_y, d.dst_x, d.dst_y, d.width, d.height), (50, 50, 50, 50, 100, 50));
        assert!(regions.next().is_none());
        assert!(regions.next().is_none());
        regions.release();

        // the store is usable again once the sequence is gone
        store.invalidate();
        assert!(!store.has_content());
    }

    #[test]
    fn draw_sequence_can_be_released_early() {
        let config = BackingStoreConfig::default().with_tile_size(100, 100);
        let (mut store, _recorder) = recording_store(config);
        let vp = Viewport::new(0, 0, 200, 200);
        assert!(store.update(None, UpdateMode::All, vp, CONTENT, false));

        let mut regions = store.begin_draw_region(&vp.as_region(), 0, 0);
        assert_eq!(regions.remaining(), 4);
        let first = regions.next().unwrap();
        assert_eq!((first.dst_x, first.dst_y), (0, 0));
        assert_eq!(regions.remaining(), 3);
        regions.release();

        store.cleanup();
    }

    #[test]
    fn raw_params_and_extensions() {
        let (mut store, _recorder) = recording_store(BackingStoreConfig::default());

        store.set_param_raw(2, 7);
        assert_eq!(store.param(Param::Priority), Some(7));

        store.set_param_raw(PARAM_EXTENSIONS_START + 3, -1);
        assert_eq!(store.param(Param::Extension(PARAM_EXTENSIONS_START + 3)), Some(-1));

        // unknown ids change nothing
        let before = store.config().clone();
        store.set_param_raw(99, 1);
        assert_eq!(store.config(), &before);
    }

    #[test]
    fn stores_have_distinct_ids() {
        let (a, _) = recording_store(BackingStoreConfig::default());
        let (b, _) = recording_store(BackingStoreConfig::default());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().to_string().len(), 36);
    }
}
