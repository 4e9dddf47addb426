//! The backing store contract and its tiled implementation.
//!
//! A backing store caches rendered document pixels in buffers supplied by an
//! [`Updater`](crate::Updater). Callers drive it in three steps:
//!
//! 1. [`BackingStore::update`] makes (part of) the document valid, reusing cached pixels where
//!    possible and asking the updater to scroll or render the rest.
//! 2. [`BackingStore::can_draw_region`] tells whether a region can be composited.
//! 3. [`BackingStore::begin_draw_region`] lists the buffer rectangles to copy to the screen.
//!
//! # Example
//!
//! ```
//! use gosub_backing_store::render::backends::null::NullUpdater;
//! use gosub_backing_store::{
//!     create_backing_store, ContentSize, RegionAvailability, UpdateMode, UpdateRegion, Viewport,
//! };
//!
//! let mut store = create_backing_store(Box::new(NullUpdater::new()));
//! let viewport = Viewport::new(0, 0, 200, 200);
//!
//! assert!(store.update(None, UpdateMode::All, viewport, ContentSize::new(1000, 1000), true));
//! assert_eq!(
//!     store.can_draw_region(&UpdateRegion::new(0, 0, 200, 200)),
//!     RegionAvailability::FullyAvailable
//! );
//!
//! let tiles = store.begin_draw_region(&viewport.as_region(), viewport.x, viewport.y).count();
//! assert_eq!(tiles, 1);
//! store.cleanup();
//! ```

use crate::config::Param;
use crate::region::UpdateRegion;
use crate::render::{ContentSize, Viewport};
use crate::updater::Updater;
use serde::{Deserialize, Serialize};

mod draw;
mod tile;
mod tiled;
mod update;

#[cfg(test)]
mod testing;

pub use draw::{DrawRegion, DrawRegionIter};
pub use tiled::{StoreId, TiledBackingStore};

/// First raw update mode id reserved for extensions.
pub const UPDATE_MODE_EXTENSIONS_START: u32 = 0x10000;

/// What an update should bring up to date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateMode {
    /// Both the exposed region and existing content inside the target. Existing content is
    /// redrawn when it is stale (content changed) or was rendered at a lower quality.
    All,
    /// Only the exposed region.
    ExposedOnly,
    /// Extension mode, handled like [`UpdateMode::ExposedOnly`].
    Extension(u32),
}

impl UpdateMode {
    /// Maps a raw update mode id. Returns `None` for unknown ids below the extension range.
    pub fn from_raw(id: u32) -> Option<UpdateMode> {
        match id {
            0 => Some(UpdateMode::All),
            1 => Some(UpdateMode::ExposedOnly),
            id if id >= UPDATE_MODE_EXTENSIONS_START => Some(UpdateMode::Extension(id)),
            _ => None,
        }
    }

    fn redraws_existing(&self) -> bool {
        matches!(self, UpdateMode::All)
    }
}

/// Answer of [`BackingStore::can_draw_region`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionAvailability {
    NotAvailable,
    FullyAvailable,
    PartiallyAvailable,
}

/// A cached, incrementally updated pixel representation of a document.
///
/// All methods are called from one thread. Callers that share a store between threads must
/// serialize every call themselves.
pub trait BackingStore {
    /// Sets a parameter. Extension parameters are stored and otherwise ignored.
    fn set_param(&mut self, param: Param, value: i32);

    /// Releases every buffer. The store is unusable afterwards; calling this again is a no-op.
    fn cleanup(&mut self);

    /// Returns true when an unrecoverable error occurred and the store should not be used.
    fn check_error(&self) -> bool;

    /// Returns true when some region holds valid content.
    fn has_content(&self) -> bool;

    /// Drops all validity. Buffers are kept for reuse.
    fn invalidate(&mut self);

    /// Stops any pending incremental update. Content known to be stale stops being valid.
    fn finish(&mut self);

    /// Updates the backing store.
    ///
    /// `target` is the region to update in scaled document coordinates and may not exceed the
    /// viewport size; when `None` the store picks the region itself. `content_changed` is a hint
    /// that the document changed since the last update.
    ///
    /// Returns true when the target is fully available afterwards.
    fn update(
        &mut self,
        target: Option<UpdateRegion>,
        mode: UpdateMode,
        viewport: Viewport,
        content: ContentSize,
        content_changed: bool,
    ) -> bool;

    /// Tells how much of `requested` can be drawn from valid content.
    fn can_draw_region(&self, requested: &UpdateRegion) -> RegionAvailability;

    /// Bounding box of the drawable part of `requested`, if any.
    fn drawable_bounds(&self, requested: &UpdateRegion) -> Option<UpdateRegion>;

    /// Lists the buffer rectangles needed to draw `region` onto a screen whose top-left corner
    /// is at `(viewport_x, viewport_y)` in document coordinates.
    fn begin_draw_region(&self, region: &UpdateRegion, viewport_x: i32, viewport_y: i32) -> DrawRegionIter<'_>;
}

/// Creates a backing store that renders through `updater`.
pub fn create_backing_store(updater: Box<dyn Updater>) -> Box<dyn BackingStore> {
    Box::new(TiledBackingStore::new(updater))
}
