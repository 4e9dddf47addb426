//! Tiled backing store for scrolling document views.
//!
//! The store keeps rendered document content in buffers it obtains from an [`Updater`], reuses
//! those pixels on scroll and tells the compositor which buffer rectangles to put on screen.

pub mod buffer;
pub mod config;
pub mod errors;
pub mod region;
pub mod render;
pub mod store;
pub mod updater;

pub use buffer::Buffer;
pub use config::{BackingStoreConfig, Param};
pub use errors::BackingStoreError;
pub use region::{RegionSet, UpdateRegion};
pub use render::{ContentSize, Viewport};
pub use store::{
    create_backing_store, BackingStore, DrawRegion, DrawRegionIter, RegionAvailability, StoreId, TiledBackingStore,
    UpdateMode,
};
pub use updater::{UpdateQuality, Updater};
