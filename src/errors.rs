use crate::region::UpdateRegion;

/// Internal failures of the backing store.
///
/// These never cross the public [`BackingStore`](crate::BackingStore) surface: the store
/// downgrades availability, logs the error and, for repeated buffer failures, raises the
/// flag reported by `check_error()`.
#[derive(Debug, thiserror::Error)]
pub enum BackingStoreError {
    #[error("Buffer creation failed ({width}x{height}): {source}")]
    BufferCreation {
        width: u32,
        height: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("Buffer limit of {0} reached and no buffer can be reclaimed")]
    BufferLimitReached(usize),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Update region {0:?} lies outside the content")]
    RegionOutOfBounds(UpdateRegion),

    #[error("Backing store is in an error state")]
    Failed,

    #[error("Backing store has been cleaned up")]
    Terminated,
}
