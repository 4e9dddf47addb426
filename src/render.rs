pub mod backend;

/// Updaters shipped with the crate.
pub mod backends {
    /// CPU memory updater
    pub mod memory;
    pub mod null;
}

pub mod compositor;

mod viewport;

pub use viewport::{ContentSize, Viewport};
