//! The render callback consumed by the backing store.
//!
//! The backing store never paints anything itself. Whenever it needs storage or pixels it calls
//! back into an [`Updater`], which the embedder implements on top of whatever rasterizer and
//! storage it uses (CPU memory, a GL texture, ...).

use crate::buffer::Buffer;
use crate::region::UpdateRegion;
use serde::{Deserialize, Serialize};

/// Quality hint passed along with each render request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateQuality {
    Low,
    #[default]
    High,
}

impl UpdateQuality {
    /// Maps the raw value of the `QUALITY` parameter. `0` is low quality, anything else high.
    pub fn from_raw(value: i32) -> Self {
        if value == 0 {
            UpdateQuality::Low
        } else {
            UpdateQuality::High
        }
    }

    pub fn raw(&self) -> i32 {
        match self {
            UpdateQuality::Low => 0,
            UpdateQuality::High => 1,
        }
    }
}

/// Interface the backing store uses to obtain buffers and get pixels into them.
///
/// All calls happen synchronously from within `BackingStore::update()` on the caller's thread.
pub trait Updater {
    /// Supplies a new buffer of exactly `width` x `height` pixels.
    fn create_buffer(&mut self, width: u32, height: u32) -> anyhow::Result<Box<dyn Buffer>>;

    /// Moves the rectangle `(x, y, width, height)` inside `buffer` by `(dx, dy)`. The content of
    /// the area that is vacated by the move is undefined afterwards.
    ///
    /// `(dx, dy)` is the shift of the pixels inside the buffer, the opposite of the viewport
    /// movement: scrolling the viewport down by 50 moves the content up, `dy = -50`.
    #[allow(clippy::too_many_arguments)]
    fn in_place_scroll(
        &mut self,
        buffer: &mut dyn Buffer,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        dx: i32,
        dy: i32,
    );

    /// Renders the document content of `region` (scaled document space) at
    /// `(buffer_x, buffer_y)` in `buffer`.
    ///
    /// `existing_region` is true when the region already held valid content that is being
    /// redrawn (content change or quality upgrade), false when it is newly exposed.
    fn render_to_backing_store_region(
        &mut self,
        buffer: &mut dyn Buffer,
        buffer_x: i32,
        buffer_y: i32,
        region: &UpdateRegion,
        quality: UpdateQuality,
        existing_region: bool,
    );
}
