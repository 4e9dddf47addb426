use crate::buffer::Buffer;
use crate::region::UpdateRegion;
use crate::render::backend::StatsHandle;
use crate::updater::{UpdateQuality, Updater};
use std::any::Any;

/// Updater that keeps books but never touches a pixel.
///
/// Useful for driving a backing store where only the bookkeeping matters, such as in tests or
/// when measuring how much work a scroll pattern causes.
#[derive(Debug, Default)]
pub struct NullUpdater {
    stats: StatsHandle,
}

impl NullUpdater {
    /// Creates a new null updater.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> StatsHandle {
        self.stats.clone()
    }
}

impl Updater for NullUpdater {
    fn create_buffer(&mut self, width: u32, height: u32) -> anyhow::Result<Box<dyn Buffer>> {
        if width == 0 || height == 0 {
            anyhow::bail!("NullUpdater cannot create an empty {width}x{height} buffer");
        }

        self.stats.update(|s| s.buffers_created += 1);
        Ok(Box::new(NullBuffer {
            width,
            height,
            frame_id: 0,
            stats: self.stats.clone(),
        }))
    }

    fn in_place_scroll(
        &mut self,
        buffer: &mut dyn Buffer,
        _x: i32,
        _y: i32,
        width: u32,
        height: u32,
        _dx: i32,
        _dy: i32,
    ) {
        if let Some(b) = buffer.as_any_mut().downcast_mut::<NullBuffer>() {
            b.frame_id = b.frame_id.wrapping_add(1);
        }
        self.stats.update(|s| {
            s.scrolls += 1;
            s.pixels_scrolled += width as u64 * height as u64;
        });
    }

    fn render_to_backing_store_region(
        &mut self,
        buffer: &mut dyn Buffer,
        _buffer_x: i32,
        _buffer_y: i32,
        region: &UpdateRegion,
        _quality: UpdateQuality,
        _existing_region: bool,
    ) {
        let Some(b) = buffer.as_any_mut().downcast_mut::<NullBuffer>() else {
            log::warn!("NullUpdater used with a foreign buffer");
            return;
        };

        b.frame_id = b.frame_id.wrapping_add(1);
        self.stats.update(|s| {
            s.renders += 1;
            s.pixels_rendered += region.area();
        });
    }
}

pub struct NullBuffer {
    pub width: u32,
    pub height: u32,
    /// Bumped on every render or scroll into this buffer.
    frame_id: u64,
    stats: StatsHandle,
}

impl NullBuffer {
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }
}

impl Buffer for NullBuffer {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn release(&mut self) {
        self.stats.update(|s| s.buffers_released += 1);
    }
}
