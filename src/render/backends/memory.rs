use crate::buffer::Buffer;
use crate::region::UpdateRegion;
use crate::render::backend::StatsHandle;
use crate::updater::{UpdateQuality, Updater};
use std::any::Any;

/// Computes the color of a document pixel.
pub type Painter = Box<dyn Fn(i32, i32) -> [u8; 4]>;

/// Updater that keeps buffers as RGBA8 pixels in main memory.
///
/// Pixels come from a [`Painter`]. Low quality renders sample the painter once per 2x2 block.
pub struct MemoryUpdater {
    painter: Painter,
    stats: StatsHandle,
}

impl MemoryUpdater {
    pub fn new(painter: impl Fn(i32, i32) -> [u8; 4] + 'static) -> Self {
        Self {
            painter: Box::new(painter),
            stats: StatsHandle::default(),
        }
    }

    pub fn stats(&self) -> StatsHandle {
        self.stats.clone()
    }
}

impl std::fmt::Debug for MemoryUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryUpdater").field("stats", &self.stats.get()).finish()
    }
}

impl Updater for MemoryUpdater {
    fn create_buffer(&mut self, width: u32, height: u32) -> anyhow::Result<Box<dyn Buffer>> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| anyhow::anyhow!("buffer of {width}x{height} is too large"))?;
        if len == 0 {
            anyhow::bail!("cannot create an empty {width}x{height} buffer");
        }

        self.stats.update(|s| s.buffers_created += 1);
        Ok(Box::new(MemoryBuffer {
            width,
            height,
            pixels: vec![0u8; len],
            stats: self.stats.clone(),
        }))
    }

    fn in_place_scroll(
        &mut self,
        buffer: &mut dyn Buffer,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        dx: i32,
        dy: i32,
    ) {
        let Some(b) = buffer.as_any_mut().downcast_mut::<MemoryBuffer>() else {
            log::warn!("MemoryUpdater asked to scroll a foreign buffer");
            return;
        };

        let moved = b.scroll(UpdateRegion::from_xywh(x, y, width, height), dx, dy);
        self.stats.update(|s| {
            s.scrolls += 1;
            s.pixels_scrolled += moved;
        });
    }

    fn render_to_backing_store_region(
        &mut self,
        buffer: &mut dyn Buffer,
        buffer_x: i32,
        buffer_y: i32,
        region: &UpdateRegion,
        quality: UpdateQuality,
        _existing_region: bool,
    ) {
        let Some(b) = buffer.as_any_mut().downcast_mut::<MemoryBuffer>() else {
            log::warn!("MemoryUpdater asked to render into a foreign buffer");
            return;
        };

        // document position = buffer position + offset
        let off_x = region.x1 - buffer_x;
        let off_y = region.y1 - buffer_y;
        let dst = UpdateRegion::from_xywh(buffer_x, buffer_y, region.width(), region.height()).intersect(&b.bounds());

        for by in dst.y1..dst.y2 {
            for bx in dst.x1..dst.x2 {
                let (px, py) = (bx + off_x, by + off_y);
                let color = match quality {
                    UpdateQuality::High => (self.painter)(px, py),
                    UpdateQuality::Low => (self.painter)(px & !1, py & !1),
                };
                b.put(bx, by, color);
            }
        }

        self.stats.update(|s| {
            s.renders += 1;
            s.pixels_rendered += dst.area();
        });
    }
}

/// RGBA8 buffer handed out by [`MemoryUpdater`].
pub struct MemoryBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    stats: StatsHandle,
}

impl MemoryBuffer {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let o = self.offset(x as i32, y as i32);
        let p = &self.pixels[o..o + 4];
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Pixels of row `y` from column `x`, `len` pixels long.
    pub(crate) fn span(&self, x: u32, y: u32, len: u32) -> &[u8] {
        let o = self.offset(x as i32, y as i32);
        &self.pixels[o..o + len as usize * 4]
    }

    fn bounds(&self) -> UpdateRegion {
        UpdateRegion::from_xywh(0, 0, self.width, self.height)
    }

    fn offset(&self, x: i32, y: i32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    fn put(&mut self, x: i32, y: i32, color: [u8; 4]) {
        let o = self.offset(x, y);
        self.pixels[o..o + 4].copy_from_slice(&color);
    }

    /// Moves `source` by `(dx, dy)`. Whatever would leave the buffer is dropped. Returns the
    /// number of pixels moved.
    fn scroll(&mut self, source: UpdateRegion, dx: i32, dy: i32) -> u64 {
        let dst = source.intersect(&self.bounds()).translate(dx, dy).intersect(&self.bounds());
        if dst.is_empty() {
            return 0;
        }
        let src = dst.translate(-dx, -dy);
        let row_len = dst.width() as usize * 4;

        let rows: Box<dyn Iterator<Item = i32>> = if dy > 0 {
            Box::new((0..dst.height() as i32).rev())
        } else {
            Box::new(0..dst.height() as i32)
        };
        for row in rows {
            let from = self.offset(src.x1, src.y1 + row);
            let to = self.offset(dst.x1, dst.y1 + row);
            self.pixels.copy_within(from..from + row_len, to);
        }

        dst.area()
    }
}

impl Buffer for MemoryBuffer {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn release(&mut self) {
        self.pixels = Vec::new();
        self.stats.update(|s| s.buffers_released += 1);
    }
}
