use std::cell::RefCell;
use std::rc::Rc;

/// CPU image, four bytes per pixel with red first and no premultiplication. Used as
/// composition target.
#[derive(Clone)]
pub struct RgbaImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
}

impl RgbaImage {
    /// Creates a fully transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width * 4;
        Self {
            pixels: vec![0u8; stride as usize * height as usize],
            width,
            height,
            stride,
        }
    }

    /// Pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride as usize + x as usize * 4;
        let p = &self.pixels[offset..offset + 4];
        Some([p[0], p[1], p[2], p[3]])
    }

    pub(crate) fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride as usize;
        &mut self.pixels[start..start + self.width as usize * 4]
    }
}

impl std::fmt::Debug for RgbaImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgbaImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.pixels.len())
            .finish()
    }
}

/// Counters kept by the bundled updaters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdaterStats {
    pub buffers_created: u64,
    pub buffers_released: u64,
    pub renders: u64,
    pub pixels_rendered: u64,
    pub scrolls: u64,
    pub pixels_scrolled: u64,
}

impl UpdaterStats {
    /// Buffers handed out and not yet released.
    pub fn live_buffers(&self) -> u64 {
        self.buffers_created - self.buffers_released
    }
}

/// Shared view on an updater's [`UpdaterStats`].
///
/// The updater itself is boxed away inside the backing store, so the embedder keeps one of these
/// to look at the counters.
#[derive(Clone, Debug, Default)]
pub struct StatsHandle(Rc<RefCell<UpdaterStats>>);

impl StatsHandle {
    pub fn get(&self) -> UpdaterStats {
        *self.0.borrow()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut UpdaterStats)) {
        f(&mut self.0.borrow_mut());
    }
}
