//! Viewport and content geometry.
//!
//! A [`Viewport`] is the visible window into a document, expressed in the same scaled
//! document coordinates as the content. A [`ContentSize`] is the full scrollable extent of
//! that document at the current zoom level.
//!
//! The backing store uses both on every update: the viewport anchors the tile grid (and bounds
//! the size of any update target), the content size clips every region it renders.
//!
//! # Examples
//!
//! Scrolling a viewport down by 50 pixels:
//! ```
//! use gosub_backing_store::{UpdateRegion, Viewport};
//!
//! let mut vp = Viewport::new(0, 0, 200, 200);
//! vp.translate(0, 50);
//! assert_eq!(vp.as_region(), UpdateRegion::new(0, 50, 200, 250));
//! ```
//!
//! Zooming changes the content size, not the viewport:
//! ```
//! use gosub_backing_store::ContentSize;
//!
//! let content = ContentSize::new(1000, 1000);
//! assert_eq!(content.scaled(1.5), ContentSize::new(1500, 1500));
//! ```

use crate::region::UpdateRegion;
use serde::{Deserialize, Serialize};

/// Represents the visible part of a document.
#[derive(Clone, Eq, PartialEq, Copy, Default, Serialize, Deserialize)]
pub struct Viewport {
    /// Horizontal offset of the top-left corner in document pixels.
    pub x: i32,

    /// Vertical offset of the top-left corner in document pixels.
    pub y: i32,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,
}

impl std::fmt::Debug for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Viewport {{ x: {}, y: {}, width: {}, height: {} }}",
            self.x, self.y, self.width, self.height
        )
    }
}

impl Viewport {
    /// Creates a new [`Viewport`] with the given position and size.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Resizes the viewport to the given width and height.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Moves the viewport’s origin to `(x, y)`.
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    /// Moves the viewport’s origin by `(dx, dy)`.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.x = self.x.saturating_add(dx);
        self.y = self.y.saturating_add(dy);
    }

    /// Returns true when the viewport covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The document region covered by this viewport.
    pub fn as_region(&self) -> UpdateRegion {
        UpdateRegion::from_xywh(self.x, self.y, self.width, self.height)
    }
}

/// Size of the scrollable document in scaled document pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSize {
    pub width: u32,
    pub height: u32,
}

impl ContentSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The region `[0, width) × [0, height)`.
    pub fn as_region(&self) -> UpdateRegion {
        UpdateRegion::from_xywh(0, 0, self.width, self.height)
    }

    /// Returns the content size at a different zoom factor, rounded to whole pixels.
    pub fn scaled(&self, factor: f32) -> ContentSize {
        let scale = |v: u32| (v as f32 * factor).round().max(0.0) as u32;
        ContentSize {
            width: scale(self.width),
            height: scale(self.height),
        }
    }
}
