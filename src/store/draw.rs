use crate::buffer::Buffer;
use std::iter::FusedIterator;

/// One rectangle to copy from a buffer onto the screen.
#[derive(Clone, Copy)]
pub struct DrawRegion<'a> {
    /// Buffer holding the valid pixels
    pub buffer: &'a dyn Buffer,
    /// Location in the buffer to copy from
    pub src_x: i32,
    pub src_y: i32,
    /// Location on the screen to copy to
    pub dst_x: i32,
    pub dst_y: i32,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for DrawRegion<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DrawRegion {{ src: ({}, {}), dst: ({}, {}), size: {}x{} }}",
            self.src_x, self.src_y, self.dst_x, self.dst_y, self.width, self.height
        )
    }
}

/// Single-pass sequence of [`DrawRegion`]s returned by `begin_draw_region()`.
///
/// The sequence borrows the backing store, so the store cannot be updated, invalidated or
/// cleaned up while it is alive. Dropping it, or calling [`release`](Self::release), ends the
/// iteration; the buffers themselves stay with the store.
pub struct DrawRegionIter<'a> {
    regions: std::vec::IntoIter<DrawRegion<'a>>,
}

impl<'a> DrawRegionIter<'a> {
    pub(crate) fn new(regions: Vec<DrawRegion<'a>>) -> Self {
        Self {
            regions: regions.into_iter(),
        }
    }

    /// Number of regions not yet returned.
    pub fn remaining(&self) -> usize {
        self.regions.len()
    }

    /// Ends the iteration early.
    pub fn release(self) {}
}

impl<'a> Iterator for DrawRegionIter<'a> {
    type Item = DrawRegion<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.regions.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.regions.size_hint()
    }
}

impl ExactSizeIterator for DrawRegionIter<'_> {}

impl FusedIterator for DrawRegionIter<'_> {}

impl std::fmt::Debug for DrawRegionIter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawRegionIter").field("remaining", &self.remaining()).finish()
    }
}
