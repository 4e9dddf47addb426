use std::any::Any;

/// A unit of backing storage for one tile, supplied by the [`Updater`](crate::Updater).
///
/// The backing store only moves handles around. What a buffer actually is (a piece of memory,
/// a GL texture, ...) is up to the updater, which can get its concrete type back through
/// [`as_any_mut`](Buffer::as_any_mut).
pub trait Buffer: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Frees or recycles the underlying storage. Called exactly once by the backing store, after
    /// which the handle is dropped and never touched again.
    fn release(&mut self);
}

/// Store-side owner of a buffer handle.
///
/// Guarantees that [`Buffer::release`] runs exactly once: either explicitly through
/// [`OwnedBuffer::release`] or when the owner is dropped.
pub(crate) struct OwnedBuffer {
    handle: Option<Box<dyn Buffer>>,
    /// Size of the allocation as requested from the updater.
    width: u32,
    height: u32,
}

impl OwnedBuffer {
    pub(crate) fn new(handle: Box<dyn Buffer>, width: u32, height: u32) -> Self {
        Self {
            handle: Some(handle),
            width,
            height,
        }
    }

    pub(crate) fn get(&self) -> Option<&dyn Buffer> {
        self.handle.as_deref()
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut (dyn Buffer + 'static)> {
        self.handle.as_deref_mut()
    }

    pub(crate) fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn release(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }
    }
}

impl Drop for OwnedBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for OwnedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("released", &self.handle.is_none())
            .finish()
    }
}
