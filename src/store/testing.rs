//! Recording updater used by the store tests.

use crate::buffer::Buffer;
use crate::config::BackingStoreConfig;
use crate::region::UpdateRegion;
use crate::store::TiledBackingStore;
use crate::updater::{UpdateQuality, Updater};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    Create {
        id: u32,
        width: u32,
        height: u32,
    },
    Scroll {
        id: u32,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        dx: i32,
        dy: i32,
    },
    Render {
        id: u32,
        buffer_x: i32,
        buffer_y: i32,
        region: UpdateRegion,
        quality: UpdateQuality,
        existing: bool,
    },
    Release {
        id: u32,
    },
}

/// Test-side view on what the updater was asked to do.
#[derive(Clone, Default)]
pub(crate) struct CallRecorder {
    calls: Rc<RefCell<Vec<Call>>>,
    failing_creates: Rc<Cell<u32>>,
}

impl CallRecorder {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    pub(crate) fn renders(&self) -> Vec<Call> {
        self.filter(|c| matches!(c, Call::Render { .. }))
    }

    pub(crate) fn scrolls(&self) -> Vec<Call> {
        self.filter(|c| matches!(c, Call::Scroll { .. }))
    }

    pub(crate) fn creates(&self) -> usize {
        self.filter(|c| matches!(c, Call::Create { .. })).len()
    }

    pub(crate) fn releases(&self) -> usize {
        self.filter(|c| matches!(c, Call::Release { .. })).len()
    }

    /// Makes the next `n` buffer creations fail.
    pub(crate) fn fail_next_creates(&self, n: u32) {
        self.failing_creates.set(n);
    }

    fn filter(&self, f: impl Fn(&Call) -> bool) -> Vec<Call> {
        self.calls.borrow().iter().filter(|c| f(c)).cloned().collect()
    }
}

pub(crate) struct RecordingUpdater {
    recorder: CallRecorder,
    next_id: u32,
}

impl RecordingUpdater {
    pub(crate) fn new() -> (Self, CallRecorder) {
        let recorder = CallRecorder::default();
        (
            Self {
                recorder: recorder.clone(),
                next_id: 1,
            },
            recorder,
        )
    }

    fn record(&self, call: Call) {
        self.recorder.calls.borrow_mut().push(call);
    }
}

pub(crate) struct RecordingBuffer {
    pub(crate) id: u32,
    calls: Rc<RefCell<Vec<Call>>>,
}

impl Buffer for RecordingBuffer {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn release(&mut self) {
        self.calls.borrow_mut().push(Call::Release { id: self.id });
    }
}

fn id_of(buffer: &dyn Buffer) -> u32 {
    buffer
        .as_any()
        .downcast_ref::<RecordingBuffer>()
        .map(|b| b.id)
        .unwrap_or(0)
}

impl Updater for RecordingUpdater {
    fn create_buffer(&mut self, width: u32, height: u32) -> anyhow::Result<Box<dyn Buffer>> {
        let failing = self.recorder.failing_creates.get();
        if failing > 0 {
            self.recorder.failing_creates.set(failing - 1);
            anyhow::bail!("out of buffer memory");
        }

        let id = self.next_id;
        self.next_id += 1;
        self.record(Call::Create { id, width, height });
        Ok(Box::new(RecordingBuffer {
            id,
            calls: self.recorder.calls.clone(),
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
        self.record(Call::Scroll {
            id: id_of(buffer),
            x,
            y,
            width,
            height,
            dx,
            dy,
        });
    }

    fn render_to_backing_store_region(
        &mut self,
        buffer: &mut dyn Buffer,
        buffer_x: i32,
        buffer_y: i32,
        region: &UpdateRegion,
        quality: UpdateQuality,
        existing_region: bool,
    ) {
        self.record(Call::Render {
            id: id_of(buffer),
            buffer_x,
            buffer_y,
            region: *region,
            quality,
            existing: existing_region,
        });
    }
}

pub(crate) fn recording_store(config: BackingStoreConfig) -> (TiledBackingStore, CallRecorder) {
    let _ = env_logger::builder().is_test(true).try_init();

    let (updater, recorder) = RecordingUpdater::new();
    (TiledBackingStore::with_config(Box::new(updater), config), recorder)
}
