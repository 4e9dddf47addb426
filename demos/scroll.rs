use gosub_backing_store::render::backend::RgbaImage;
use gosub_backing_store::render::backends::memory::MemoryUpdater;
use gosub_backing_store::render::compositor::composite;
use gosub_backing_store::{
    BackingStore, BackingStoreConfig, ContentSize, Param, RegionAvailability, TiledBackingStore, UpdateMode,
    UpdateQuality, Viewport,
};
use std::cell::Cell;
use std::rc::Rc;

/// Checkerboard with a color that changes per document "version".
fn painter(version: Rc<Cell<u8>>) -> impl Fn(i32, i32) -> [u8; 4] {
    move |x, y| {
        let light = ((x.div_euclid(32) + y.div_euclid(32)) & 1) == 0;
        let v = version.get().wrapping_mul(40);
        if light {
            [255, 255 - v, v, 255]
        } else {
            [40, v, 80, 255]
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let version = Rc::new(Cell::new(0u8));
    let updater = MemoryUpdater::new(painter(version.clone()));
    let stats = updater.stats();

    let config = BackingStoreConfig::default().with_quality(UpdateQuality::Low);
    let mut store = TiledBackingStore::with_config(Box::new(updater), config);
    let content = ContentSize::new(800, 3000);
    let mut viewport = Viewport::new(0, 0, 320, 240);
    let mut frame = RgbaImage::new(viewport.width, viewport.height);

    for step in 0..12 {
        if step == 6 {
            version.set(1);
        }
        if step == 8 {
            store.set_param(Param::Quality, UpdateQuality::High.raw());
        }

        let complete = store.update(None, UpdateMode::All, viewport, content, step == 6);
        if store.check_error() {
            anyhow::bail!("backing store failed at step {step}");
        }

        let availability = store.can_draw_region(&viewport.as_region());
        let written = composite(store.begin_draw_region(&viewport.as_region(), viewport.x, viewport.y), &mut frame)?;
        log::info!("step {step}: {viewport:?} complete={complete} {availability:?}, {written} pixel(s) composited");
        if availability != RegionAvailability::FullyAvailable {
            log::warn!("step {step}: frame has holes");
        }

        viewport.translate(0, 37);
    }

    let s = stats.get();
    log::info!(
        "{} buffer(s), {} render(s) for {} pixel(s), {} scroll(s) for {} pixel(s)",
        s.buffers_created,
        s.renders,
        s.pixels_rendered,
        s.scrolls,
        s.pixels_scrolled
    );

    store.cleanup();
    log::info!("{} buffer(s) still alive after cleanup", stats.get().live_buffers());
    Ok(())
}
