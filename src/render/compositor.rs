//! Software compositing of draw regions.

use crate::render::backend::RgbaImage;
use crate::render::backends::memory::MemoryBuffer;
use crate::store::DrawRegionIter;
use anyhow::anyhow;

/// Copies every region of `regions` into `target`, clipped to the image. Returns the number of
/// pixels written.
///
/// Only buffers created by [`MemoryUpdater`](crate::render::backends::memory::MemoryUpdater) can
/// be composited this way.
pub fn composite(regions: DrawRegionIter<'_>, target: &mut RgbaImage) -> anyhow::Result<u64> {
    let mut written = 0;

    for region in regions {
        let buffer = region
            .buffer
            .as_any()
            .downcast_ref::<MemoryBuffer>()
            .ok_or_else(|| anyhow!("composite used with a non-memory buffer"))?;

        let (sx, sy) = (region.src_x as i64, region.src_y as i64);
        let (dx, dy) = (region.dst_x as i64, region.dst_y as i64);

        // clip against the buffer on the source side and the image on the destination side
        let left = 0i64.max(-sx).max(-dx);
        let top = 0i64.max(-sy).max(-dy);
        let right = (region.width as i64)
            .min(buffer.width() as i64 - sx)
            .min(target.width as i64 - dx);
        let bottom = (region.height as i64)
            .min(buffer.height() as i64 - sy)
            .min(target.height as i64 - dy);
        if right <= left || bottom <= top {
            continue;
        }

        let width = (right - left) as u32;
        let start = ((dx + left) * 4) as usize;
        let len = width as usize * 4;
        for row in top..bottom {
            let line = buffer.span((sx + left) as u32, (sy + row) as u32, width);
            target.row_mut((dy + row) as u32)[start..start + len].copy_from_slice(line);
        }
        written += (right - left) as u64 * (bottom - top) as u64;
    }

    Ok(written)
}
