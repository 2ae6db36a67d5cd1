//! Rectangle scan conversion.

use std::sync::Arc;

use super::{snap, Chunk, Rasterizer, SharedPixels, WaitGroup, DEFAULT_CHUNK_BITS};
use crate::image::IndexedImage;

/// Interpolated state handed to a rectangle shader for one pixel.
pub struct RectFragment {
    /// Pixel coordinates in the destination buffer.
    pub x: i32,
    pub y: i32,

    /// Percentage coordinates, 0..1 across the rectangle.
    pub px: f64,
    pub py: f64,
}

/// Per-pixel rectangle shader. Returns the palette index to write, or
/// `None` to leave the destination pixel untouched.
pub type RectShader = Arc<dyn Fn(&RectFragment) -> Option<u8> + Send + Sync>;

/// A rectangle draw request.
pub struct RectangleInfo {
    pub shader: RectShader,

    /// Raster chunk size in bits; 0 selects the default (8x8).
    pub chunk_bits: u32,

    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Input shared by every chunk of one rectangle draw call.
struct RectStatic {
    buffer: SharedPixels,
    buffer_width: usize,
    shader: RectShader,

    /// Percentage step per pixel.
    pxs: f64,
    pys: f64,
}

/// One tile of a rectangle draw call.
pub(crate) struct RectChunk {
    stat: Arc<RectStatic>,

    /// Chunk origin, pixels.
    x0: i32,
    y0: i32,

    /// Percentage coordinates at the origin.
    px0: f64,
    py0: f64,

    /// Buffer offset of the origin.
    offset: usize,

    /// Tile extent in pixels; trailing tiles can be smaller.
    width: usize,
    height: usize,

    wg: Arc<WaitGroup>,
}

impl Rasterizer {
    /// Rasterize a rectangle into `target`, blocking until every chunk
    /// has been processed. Zero width or height is a no-op; negative
    /// extents are normalized.
    pub fn draw_rectangle(&mut self, target: &mut IndexedImage, mut ri: RectangleInfo) {
        self.run();

        if ri.w == 0.0 || ri.h == 0.0 {
            return;
        }
        if ri.w < 0.0 {
            ri.x += ri.w;
            ri.w = -ri.w;
        }
        if ri.h < 0.0 {
            ri.y += ri.h;
            ri.h = -ri.h;
        }
        let chunk_bits = if ri.chunk_bits == 0 {
            DEFAULT_CHUNK_BITS
        } else {
            ri.chunk_bits
        };

        // Snap to whole pixels.
        let x = snap(ri.x);
        let y = snap(ri.y);
        let w = ri.w.floor();
        let h = ri.h.floor();
        if w < 1.0 || h < 1.0 || target.width == 0 || target.height == 0 {
            return;
        }

        let pxs = 1.0 / w;
        let pys = 1.0 / h;

        // Clip to the buffer; bounds are inclusive.
        let min_x = x.max(0.0) as i32;
        let min_y = y.max(0.0) as i32;
        let max_x = (x + w - 1.0).min(target.width as f64 - 1.0) as i32;
        let max_y = (y + h - 1.0).min(target.height as f64 - 1.0) as i32;
        if min_x > max_x || min_y > max_y {
            return;
        }

        let stat = Arc::new(RectStatic {
            buffer: SharedPixels::new(&mut target.pixels),
            buffer_width: target.width,
            shader: ri.shader,
            pxs,
            pys,
        });
        let wg = Arc::new(WaitGroup::new());
        let chunk_size = 1i32 << chunk_bits;

        let mut yc = min_y;
        while yc <= max_y {
            let height = (max_y - yc + 1).min(chunk_size) as usize;
            let mut xc = min_x;
            while xc <= max_x {
                let width = (max_x - xc + 1).min(chunk_size) as usize;
                wg.add(1);
                self.submit(Chunk::Rectangle(RectChunk {
                    stat: Arc::clone(&stat),
                    x0: xc,
                    y0: yc,
                    // Percentages step from the unclipped origin so
                    // clipping never shifts the sampled region.
                    px0: (xc as f64 - x) * pxs,
                    py0: (yc as f64 - y) * pys,
                    offset: xc as usize + yc as usize * target.width,
                    width,
                    height,
                    wg: Arc::clone(&wg),
                }));
                xc += chunk_size;
            }
            yc += chunk_size;
        }
        wg.wait();
    }
}

impl RectChunk {
    pub(crate) fn wait_group(&self) -> &Arc<WaitGroup> {
        &self.wg
    }

    /// Evaluate the shader for every pixel of the tile.
    pub(crate) fn run(&self) {
        let s = &*self.stat;
        let mut py = self.py0;
        let mut row_offset = self.offset;
        for row in 0..self.height {
            let y = self.y0 + row as i32;
            let mut px = self.px0;
            let mut offset = row_offset;
            for col in 0..self.width {
                let frag = RectFragment {
                    x: self.x0 + col as i32,
                    y,
                    px,
                    py,
                };
                if let Some(color) = (s.shader)(&frag) {
                    s.buffer.set(offset, color);
                }
                px += s.pxs;
                offset += 1;
            }
            py += s.pys;
            row_offset += s.buffer_width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn solid(color: u8) -> RectShader {
        Arc::new(move |_| Some(color))
    }

    fn draw(
        target: &mut IndexedImage,
        shader: RectShader,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    ) {
        let mut r = Rasterizer::new(4);
        r.draw_rectangle(
            target,
            RectangleInfo {
                shader,
                chunk_bits: 0,
                x,
                y,
                w,
                h,
            },
        );
    }

    #[test]
    fn fills_exact_extent() {
        let mut target = IndexedImage::new(32, 32, 4);
        draw(&mut target, solid(2), 4.0, 5.0, 10.0, 7.0);
        let filled = target.pixels.iter().filter(|&&p| p == 2).count();
        assert_eq!(filled, 10 * 7);
        assert_eq!(target.pixels[5 * 32 + 4], 2);
        assert_eq!(target.pixels[11 * 32 + 13], 2);
        assert_eq!(target.pixels[11 * 32 + 14], 0);
        assert_eq!(target.pixels[12 * 32 + 4], 0);
    }

    #[test]
    fn chunk_coverage_is_disjoint_and_complete() {
        // Extents both divisible (16x16) and not divisible (13x9) by
        // the 8-pixel chunk side; every pixel visited exactly once.
        for (w, h) in [(16i32, 16i32), (13, 9), (8, 8), (1, 1)] {
            let mut target = IndexedImage::new(40, 40, 4);
            let visits = Arc::new(
                (0..40 * 40).map(|_| AtomicU32::new(0)).collect::<Vec<_>>(),
            );
            let v = Arc::clone(&visits);
            let shader: RectShader = Arc::new(move |f| {
                v[f.x as usize + f.y as usize * 40].fetch_add(1, Ordering::Relaxed);
                Some(1)
            });
            draw(&mut target, shader, 3.0, 2.0, w as f64, h as f64);
            for y in 0..40i32 {
                for x in 0..40i32 {
                    let inside = x >= 3 && x < 3 + w && y >= 2 && y < 2 + h;
                    let count = visits[x as usize + y as usize * 40].load(Ordering::Relaxed);
                    assert_eq!(count, inside as u32, "pixel ({x},{y}) of {w}x{h}");
                }
            }
        }
    }

    #[test]
    fn zero_extent_is_a_noop() {
        let mut target = IndexedImage::new(8, 8, 4);
        draw(&mut target, solid(3), 1.0, 1.0, 0.0, 5.0);
        draw(&mut target, solid(3), 1.0, 1.0, 5.0, 0.0);
        assert!(target.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn negative_extent_is_normalized() {
        let mut target = IndexedImage::new(16, 16, 4);
        draw(&mut target, solid(1), 10.0, 10.0, -4.0, -3.0);
        let filled = target.pixels.iter().filter(|&&p| p == 1).count();
        assert_eq!(filled, 4 * 3);
        assert_eq!(target.pixels[7 * 16 + 6], 1);
    }

    #[test]
    fn clips_to_buffer_and_keeps_interpolation_origin() {
        let mut target = IndexedImage::new(8, 8, 4);
        // 4 pixels hang off the left edge; the visible part must start
        // halfway through the percentage span.
        let shader: RectShader = Arc::new(|f| if f.px >= 0.5 { Some(2) } else { Some(1) });
        draw(&mut target, shader, -4.0, 0.0, 8.0, 2.0);
        // Visible pixels are the right half of the rectangle.
        for x in 0..4 {
            assert_eq!(target.pixels[x], 2, "x={x}");
        }
        assert_eq!(target.pixels[4], 0);
    }

    #[test]
    fn fully_offscreen_is_a_noop() {
        let mut target = IndexedImage::new(8, 8, 4);
        draw(&mut target, solid(3), -20.0, -20.0, 5.0, 5.0);
        draw(&mut target, solid(3), 20.0, 2.0, 5.0, 5.0);
        assert!(target.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn transparent_shader_result_leaves_pixels_untouched() {
        let mut target = IndexedImage::new(8, 8, 4);
        target.fill(3);
        let shader: RectShader = Arc::new(|f| if f.x % 2 == 0 { None } else { Some(1) });
        draw(&mut target, shader, 0.0, 0.0, 8.0, 1.0);
        assert_eq!(&target.pixels[0..4], &[3, 1, 3, 1]);
    }
}
