//! Triangle scan conversion with barycentric interpolation.

use std::sync::Arc;

use super::{snap, Chunk, Rasterizer, SharedPixels, WaitGroup, DEFAULT_CHUNK_BITS};
use crate::image::IndexedImage;

/// Interpolated state handed to a triangle shader for one pixel.
pub struct TriFragment {
    /// Pixel coordinates in the destination buffer.
    pub x: i32,
    pub y: i32,

    /// Normalized barycentric weights (sum to 1 inside the triangle).
    pub w0: f64,
    pub w1: f64,
    pub w2: f64,
}

/// Per-pixel triangle shader. Returns the palette index to write, or
/// `None` to leave the destination pixel untouched.
pub type TriShader = Arc<dyn Fn(&TriFragment) -> Option<u8> + Send + Sync>;

/// A triangle draw request.
pub struct TriangleInfo {
    pub shader: TriShader,

    /// Raster chunk size in bits; 0 selects the default (8x8).
    pub chunk_bits: u32,

    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Input shared by every chunk of one triangle draw call.
struct TriStatic {
    buffer: SharedPixels,
    buffer_width: usize,
    shader: TriShader,

    /// Edge-function steps per pixel.
    a01: f64,
    b01: f64,
    a12: f64,
    b12: f64,
    a20: f64,
    b20: f64,

    inv_area: f64,

    /// Per-edge boundary ownership under the top-left fill rule: a top
    /// or left edge includes pixels its weight puts exactly on it, any
    /// other edge excludes them.
    top_left0: bool,
    top_left1: bool,
    top_left2: bool,
}

/// One tile of a triangle draw call.
pub(crate) struct TriChunk {
    stat: Arc<TriStatic>,

    /// Chunk origin, pixels.
    x0: i32,
    y0: i32,

    /// Edge-function values at the origin.
    w0o: f64,
    w1o: f64,
    w2o: f64,

    /// Buffer offset of the origin.
    offset: usize,

    /// Tile extent in pixels; trailing tiles can be smaller.
    width: usize,
    height: usize,

    wg: Arc<WaitGroup>,
}

impl Rasterizer {
    /// Rasterize a triangle into `target`, blocking until every chunk
    /// has been processed. A degenerate (zero-area) triangle is a
    /// no-op. Shared edges between adjacent triangles draw exactly
    /// once under the top-left fill rule.
    pub fn draw_triangle(&mut self, target: &mut IndexedImage, ti: TriangleInfo) {
        self.run();

        let chunk_bits = if ti.chunk_bits == 0 {
            DEFAULT_CHUNK_BITS
        } else {
            ti.chunk_bits
        };

        let area = edge_fn(ti.x0, ti.y0, ti.x1, ti.y1, ti.x2, ti.y2);
        if area == 0.0 {
            return;
        }

        // Snap to whole pixels.
        let sx0 = snap(ti.x0);
        let sy0 = snap(ti.y0);
        let sx1 = snap(ti.x1);
        let sy1 = snap(ti.y1);
        let sx2 = snap(ti.x2);
        let sy2 = snap(ti.y2);

        // Clip the bounding box to the buffer; bounds are inclusive.
        if target.width == 0 || target.height == 0 {
            return;
        }
        let min_x = sx0.min(sx1).min(sx2).max(0.0) as i32;
        let min_y = sy0.min(sy1).min(sy2).max(0.0) as i32;
        let max_x = sx0.max(sx1).max(sx2).min(target.width as f64 - 1.0) as i32;
        let max_y = sy0.max(sy1).max(sy2).min(target.height as f64 - 1.0) as i32;
        if min_x > max_x || min_y > max_y {
            return;
        }

        // Edge-function steps per pixel.
        let (a01, b01) = (ti.y0 - ti.y1, ti.x1 - ti.x0);
        let (a12, b12) = (ti.y1 - ti.y2, ti.x2 - ti.x1);
        let (a20, b20) = (ti.y2 - ti.y0, ti.x0 - ti.x2);

        // Edge-function values at the clip origin.
        let ox = min_x as f64;
        let oy = min_y as f64;
        let mut w0o = edge_fn(ti.x1, ti.y1, ti.x2, ti.y2, ox, oy);
        let mut w1o = edge_fn(ti.x2, ti.y2, ti.x0, ti.y0, ox, oy);
        let mut w2o = edge_fn(ti.x0, ti.y0, ti.x1, ti.y1, ox, oy);

        let stat = Arc::new(TriStatic {
            buffer: SharedPixels::new(&mut target.pixels),
            buffer_width: target.width,
            shader: ti.shader,
            a01,
            b01,
            a12,
            b12,
            a20,
            b20,
            inv_area: 1.0 / area,
            top_left0: is_top_left(sx1, sy1, sx2, sy2),
            top_left1: is_top_left(sx2, sy2, sx0, sy0),
            top_left2: is_top_left(sx0, sy0, sx1, sy1),
        });
        let wg = Arc::new(WaitGroup::new());
        let chunk_size = 1i32 << chunk_bits;
        let chunk_step = chunk_size as f64;

        // Edge-function steps per chunk.
        let w0x = a12 * chunk_step;
        let w1x = a20 * chunk_step;
        let w2x = a01 * chunk_step;
        let w0y = b12 * chunk_step;
        let w1y = b20 * chunk_step;
        let w2y = b01 * chunk_step;

        let mut row_offset = min_x as usize + min_y as usize * target.width;
        let mut yc = min_y;
        while yc <= max_y {
            let height = (max_y - yc + 1).min(chunk_size) as usize;
            let (mut w0, mut w1, mut w2) = (w0o, w1o, w2o);
            let mut offset = row_offset;
            let mut xc = min_x;
            while xc <= max_x {
                let width = (max_x - xc + 1).min(chunk_size) as usize;
                wg.add(1);
                self.submit(Chunk::Triangle(TriChunk {
                    stat: Arc::clone(&stat),
                    x0: xc,
                    y0: yc,
                    w0o: w0,
                    w1o: w1,
                    w2o: w2,
                    offset,
                    width,
                    height,
                    wg: Arc::clone(&wg),
                }));
                w0 += w0x;
                w1 += w1x;
                w2 += w2x;
                offset += chunk_size as usize;
                xc += chunk_size;
            }
            w0o += w0y;
            w1o += w1y;
            w2o += w2y;
            row_offset += target.width * chunk_size as usize;
            yc += chunk_size;
        }
        wg.wait();
    }
}

impl TriChunk {
    pub(crate) fn wait_group(&self) -> &Arc<WaitGroup> {
        &self.wg
    }

    /// Evaluate the shader for every pixel of the tile that falls
    /// inside the triangle under the top-left fill rule.
    pub(crate) fn run(&self) {
        let s = &*self.stat;
        let (mut w0r, mut w1r, mut w2r) = (self.w0o, self.w1o, self.w2o);
        let mut row_offset = self.offset;
        for row in 0..self.height {
            let y = self.y0 + row as i32;
            let (mut w0, mut w1, mut w2) = (w0r, w1r, w2r);
            let mut offset = row_offset;
            for col in 0..self.width {
                if covered(w0, s.top_left0)
                    && covered(w1, s.top_left1)
                    && covered(w2, s.top_left2)
                {
                    let frag = TriFragment {
                        x: self.x0 + col as i32,
                        y,
                        w0: w0 * s.inv_area,
                        w1: w1 * s.inv_area,
                        w2: w2 * s.inv_area,
                    };
                    if let Some(color) = (s.shader)(&frag) {
                        s.buffer.set(offset, color);
                    }
                }
                w0 += s.a12;
                w1 += s.a20;
                w2 += s.a01;
                offset += 1;
            }
            w0r += s.b12;
            w1r += s.b20;
            w2r += s.b01;
            row_offset += s.buffer_width;
        }
    }
}

/// 2D cross-product edge function: positive when (cx, cy) lies to the
/// left of the directed edge a -> b.
fn edge_fn(ax: f64, ay: f64, bx: f64, by: f64, cx: f64, cy: f64) -> f64 {
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

/// Whether the directed edge a -> b is a top or left edge in y-down
/// screen coordinates.
fn is_top_left(ax: f64, ay: f64, bx: f64, by: f64) -> bool {
    let top = ay == by && ax < bx;
    let left = ay > by;
    top || left
}

/// Whether an edge weight covers the pixel: top and left edges own
/// their boundary pixels, the rest cede them.
#[inline]
fn covered(w: f64, top_left: bool) -> bool {
    if top_left {
        w >= 0.0
    } else {
        w > 0.0
    }
}
