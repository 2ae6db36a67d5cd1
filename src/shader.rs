//! Palette quantization and the indexed-texture shaders.
//!
//! A shader here is a closure bound to a source image region plus a
//! lighting model and quantizer; the rasterizer calls it once per
//! covered pixel. Sampled index 0 means transparent and produces no
//! write.

use std::sync::Arc;

use crate::image::IndexedImage;
use crate::lights::Lights;
use crate::rasterizer::{RectFragment, RectShader, TriFragment, TriShader};

/// Converts a continuous light intensity into a palette index.
pub trait Indexizer: Send + Sync {
    /// Map an intensity (clamped to 0-1) at absolute pixel coordinates
    /// to a palette index.
    fn indexize(&self, intensity: f64, x: i32, y: i32) -> u8;
}

/// 2-bit quantizer: six ascending thresholds partition 0-1 into four
/// output levels. The half-band below every full-level threshold is
/// transitional: there, pixels whose x/y parities match drop one
/// level, blending two adjacent levels in a 2x2 checkerboard. Phase is
/// keyed to absolute pixel coordinates, so the pattern lines up across
/// chunk and draw-call boundaries.
#[derive(Debug, Clone, Copy)]
pub struct TwoBit {
    pub threshold_1_5: f64,
    pub threshold_2: f64,
    pub threshold_2_5: f64,
    pub threshold_3: f64,
    pub threshold_3_5: f64,
    pub threshold_4: f64,
}

impl Default for TwoBit {
    fn default() -> Self {
        Self {
            threshold_1_5: 0.15,
            threshold_2: 0.3,
            threshold_2_5: 0.45,
            threshold_3: 0.55,
            threshold_3_5: 0.7,
            threshold_4: 0.8,
        }
    }
}

impl Indexizer for TwoBit {
    fn indexize(&self, intensity: f64, x: i32, y: i32) -> u8 {
        let (mut color, dither) = if intensity >= self.threshold_4 {
            (4, false)
        } else if intensity >= self.threshold_3_5 {
            (4, true)
        } else if intensity >= self.threshold_3 {
            (3, false)
        } else if intensity >= self.threshold_2_5 {
            (3, true)
        } else if intensity >= self.threshold_2 {
            (2, false)
        } else if intensity >= self.threshold_1_5 {
            (2, true)
        } else {
            (1, false)
        };
        if dither && (x & 1) == (y & 1) {
            color -= 1;
        }
        color
    }
}

/// Sample an indexed image, treating out-of-range coordinates and
/// index 0 as transparent.
fn sample(atlas: &IndexedImage, cx: i32, cy: i32) -> Option<u8> {
    if cx < 0 || cy < 0 || cx as usize >= atlas.width || cy as usize >= atlas.height {
        return None;
    }
    match atlas.pixels[cx as usize + cy as usize * atlas.width] {
        0 => None,
        c => Some(c),
    }
}

#[inline]
fn light_and_indexize(
    lights: &dyn Lights,
    indexizer: &dyn Indexizer,
    val: u8,
    x: i32,
    y: i32,
) -> u8 {
    let intensity = lights.light(val, x, y);
    indexizer.indexize(intensity, x, y)
}

/// Shader sampling the inclusive region `(tx0, ty0)..=(tx1, ty1)` of
/// an indexed atlas across a rectangle's percentage span.
pub fn rect_shader_indexed(
    atlas: Arc<IndexedImage>,
    tx0: i32,
    ty0: i32,
    tx1: i32,
    ty1: i32,
    lights: Arc<dyn Lights>,
    indexizer: Arc<dyn Indexizer>,
) -> RectShader {
    let tw = (tx1 - tx0) as f64 + 1.0;
    let th = (ty1 - ty0) as f64 + 1.0;
    Arc::new(move |f: &RectFragment| {
        let cx = (tw * f.px) as i32 + tx0;
        let cy = (th * f.py) as i32 + ty0;
        let c = sample(&atlas, cx, cy)?;
        Some(light_and_indexize(&*lights, &*indexizer, c, f.x, f.y))
    })
}

/// Shader interpolating texel coordinates across a triangle with
/// affine barycentric weights.
pub fn tri_shader_indexed(
    atlas: Arc<IndexedImage>,
    tex: [(i32, i32); 3],
    lights: Arc<dyn Lights>,
    indexizer: Arc<dyn Indexizer>,
) -> TriShader {
    let t = tex.map(|(x, y)| (x as f64, y as f64));
    Arc::new(move |f: &TriFragment| {
        let cx = (t[0].0 * f.w0 + t[1].0 * f.w1 + t[2].0 * f.w2) as i32;
        let cy = (t[0].1 * f.w0 + t[1].1 * f.w1 + t[2].1 * f.w2) as i32;
        let c = sample(&atlas, cx, cy)?;
        Some(light_and_indexize(&*lights, &*indexizer, c, f.x, f.y))
    })
}

/// Perspective-correct variant of [`tri_shader_indexed`]: texel
/// coordinates are premultiplied by each vertex's reciprocal-depth
/// factor and divided by the interpolated reciprocal depth per pixel.
pub fn persp_tri_shader_indexed(
    atlas: Arc<IndexedImage>,
    tex: [(i32, i32); 3],
    z: [f64; 3],
    lights: Arc<dyn Lights>,
    indexizer: Arc<dyn Indexizer>,
) -> TriShader {
    let t = [
        (tex[0].0 as f64 * z[0], tex[0].1 as f64 * z[0]),
        (tex[1].0 as f64 * z[1], tex[1].1 as f64 * z[1]),
        (tex[2].0 as f64 * z[2], tex[2].1 as f64 * z[2]),
    ];
    Arc::new(move |f: &TriFragment| {
        let rz = 1.0 / (z[0] * f.w0 + z[1] * f.w1 + z[2] * f.w2);
        let cx = ((t[0].0 * f.w0 + t[1].0 * f.w1 + t[2].0 * f.w2) * rz) as i32;
        let cy = ((t[0].1 * f.w0 + t[1].1 * f.w1 + t[2].1 * f.w2) * rz) as i32;
        let c = sample(&atlas, cx, cy)?;
        Some(light_and_indexize(&*lights, &*indexizer, c, f.x, f.y))
    })
}
