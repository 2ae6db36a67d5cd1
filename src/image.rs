//! Palette-indexed image buffer
//!
//! The fundamental pixel container for both source textures and the
//! render target. One byte per pixel; value 0 is reserved for "no
//! color" and is skipped when compositing.

use crate::palette::Palette;

/// An image in indexed color mode.
#[derive(Debug, Clone)]
pub struct IndexedImage {
    pub width: usize,
    pub height: usize,

    /// Pixels of the image, 1 byte per pixel. Color 0 is reserved for
    /// no color. Invariant: `pixels.len() == width * height`.
    pub pixels: Vec<u8>,

    /// Number of colors the image uses (indices 1..=colors).
    pub colors: u8,
}

/// Options for [`IndexedImage::from_image`].
#[derive(Debug, Clone, Copy)]
pub struct FromImageOpts {
    /// Number of levels to produce (1..=255).
    pub colors: u8,

    /// Alpha below this (0-1) is considered invisible. Negative
    /// produces no invisible pixels.
    pub alpha_threshold: f64,
}

impl Default for FromImageOpts {
    fn default() -> Self {
        Self {
            colors: 255,
            alpha_threshold: 0.5,
        }
    }
}

impl IndexedImage {
    /// Create a blank (fully transparent) image.
    pub fn new(width: usize, height: usize, colors: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
            colors,
        }
    }

    /// Convert a decoded image to indexed mode.
    ///
    /// The image is reduced to grayscale intensity, then intensity maps
    /// linearly onto `1..=colors`. Pixels whose alpha falls below the
    /// threshold become 0 (invisible), as do fully black pixels.
    pub fn from_image(img: &image::DynamicImage, opts: FromImageOpts) -> Self {
        let rgba = img.to_rgba8();
        let (w, h) = rgba.dimensions();
        let colors = if opts.colors == 0 { 255 } else { opts.colors };
        let mut iim = Self::new(w as usize, h as usize, colors);
        let levels = colors as f64 + 1.0;

        for (i, px) in rgba.pixels().enumerate() {
            let [r, g, b, a] = px.0;
            if (a as f64 / 255.0) < opts.alpha_threshold {
                continue;
            }
            let intensity =
                (r as f64 * 0.21 + g as f64 * 0.72 + b as f64 * 0.07) / 255.0;
            // Keep strictly below 1.0 so the top level maps to `colors`.
            let intensity = intensity.clamp(0.0, 1.0 - f64::EPSILON);
            iim.pixels[i] = (intensity * levels).min(colors as f64) as u8;
        }
        iim
    }

    /// Fill every pixel with the given index.
    pub fn fill(&mut self, v: u8) {
        self.pixels.fill(v);
    }

    /// Convert to an RGBA byte buffer (4 bytes per pixel) using the
    /// given palette.
    pub fn to_rgba(&self, palette: &Palette) -> Vec<u8> {
        let mut out = vec![0; self.pixels.len() * 4];
        self.to_rgba_into(palette, &mut out);
        out
    }

    /// Convert into an existing RGBA buffer to avoid allocation.
    ///
    /// # Panics
    ///
    /// Panics if `out` is not exactly 4x the pixel count.
    pub fn to_rgba_into(&self, palette: &Palette, out: &mut [u8]) {
        assert_eq!(
            out.len(),
            self.pixels.len() * 4,
            "IndexedImage::to_rgba_into: buffer size mismatch (got {}, expected {})",
            out.len(),
            self.pixels.len() * 4,
        );
        for (i, &px) in self.pixels.iter().enumerate() {
            palette.colorize(&mut out[i * 4..i * 4 + 4], px);
        }
    }
}
