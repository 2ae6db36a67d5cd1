//! Parallel tiled rasterizer.
//!
//! Each draw call is split into square chunks (8x8 by default) that a
//! persistent worker pool processes concurrently. Chunks of one call
//! write disjoint pixel regions, and the caller blocks until all of
//! them complete, so no locking is needed on the target buffer.

mod pool;
mod rectangle;
mod triangle;

pub use pool::Rasterizer;
pub use rectangle::{RectFragment, RectShader, RectangleInfo};
pub use triangle::{TriFragment, TriShader, TriangleInfo};

pub(crate) use pool::{Chunk, SharedPixels, WaitGroup};

/// Default raster chunk size in bits (3 -> 8x8 pixels).
pub const DEFAULT_CHUNK_BITS: u32 = 3;

const SNAP_BIAS: f64 = 1.0 - 1e-9;

/// Snap a coordinate to a whole pixel with an epsilon-biased floor:
/// values within 1e-9 of an integer map to it, anything else rounds
/// up. Stable for coordinates that are already integral.
pub(crate) fn snap(v: f64) -> f64 {
    (v + SNAP_BIAS).floor()
}

#[cfg(test)]
mod tests {
    use super::snap;

    #[test]
    fn snap_is_stable_for_integers() {
        assert_eq!(snap(2.0), 2.0);
        assert_eq!(snap(0.0), 0.0);
        assert_eq!(snap(-3.0), -3.0);
    }

    #[test]
    fn snap_absorbs_tiny_error() {
        assert_eq!(snap(2.0 + 1e-12), 2.0);
        assert_eq!(snap(2.0 - 1e-12), 2.0);
    }

    #[test]
    fn snap_rounds_fractions_up() {
        assert_eq!(snap(2.25), 3.0);
        assert_eq!(snap(2.75), 3.0);
        assert_eq!(snap(-0.5), 0.0);
    }
}
