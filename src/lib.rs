//! Quadtone: a software rasterizer for low-bit-depth indexed 2D graphics.
//!
//! Everything renders on the CPU into a palette-indexed byte buffer:
//! - Rectangle and triangle scan conversion with barycentric /
//!   perspective-correct interpolation
//! - A persistent worker pool that splits every draw call into 8x8
//!   chunks processed concurrently
//! - Per-pixel shading: texture sample -> dynamic lighting -> 2-bit
//!   palette quantization with ordered dithering
//! - Point lights with quadratic falloff tracking application objects

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod align;
pub mod display;
pub mod image;
pub mod lights;
pub mod palette;
pub mod rasterizer;
pub mod shader;

pub use display::{AtlasManifest, Display, DrawSpriteOpts, Sprite, SpriteDef};
pub use image::{FromImageOpts, IndexedImage};
pub use lights::{CircleSource, FixedLight, LightSet, LightSource, Lights, Tracked, FULL_LIGHT};
pub use palette::Palette;
pub use rasterizer::{Rasterizer, RectangleInfo, TriangleInfo};
pub use shader::{Indexizer, TwoBit};
