//! Display orchestration.
//!
//! A [`Display`] owns the indexed screen buffer, the RGBA output
//! buffer, the rasterizer pool and the loaded atlases, and satisfies
//! sprite draw requests by binding shaders over atlas regions.

mod atlas;

pub use atlas::{AtlasError, AtlasManifest, Sprite, SpriteDef};

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::image::{FromImageOpts, IndexedImage};
use crate::lights::{Lights, FULL_LIGHT};
use crate::palette::{palettes_2bit, Palette};
use crate::rasterizer::{Rasterizer, RectangleInfo};
use crate::shader::{rect_shader_indexed, Indexizer, TwoBit};

/// Options for [`Display::draw_sprite_advanced`]. Zero source/dest
/// extents default from the sprite metadata.
#[derive(Debug, Clone, Default)]
pub struct DrawSpriteOpts {
    /// Sprite name in `"atlas.sprite"` format.
    pub name: String,

    /// Source rectangle within the sprite, pixels.
    pub sx: f64,
    pub sy: f64,
    pub sw: f64,
    pub sh: f64,

    /// Destination rectangle in the screen buffer, pixels.
    pub dx: f64,
    pub dy: f64,
    pub dw: f64,
    pub dh: f64,
}

pub struct Display {
    pub screen: IndexedImage,
    pub rgba: Vec<u8>,
    pub palette: Palette,
    pub rasterizer: Rasterizer,
    pub atlases: HashMap<String, Arc<IndexedImage>>,
    pub sprites: HashMap<String, Sprite>,
    pub lights: Arc<dyn Lights>,
    pub indexizer: Arc<dyn Indexizer>,

    reported_sprites: HashSet<String>,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            screen: IndexedImage::new(0, 0, 4),
            rgba: Vec::new(),
            palette: palettes_2bit()["cga1"].clone(),
            rasterizer: Rasterizer::default(),
            atlases: HashMap::new(),
            sprites: HashMap::new(),
            lights: Arc::new(FULL_LIGHT),
            indexizer: Arc::new(TwoBit::default()),
            reported_sprites: HashSet::new(),
        }
    }
}

impl Display {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)allocate the indexed screen buffer and the RGBA output
    /// buffer for the given layout.
    pub fn init_buffers(&mut self, width: usize, height: usize) {
        self.screen = IndexedImage::new(width, height, 4);
        self.rgba = vec![0; width * height * 4];
    }

    /// Convert the indexed screen to RGBA through the active palette.
    pub fn to_rgba(&mut self) -> &[u8] {
        self.screen.to_rgba_into(&self.palette, &mut self.rgba);
        &self.rgba
    }

    /// Load an atlas from a RON manifest; the referenced image path is
    /// resolved relative to the manifest file.
    pub fn load_atlas<P: AsRef<Path>>(&mut self, path: P) -> Result<(), AtlasError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let manifest: AtlasManifest = ron::from_str(&contents)?;

        let file = manifest.file.replace('\\', "/");
        let image_path = path
            .parent()
            .map(|p| p.join(&file))
            .unwrap_or_else(|| PathBuf::from(&file));
        let img = image::open(&image_path)?;
        let indexed = IndexedImage::from_image(&img, FromImageOpts::default());

        self.add_atlas(&manifest, indexed);
        Ok(())
    }

    /// Register an atlas image and its sprites. Returns the atlas
    /// name the sprites were registered under.
    pub fn add_atlas(&mut self, manifest: &AtlasManifest, image: IndexedImage) -> String {
        let name = manifest.atlas_name();
        let atlas = Arc::new(image);
        self.atlases.insert(name.clone(), Arc::clone(&atlas));
        for def in &manifest.sprites {
            self.add_sprites(&atlas, def, &name);
        }
        name
    }

    /// Lay out one sprite row definition as a grid: left to right from
    /// the offset, wrapping at the atlas right edge, clipping the
    /// final row and column to the atlas bounds.
    fn add_sprites(&mut self, atlas: &Arc<IndexedImage>, def: &SpriteDef, prefix: &str) {
        let (mut x, mut y) = (def.xoffs, def.yoffs);
        for name in &def.names {
            let mut sprite = Sprite {
                atlas: Arc::clone(atlas),
                x,
                y,
                width: def.width,
                height: def.height,
                x_origin: def.xorig,
                y_origin: def.yorig,
            };
            let mut last = false;
            x += def.width;
            if x >= atlas.width as i32 {
                sprite.width = atlas.width as i32 - sprite.x;
                x = 0;
                y += sprite.height;
                if y >= atlas.height as i32 {
                    sprite.height = atlas.height as i32 - sprite.y;
                    last = true;
                }
            }
            self.sprites.insert(format!("{prefix}.{name}"), sprite);
            if last {
                break;
            }
        }
    }

    /// Draw a sprite at a position (offset by its origin).
    pub fn draw_sprite(&mut self, name: &str, x: f64, y: f64) {
        self.draw_sprite_advanced(DrawSpriteOpts {
            name: name.to_string(),
            dx: x,
            dy: y,
            ..Default::default()
        });
    }

    /// Draw a sub-region of a sprite, optionally scaled. A missing
    /// sprite name logs once and leaves the frame untouched.
    pub fn draw_sprite_advanced(&mut self, mut o: DrawSpriteOpts) {
        let sprite = match self.sprites.get(&o.name) {
            Some(sprite) => sprite.clone(),
            None => {
                self.report_sprite(&o.name);
                return;
            }
        };
        if o.sw == 0.0 {
            o.sw = sprite.width as f64;
        }
        if o.sh == 0.0 {
            o.sh = sprite.height as f64;
        }
        if o.dw == 0.0 {
            o.dw = o.sw;
        }
        if o.dh == 0.0 {
            o.dh = o.sh;
        }

        let tx0 = sprite.x + o.sx as i32;
        let ty0 = sprite.y + o.sy as i32;
        let shader = rect_shader_indexed(
            Arc::clone(&sprite.atlas),
            tx0,
            ty0,
            tx0 + o.sw as i32 - 1,
            ty0 + o.sh as i32 - 1,
            Arc::clone(&self.lights),
            Arc::clone(&self.indexizer),
        );
        self.rasterizer.draw_rectangle(
            &mut self.screen,
            RectangleInfo {
                shader,
                chunk_bits: 0,
                x: o.dx - sprite.x_origin as f64,
                y: o.dy - sprite.y_origin as f64,
                w: o.dw,
                h: o.dh,
            },
        );
    }

    /// Log a missing sprite once per unique name; repeat draws of the
    /// same bad name stay silent.
    fn report_sprite(&mut self, name: &str) {
        if self.reported_sprites.insert(name.to_string()) {
            warn!("sprite {name} is not loaded; sprite name format is \"atlas.sprite\"");
        }
    }

    #[cfg(test)]
    fn reported_sprite_count(&self) -> usize {
        self.reported_sprites.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_atlas(width: usize, height: usize, value: u8) -> IndexedImage {
        let mut iim = IndexedImage::new(width, height, 255);
        iim.fill(value);
        iim
    }

    fn manifest(names: &[&str], width: i32, height: i32) -> AtlasManifest {
        AtlasManifest {
            name: Some("spr".to_string()),
            file: String::new(),
            sprites: vec![SpriteDef {
                width,
                height,
                xoffs: 0,
                yoffs: 0,
                xorig: 0,
                yorig: 0,
                names: names.iter().map(|s| s.to_string()).collect(),
            }],
        }
    }

    #[test]
    fn grid_layout_wraps_and_clips() {
        // Two 16x16 cells fit a 32x16 atlas; the third would start a
        // new row below the atlas and is clipped away.
        let mut d = Display::new();
        d.add_atlas(&manifest(&["one", "two", "three"], 16, 16), flat_atlas(32, 16, 255));
        let one = &d.sprites["spr.one"];
        assert_eq!((one.x, one.y, one.width, one.height), (0, 0, 16, 16));
        let two = &d.sprites["spr.two"];
        assert_eq!((two.x, two.y, two.width, two.height), (16, 0, 16, 16));
        assert!(!d.sprites.contains_key("spr.three"));
    }

    #[test]
    fn grid_layout_wraps_to_second_row() {
        let mut d = Display::new();
        d.add_atlas(&manifest(&["a", "b", "c"], 16, 16), flat_atlas(32, 32, 255));
        let c = &d.sprites["spr.c"];
        assert_eq!((c.x, c.y), (0, 16));
    }

    #[test]
    fn draw_sprite_writes_lit_pixels_at_position() {
        let mut d = Display::new();
        d.init_buffers(32, 32);
        d.add_atlas(&manifest(&["one"], 8, 8), flat_atlas(8, 8, 255));
        d.draw_sprite("spr.one", 4.0, 6.0);

        // Full light on a max-value texel quantizes to the top level.
        assert_eq!(d.screen.pixels[6 * 32 + 4], 4);
        assert_eq!(d.screen.pixels[13 * 32 + 11], 4);
        assert_eq!(d.screen.pixels[14 * 32 + 4], 0);
        let filled = d.screen.pixels.iter().filter(|&&p| p == 4).count();
        assert_eq!(filled, 64);
    }

    #[test]
    fn sprite_origin_offsets_destination() {
        let mut d = Display::new();
        d.init_buffers(32, 32);
        let mut m = manifest(&["one"], 8, 8);
        m.sprites[0].xorig = 4;
        m.sprites[0].yorig = 4;
        d.add_atlas(&m, flat_atlas(8, 8, 255));
        // Origin-centered draw at (16, 16) covers 12..=19 on each axis.
        d.draw_sprite("spr.one", 16.0, 16.0);
        assert_eq!(d.screen.pixels[12 * 32 + 12], 4);
        assert_eq!(d.screen.pixels[11 * 32 + 12], 0);
        assert_eq!(d.screen.pixels[19 * 32 + 19], 4);
    }

    #[test]
    fn transparent_texels_do_not_composite() {
        let mut d = Display::new();
        d.init_buffers(16, 16);
        d.screen.fill(2);
        d.add_atlas(&manifest(&["hole"], 4, 4), flat_atlas(4, 4, 0));
        d.draw_sprite("spr.hole", 0.0, 0.0);
        assert!(d.screen.pixels.iter().all(|&p| p == 2));
    }

    #[test]
    fn missing_sprite_is_a_silent_noop_reported_once() {
        let mut d = Display::new();
        d.init_buffers(16, 16);
        for _ in 0..100 {
            d.draw_sprite("spr.ghost", 2.0, 2.0);
        }
        d.draw_sprite("spr.other", 2.0, 2.0);
        assert!(d.screen.pixels.iter().all(|&p| p == 0));
        assert_eq!(d.reported_sprite_count(), 2);
    }

    #[test]
    fn to_rgba_uses_active_palette() {
        let mut d = Display::new();
        d.init_buffers(2, 1);
        d.palette = palettes_2bit()["red-cyan"].clone();
        d.screen.pixels[1] = 2;
        let rgba = d.to_rgba().to_vec();
        assert_eq!(&rgba[0..4], &[0, 0, 0, 0]);
        assert_eq!(&rgba[4..8], &[0xff, 0x00, 0x00, 255]);
    }
}
