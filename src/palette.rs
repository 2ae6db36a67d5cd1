//! Palettes: ordered RGB triplets plus the built-in 2-bit palette table.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;

/// An ordered sequence of RGB triplets. Index 1 maps to the first
/// triplet; index 0 means no color (fully transparent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette(Vec<u8>);

impl Palette {
    /// Wrap raw triplet data. Length must be a multiple of 3.
    pub fn new(data: Vec<u8>) -> Self {
        assert!(
            data.len() % 3 == 0,
            "Palette::new: data length must be a multiple of 3"
        );
        Self(data)
    }

    /// Number of colors in the palette.
    pub fn color_count(&self) -> usize {
        self.0.len() / 3
    }

    /// Write the RGBA value for a palette index into `dest` (4 bytes).
    /// Index 0 and out-of-range indices produce a fully transparent
    /// pixel.
    pub fn colorize(&self, dest: &mut [u8], index: u8) {
        let mut rgba = [0u8; 4];
        if index > 0 && (index as usize) <= self.color_count() {
            let i = (index as usize - 1) * 3;
            rgba[..3].copy_from_slice(&self.0[i..i + 3]);
            rgba[3] = 255;
        }
        dest[..4].copy_from_slice(&rgba);
    }
}

macro_rules! pal {
    ($($v:expr),* $(,)?) => { Palette(vec![$($v),*]) };
}

/// Built-in 4-color (2-bit) palettes. Entry 0 of every palette is
/// black by convention; transparency is signaled separately by pixel
/// value 0.
static PALETTES_2BIT: Lazy<HashMap<&'static str, Palette>> = Lazy::new(|| {
    HashMap::from([
        ("cga1", pal![0x0, 0x0, 0x0, 0xff, 0x55, 0xff, 0x55, 0xff, 0xff, 0xff, 0xff, 0xff]),
        ("cga2", pal![0x0, 0x0, 0x0, 0xff, 0x55, 0x55, 0x55, 0xff, 0x55, 0xff, 0xff, 0x55]),
        ("red-cyan", pal![0x0, 0x0, 0x0, 0xff, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff]),
        ("magenta-green", pal![0x0, 0x0, 0x0, 0xff, 0x00, 0xff, 0x00, 0xff, 0x00, 0xff, 0xff, 0xff]),
        ("navy-yellow", pal![0x0, 0x0, 0x0, 0x00, 0x00, 0xff, 0xff, 0xff, 0x00, 0xff, 0xff, 0xff]),
        ("grey-red", pal![0x0, 0x0, 0x0, 0x77, 0x77, 0x77, 0xff, 0x00, 0x00, 0xff, 0xff, 0xff]),
        ("magenta-pink", pal![0x0, 0x0, 0x0, 0x33, 0x11, 0x55, 0xff, 0x55, 0x55, 0xff, 0xff, 0xff]),
        ("blue-orange", pal![0x0, 0x0, 0x0, 0x44, 0x44, 0xff, 0xff, 0x77, 0x00, 0xff, 0xff, 0xff]),
        ("desert", pal![0x0, 0x0, 0x0, 0xaa, 0x44, 0x22, 0xff, 0x77, 0x44, 0xff, 0xff, 0xff]),
        ("frozen", pal![0x0, 0x0, 0x0, 0x22, 0x00, 0x77, 0x00, 0x77, 0xee, 0xff, 0xff, 0xff]),
        ("volcanic", pal![0x0, 0x0, 0x0, 0x33, 0x33, 0x33, 0xff, 0x33, 0x00, 0xff, 0xff, 0xff]),
        ("acid1", pal![0x0, 0x0, 0x0, 0x55, 0x00, 0x55, 0x00, 0x77, 0x00, 0x00, 0xff, 0xff]),
        ("malachite", pal![0x0, 0x0, 0x0, 0x00, 0x44, 0x22, 0x00, 0xff, 0xaa, 0xff, 0xff, 0xff]),
        ("green-blood", pal![0x0, 0x0, 0x0, 0x66, 0x00, 0x00, 0x00, 0xff, 0x00, 0xff, 0xff, 0xff]),
        ("pine", pal![0x0, 0x0, 0x0, 0x44, 0x22, 0x00, 0x22, 0x77, 0x22, 0xff, 0xff, 0xff]),
        ("darkmoon", pal![0x0, 0x0, 0x0, 0x00, 0x33, 0x33, 0x00, 0x77, 0x00, 0xff, 0xff, 0xff]),
        ("painted-leather", pal![0x0, 0x0, 0x0, 0x22, 0x55, 0x77, 0xbb, 0x44, 0x33, 0xff, 0xff, 0xff]),
    ])
});

static PALETTE_2BIT_NAMES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut names: Vec<_> = PALETTES_2BIT.keys().copied().collect();
    names.sort_unstable();
    names
});

/// The built-in table of named 2-bit palettes.
pub fn palettes_2bit() -> &'static HashMap<&'static str, Palette> {
    &PALETTES_2BIT
}

/// Names of all built-in 2-bit palettes, sorted.
pub fn palette_2bit_names() -> &'static [&'static str] {
    &PALETTE_2BIT_NAMES
}

/// Pick a random built-in palette name.
pub fn random_palette_2bit_name() -> &'static str {
    PALETTE_2BIT_NAMES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("cga1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorize_round_trip() {
        let pal = &palettes_2bit()["cga1"];
        assert_eq!(pal.color_count(), 4);

        let mut dest = [0xaau8; 4];
        pal.colorize(&mut dest, 0);
        assert_eq!(dest, [0, 0, 0, 0]);

        pal.colorize(&mut dest, 2);
        assert_eq!(dest, [0xff, 0x55, 0xff, 255]);

        pal.colorize(&mut dest, 4);
        assert_eq!(dest, [0xff, 0xff, 0xff, 255]);

        // Out of range falls back to transparent.
        pal.colorize(&mut dest, 5);
        assert_eq!(dest, [0, 0, 0, 0]);
    }

    #[test]
    fn every_builtin_palette_has_four_colors_starting_black() {
        for (name, pal) in palettes_2bit() {
            assert_eq!(pal.color_count(), 4, "palette {name}");
            let mut dest = [0u8; 4];
            pal.colorize(&mut dest, 1);
            assert_eq!(&dest[..3], &[0, 0, 0], "palette {name} entry 0");
        }
    }

    #[test]
    fn random_name_resolves() {
        let name = random_palette_2bit_name();
        assert!(palettes_2bit().contains_key(name));
    }
}
