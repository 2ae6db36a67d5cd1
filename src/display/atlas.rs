//! Sprite atlases.
//!
//! An atlas is an indexed image plus a RON manifest describing named
//! sprites laid out as a grid. Sprites are registered under
//! `"atlas.sprite"` names.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::image::IndexedImage;

/// A named sub-rectangle of an atlas plus a draw origin offset.
#[derive(Clone)]
pub struct Sprite {
    pub atlas: Arc<IndexedImage>,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub x_origin: i32,
    pub y_origin: i32,
}

/// Atlas manifest, stored as RON:
///
/// ```ron
/// (
///     name: Some("spr"),
///     file: "sprites.png",
///     sprites: [
///         (width: 16, height: 16, names: ["one", "two"]),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasManifest {
    /// Atlas name; defaults to the image file stem.
    #[serde(default)]
    pub name: Option<String>,

    /// Image file path, relative to the manifest.
    pub file: String,

    #[serde(default)]
    pub sprites: Vec<SpriteDef>,
}

/// One row of same-sized sprites, laid out left to right starting at
/// `(xoffs, yoffs)`, wrapping at the atlas right edge and clipping at
/// the bottom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteDef {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub xoffs: i32,
    #[serde(default)]
    pub yoffs: i32,
    #[serde(default)]
    pub xorig: i32,
    #[serde(default)]
    pub yorig: i32,
    pub names: Vec<String>,
}

impl AtlasManifest {
    /// The effective atlas name: explicit name, or the image file stem.
    pub fn atlas_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let file = self.file.replace('\\', "/");
        let stem = file
            .rsplit('/')
            .next()
            .unwrap_or(&file)
            .split('.')
            .next()
            .unwrap_or("")
            .to_string();
        stem
    }
}

/// Error type for atlas loading.
#[derive(Debug)]
pub enum AtlasError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    ImageError(image::ImageError),
}

impl From<std::io::Error> for AtlasError {
    fn from(e: std::io::Error) -> Self {
        AtlasError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for AtlasError {
    fn from(e: ron::error::SpannedError) -> Self {
        AtlasError::ParseError(e)
    }
}

impl From<image::ImageError> for AtlasError {
    fn from(e: image::ImageError) -> Self {
        AtlasError::ImageError(e)
    }
}

impl fmt::Display for AtlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtlasError::IoError(e) => write!(f, "IO error: {}", e),
            AtlasError::ParseError(e) => write!(f, "Parse error: {}", e),
            AtlasError::ImageError(e) => write!(f, "Image error: {}", e),
        }
    }
}

impl std::error::Error for AtlasError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_parses_from_ron() {
        let src = r#"
            (
                name: Some("spr"),
                file: "sprites.png",
                sprites: [
                    (width: 16, height: 16, xoffs: 0, yoffs: 0, names: ["one", "two"]),
                ],
            )
        "#;
        let manifest: AtlasManifest = ron::from_str(src).unwrap();
        assert_eq!(manifest.atlas_name(), "spr");
        assert_eq!(manifest.sprites.len(), 1);
        assert_eq!(manifest.sprites[0].names, vec!["one", "two"]);
        assert_eq!(manifest.sprites[0].xorig, 0);
    }

    #[test]
    fn atlas_name_defaults_to_file_stem() {
        let manifest: AtlasManifest =
            ron::from_str(r#"(file: "art\\tiles.png")"#).unwrap();
        assert_eq!(manifest.atlas_name(), "tiles");
        assert!(manifest.sprites.is_empty());
    }
}
