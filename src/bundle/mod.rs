//! Asset bundle access
//!
//! Parsing and serializing the Unity bundle container is the job of an
//! external codec. This module defines the seam the rest of the crate
//! talks to:
//! - [`BundleCodec`] opens a bundle file into a [`BundleEnvironment`]
//! - the environment lists its objects and hands out [`TextureObject`]s
//! - [`open_texture`] finds the first `Texture2D`, probing the alternate
//!   location once when the primary bundle has none (locator.rs)

pub mod locator;
#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Error, Result};

pub use locator::{copy_bundle, BundleLocator, Locate};

/// Codec type name of 2D textures
pub const TEXTURE_2D: &str = "Texture2D";

/// Pixel formats a texture can be re-encoded to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Alpha8,
    Rgb24,
    Rgba32,
    Argb32,
}

/// Compression applied when a bundle is serialized back to disk
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Packer {
    #[serde(alias = "NONE", alias = "None")]
    None,
    #[default]
    #[serde(alias = "LZ4", alias = "Lz4")]
    Lz4,
    #[serde(alias = "LZMA", alias = "Lzma")]
    Lzma,
    /// Keep whatever compression the bundle was loaded with
    #[serde(alias = "ORIGINAL", alias = "Original")]
    Original,
}

impl Packer {
    pub fn as_str(self) -> &'static str {
        match self {
            Packer::None => "none",
            Packer::Lz4 => "lz4",
            Packer::Lzma => "lzma",
            Packer::Original => "original",
        }
    }
}

impl fmt::Display for Packer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for Packer {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Packer::None),
            "lz4" => Ok(Packer::Lz4),
            "lzma" => Ok(Packer::Lzma),
            "original" => Ok(Packer::Original),
            other => Err(format!("unknown packer: {other}")),
        }
    }
}

/// Type tag of an object stored in a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Texture2D,
    Other(String),
}

impl ObjectKind {
    pub fn from_type_name(name: &str) -> Self {
        if name == TEXTURE_2D {
            ObjectKind::Texture2D
        } else {
            ObjectKind::Other(name.to_string())
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            ObjectKind::Texture2D => TEXTURE_2D,
            ObjectKind::Other(name) => name,
        }
    }
}

/// One entry of a bundle's object table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub path_id: i64,
    pub kind: ObjectKind,
}

/// A decoded texture inside an open bundle
pub trait TextureObject {
    /// Decode the texture into RGBA pixels
    fn image(&self) -> std::result::Result<RgbaImage, CodecError>;

    /// Width and height stored in the texture metadata
    fn dimensions(&self) -> (u32, u32);

    fn set_dimensions(&mut self, width: u32, height: u32);

    /// Encode new pixel data, generating `mipmap_count` mip levels
    fn set_image(
        &mut self,
        image: &RgbaImage,
        format: TextureFormat,
        mipmap_count: u32,
    ) -> std::result::Result<(), CodecError>;

    /// Write the texture back into its environment
    fn save(&mut self) -> std::result::Result<(), CodecError>;
}

/// An opened bundle, held in memory until serialized
pub trait BundleEnvironment {
    fn objects(&self) -> &[ObjectInfo];

    fn read_texture(
        &mut self,
        index: usize,
    ) -> std::result::Result<Box<dyn TextureObject + '_>, CodecError>;

    /// Serialize the whole bundle with the given compression
    fn save(&mut self, packer: Packer) -> std::result::Result<Vec<u8>, CodecError>;

    /// Index of the first `Texture2D` object, if any
    fn first_texture(&self) -> Option<usize> {
        self.objects()
            .iter()
            .position(|object| object.kind == ObjectKind::Texture2D)
    }
}

/// Entry point of a bundle codec implementation
pub trait BundleCodec: Send + Sync {
    fn open(&self, path: &Path) -> std::result::Result<Box<dyn BundleEnvironment>, CodecError>;
}

/// A bundle opened on the slot that actually holds the texture
pub struct TextureBundle {
    pub path: PathBuf,
    pub environment: Box<dyn BundleEnvironment>,
    pub texture_index: usize,
    /// The texture was found in the alternate location
    pub used_alt: bool,
}

impl TextureBundle {
    /// Decode the bundle's texture
    pub fn read_image(&mut self) -> Result<RgbaImage> {
        let path = self.path.clone();
        let texture = self
            .environment
            .read_texture(self.texture_index)
            .map_err(|source| Error::Codec {
                path: path.clone(),
                source,
            })?;
        texture.image().map_err(|source| Error::Codec { path, source })
    }
}

impl fmt::Debug for TextureBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureBundle")
            .field("path", &self.path)
            .field("texture_index", &self.texture_index)
            .field("used_alt", &self.used_alt)
            .finish()
    }
}

/// Open the bundle for `code` and find its first `Texture2D`.
///
/// When the primary bundle is missing or holds no texture, the alternate
/// location is tried exactly once. Failing there is terminal.
pub fn open_texture<C, L>(codec: &C, locator: &L, code: &str, use_alt: bool) -> Result<TextureBundle>
where
    C: BundleCodec + ?Sized,
    L: Locate + ?Sized,
{
    let mut use_alt = use_alt;
    loop {
        let path = locator.locate(code, use_alt)?;

        if path.is_file() {
            let environment = codec.open(&path).map_err(|source| Error::Codec {
                path: path.clone(),
                source,
            })?;

            if let Some(texture_index) = environment.first_texture() {
                tracing::debug!("📦 Found Texture2D in {}", path.display());
                return Ok(TextureBundle {
                    path,
                    environment,
                    texture_index,
                    used_alt: use_alt,
                });
            }
        }

        if use_alt {
            return Err(Error::AssetNotFound {
                bundle: code.to_string(),
            });
        }

        tracing::warn!("⚠️  No Texture2D in {}, trying the alternate location", path.display());
        use_alt = true;
    }
}
