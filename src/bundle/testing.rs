//! Test double for the bundle codec.
//!
//! A fake bundle is a small header followed by a PNG of its texture, so
//! tests can seed bundles on disk and inspect what the engine wrote.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::RgbaImage;

use super::{
    BundleCodec, BundleEnvironment, BundleLocator, Locate, ObjectInfo, ObjectKind, Packer,
    TextureFormat, TextureObject,
};
use crate::error::{CodecError, Result};
use crate::imaging::encode_png;

const MAGIC: &[u8; 8] = b"TSWPBNDL";
const HEADER_LEN: usize = 8 + 1 + 4 + 1 + 4 + 4;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FakeBundle {
    pub image: Option<RgbaImage>,
    pub width: u32,
    pub height: u32,
    pub mipmap_count: u32,
    pub packer: Packer,
}

fn packer_id(packer: Packer) -> u8 {
    match packer {
        Packer::None => 0,
        Packer::Lz4 => 1,
        Packer::Lzma => 2,
        Packer::Original => 3,
    }
}

impl FakeBundle {
    fn new(image: Option<&RgbaImage>) -> Self {
        let (width, height) = image.map(|img| img.dimensions()).unwrap_or((0, 0));
        Self {
            image: image.cloned(),
            width,
            height,
            mipmap_count: 1,
            packer: Packer::Original,
        }
    }

    fn to_bytes(&self) -> std::result::Result<Vec<u8>, CodecError> {
        let mut bytes = Vec::with_capacity(HEADER_LEN);
        bytes.extend_from_slice(MAGIC);
        bytes.push(u8::from(self.image.is_some()));
        bytes.extend_from_slice(&self.mipmap_count.to_le_bytes());
        bytes.push(packer_id(self.packer));
        bytes.extend_from_slice(&self.width.to_le_bytes());
        bytes.extend_from_slice(&self.height.to_le_bytes());
        if let Some(image) = &self.image {
            let png = encode_png(image).map_err(|e| CodecError::Encode(e.to_string()))?;
            bytes.extend_from_slice(&png);
        }
        Ok(bytes)
    }

    fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, CodecError> {
        if bytes.len() < HEADER_LEN || &bytes[..8] != MAGIC {
            return Err(CodecError::Malformed("missing bundle header".into()));
        }
        let u32_at = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let packer = match bytes[13] {
            0 => Packer::None,
            1 => Packer::Lz4,
            2 => Packer::Lzma,
            _ => Packer::Original,
        };
        let image = if bytes[8] == 1 {
            let decoded = image::load_from_memory(&bytes[HEADER_LEN..])
                .map_err(|e| CodecError::Malformed(e.to_string()))?;
            Some(decoded.into_rgba8())
        } else {
            None
        };

        Ok(Self {
            image,
            width: u32_at(14),
            height: u32_at(18),
            mipmap_count: u32_at(9),
            packer,
        })
    }
}

/// Write a fake bundle holding `image`, or no texture at all
pub(crate) fn write_bundle(path: &Path, image: Option<&RgbaImage>) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, FakeBundle::new(image).to_bytes().unwrap()).unwrap();
}

pub(crate) fn read_bundle(path: &Path) -> FakeBundle {
    FakeBundle::from_bytes(&fs::read(path).unwrap()).unwrap()
}

/// Texture of a bundle on disk
pub(crate) fn read_bundle_image(path: &Path) -> RgbaImage {
    read_bundle(path).image.unwrap()
}

#[derive(Debug, Default)]
struct CodecStats {
    opens: AtomicUsize,
    saves: AtomicUsize,
}

/// Codec over [`FakeBundle`] files that counts opens and saves
#[derive(Debug, Clone, Default)]
pub(crate) struct PngCodec {
    stats: Arc<CodecStats>,
    fail_encode: bool,
}

impl PngCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// A codec whose `set_image` always fails
    pub fn failing_encode() -> Self {
        Self {
            fail_encode: true,
            ..Self::default()
        }
    }

    pub fn opens(&self) -> usize {
        self.stats.opens.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.stats.saves.load(Ordering::SeqCst)
    }
}

impl BundleCodec for PngCodec {
    fn open(&self, path: &Path) -> std::result::Result<Box<dyn BundleEnvironment>, CodecError> {
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        let bundle = FakeBundle::from_bytes(&fs::read(path)?)?;

        let mut objects = vec![ObjectInfo {
            path_id: 1,
            kind: ObjectKind::Other("AssetBundle".into()),
        }];
        if bundle.image.is_some() {
            objects.push(ObjectInfo {
                path_id: 2,
                kind: ObjectKind::Texture2D,
            });
        }

        Ok(Box::new(PngEnvironment {
            bundle,
            objects,
            stats: Arc::clone(&self.stats),
            fail_encode: self.fail_encode,
        }))
    }
}

struct PngEnvironment {
    bundle: FakeBundle,
    objects: Vec<ObjectInfo>,
    stats: Arc<CodecStats>,
    fail_encode: bool,
}

impl BundleEnvironment for PngEnvironment {
    fn objects(&self) -> &[ObjectInfo] {
        &self.objects
    }

    fn read_texture(
        &mut self,
        index: usize,
    ) -> std::result::Result<Box<dyn TextureObject + '_>, CodecError> {
        if self.objects.get(index).map(|o| &o.kind) != Some(&ObjectKind::Texture2D) {
            return Err(CodecError::Malformed(format!("object {index} is not a texture")));
        }
        let image = self
            .bundle
            .image
            .clone()
            .ok_or_else(|| CodecError::Malformed("texture has no data".into()))?;
        let (width, height) = (self.bundle.width, self.bundle.height);
        let fail_encode = self.fail_encode;

        Ok(Box::new(PngTexture {
            bundle: &mut self.bundle,
            image,
            width,
            height,
            pending: None,
            fail_encode,
        }))
    }

    fn save(&mut self, packer: Packer) -> std::result::Result<Vec<u8>, CodecError> {
        self.stats.saves.fetch_add(1, Ordering::SeqCst);
        self.bundle.packer = packer;
        self.bundle.to_bytes()
    }
}

struct PngTexture<'a> {
    bundle: &'a mut FakeBundle,
    image: RgbaImage,
    width: u32,
    height: u32,
    pending: Option<(RgbaImage, u32)>,
    fail_encode: bool,
}

impl TextureObject for PngTexture<'_> {
    fn image(&self) -> std::result::Result<RgbaImage, CodecError> {
        Ok(self.image.clone())
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn set_image(
        &mut self,
        image: &RgbaImage,
        format: TextureFormat,
        mipmap_count: u32,
    ) -> std::result::Result<(), CodecError> {
        if self.fail_encode {
            return Err(CodecError::Encode("simulated encoder failure".into()));
        }
        if format != TextureFormat::Rgba32 {
            return Err(CodecError::Encode(format!("{format:?} is not supported")));
        }
        self.pending = Some((image.clone(), mipmap_count));
        Ok(())
    }

    fn save(&mut self) -> std::result::Result<(), CodecError> {
        if let Some((image, mipmap_count)) = self.pending.take() {
            if image.dimensions() != (self.width, self.height) {
                return Err(CodecError::Malformed(format!(
                    "texture metadata {}x{} does not match {}x{} image",
                    self.width,
                    self.height,
                    image.width(),
                    image.height()
                )));
            }
            self.bundle.image = Some(image.clone());
            self.bundle.mipmap_count = mipmap_count;
            self.image = image;
        }
        self.bundle.width = self.width;
        self.bundle.height = self.height;
        Ok(())
    }
}

/// Locator that counts how often it was asked
#[derive(Debug)]
pub(crate) struct CountingLocator {
    pub inner: BundleLocator,
    calls: AtomicUsize,
}

impl CountingLocator {
    pub fn new(game_path: PathBuf, alt_path: Option<PathBuf>) -> Self {
        Self {
            inner: BundleLocator::new(game_path, alt_path),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Locate for CountingLocator {
    fn locate(&self, code: &str, use_alt: bool) -> Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.locate(code, use_alt)
    }
}
