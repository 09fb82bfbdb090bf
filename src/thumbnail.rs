use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{imageops, RgbaImage};
use tokio::sync::Semaphore;

use crate::bundle::{open_texture, BundleCodec, Locate};
use crate::error::{Error, Result};
use crate::imaging::{resize, save_png};
use crate::regions::{self, Region};
use crate::state::data::{Asset, Category, SlotSize};

/// Card list thumbnails
pub const CARD_THUMB_SIZE: (u32, u32) = (128, 128);
pub const SLEEVE_THUMB_SIZE: (u32, u32) = (256, 375);
pub const FIELD_THUMB_SIZE: (u32, u32) = (256, 256);

/// Default number of bundles decoded at the same time
pub const DEFAULT_WORKERS: usize = 4;

/// A decoded, resized bundle texture
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub code: String,
    pub image: RgbaImage,
    /// The texture came from the alternate location
    pub used_alt: bool,
}

/// One entry of a thumbnail refresh
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbRequest {
    pub code: String,
    pub size: (u32, u32),
    pub crop: Option<Region>,
}

impl ThumbRequest {
    pub fn new(code: impl Into<String>, size: (u32, u32)) -> Self {
        Self {
            code: code.into(),
            size,
            crop: None,
        }
    }

    pub fn with_crop(mut self, region: Region) -> Self {
        self.crop = Some(region);
        self
    }

    /// Listing thumbnail of an asset, taken from its medium bundle.
    /// Cards show only the medium artwork of their sheet.
    pub fn for_asset(asset: &Asset) -> Self {
        let request = match asset.category {
            Category::Card => ThumbRequest::new(&asset.medium_bundle, CARD_THUMB_SIZE),
            Category::Sleeve => ThumbRequest::new(&asset.medium_bundle, SLEEVE_THUMB_SIZE),
            Category::Field => ThumbRequest::new(&asset.medium_bundle, FIELD_THUMB_SIZE),
        };
        match regions::region(asset.category, SlotSize::Medium) {
            Some(region) => request.with_crop(region),
            None => request,
        }
    }
}

/// Decode a bundle's texture, crop it to `crop` and resize it to `size`.
/// Falls back to the alternate location once, like a replacement does.
pub fn fetch_bundle_thumb<C, L>(
    codec: &C,
    locator: &L,
    code: &str,
    size: (u32, u32),
    crop: Option<Region>,
) -> Result<Thumbnail>
where
    C: BundleCodec + ?Sized,
    L: Locate + ?Sized,
{
    let mut bundle = open_texture(codec, locator, code, false)?;
    let texture = bundle.read_image()?;

    let art = match crop {
        Some(region) => {
            let (width, height) = texture.dimensions();
            if !region.fits(width, height) {
                return Err(Error::RegionOutOfBounds {
                    bundle: code.to_string(),
                    region: region.as_tuple(),
                    width,
                    height,
                });
            }
            let (x, y) = region.top_left();
            let (w, h) = region.size();
            imageops::crop_imm(&texture, x, y, w, h).to_image()
        }
        None => texture,
    };

    Ok(Thumbnail {
        code: code.to_string(),
        image: resize(&art, size),
        used_alt: bundle.used_alt,
    })
}

/// Fetch many thumbnails in parallel.
///
/// At most `workers` bundles are decoded at once, each on a blocking
/// thread with its own buffers. Results come back in request order once
/// every request has finished.
pub async fn refresh_thumbnails<C, L>(
    codec: Arc<C>,
    locator: Arc<L>,
    requests: Vec<ThumbRequest>,
    workers: usize,
) -> Vec<Result<Thumbnail>>
where
    C: BundleCodec + 'static,
    L: Locate + 'static,
{
    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let total = requests.len();

    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let codec = Arc::clone(&codec);
            let locator = Arc::clone(&locator);
            let permits = Arc::clone(&permits);

            tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::Io(std::io::Error::other(e)))?;

                tokio::task::spawn_blocking(move || {
                    fetch_bundle_thumb(
                        codec.as_ref(),
                        locator.as_ref(),
                        &request.code,
                        request.size,
                        request.crop,
                    )
                })
                .await?
            })
        })
        .collect();

    let mut results = Vec::with_capacity(total);
    for handle in handles {
        results.push(handle.await.map_err(Error::from).and_then(|result| result));
    }

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        tracing::warn!("⚠️  {} of {} thumbnails failed", failed, total);
    } else {
        tracing::debug!("📸 Refreshed {} thumbnails", total);
    }
    results
}

/// Thumbnail cache directory, created on first use:
/// ~/.cache/texture-swap/thumbnails on Linux
pub fn thumbnail_cache_dir() -> Result<PathBuf> {
    let path = dirs_next::cache_dir()
        .or_else(dirs_next::home_dir)
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine cache directory",
            )
        })?
        .join("texture-swap")
        .join("thumbnails");

    fs::create_dir_all(&path)?;
    Ok(path)
}

/// Expected cache path of a thumbnail
pub fn thumbnail_path(dir: &Path, category: Category, code: &str) -> PathBuf {
    dir.join(category.subfolder()).join(format!("{code}.png"))
}

/// Store a thumbnail under `<dir>/<category>/<code>.png`
pub fn save_thumbnail(
    dir: &Path,
    category: Category,
    code: &str,
    image: &RgbaImage,
) -> Result<PathBuf> {
    let path = thumbnail_path(dir, category, code);
    save_png(image, &path)?;
    tracing::debug!("📸 Saved thumbnail: {}", path.display());
    Ok(path)
}
