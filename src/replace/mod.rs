//! Asset replacement engine
//!
//! One call to [`ReplaceEngine::replace`] walks every slot of a request
//! through locate → decode → composite → re-encode and keeps the encoded
//! bundles in memory. Only when every slot succeeded are the bundles
//! written, each with a single temp-file-and-rename, so a failure never
//! leaves a half-modified asset on disk.

mod composite;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use image::Rgba;

use crate::backup;
use crate::bundle::{open_texture, BundleCodec, BundleLocator, Locate, TextureFormat};
use crate::error::{CodecError, Error, Result};
use crate::imaging;
use crate::state::config::Settings;
use crate::state::data::{Category, Slot};
use composite::Artwork;

/// Pixel format every replaced texture is stored in
pub const REPLACEMENT_FORMAT: TextureFormat = TextureFormat::Rgba32;

/// Frame drawn around sleeve artwork
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Border {
    pub color: Rgba<u8>,
    /// Blend the frame into the artwork instead of a hard edge
    pub fade: bool,
}

impl Border {
    /// Border from a `#rrggbb` color
    pub fn parse(color: &str, fade: bool) -> Result<Self> {
        Ok(Self {
            color: imaging::parse_hex_color(color)?,
            fade,
        })
    }
}

/// How the user image is fitted into a card region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fit {
    /// Resize to the region, ignoring aspect ratio
    #[default]
    Stretch,
    /// Center crop to the region's ratio first
    Crop,
}

/// A single user action: put `source` into every slot of one asset
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceRequest {
    pub category: Category,
    pub slots: Vec<Slot>,
    pub source: PathBuf,
    /// Sleeves only
    pub border: Option<Border>,
    /// Cards only
    pub fit: Fit,
    /// Look in the alternate location first (the asset is known to be missing
    /// from the primary one)
    pub use_alt_location: bool,
}

impl ReplaceRequest {
    pub fn new(category: Category, slots: Vec<Slot>, source: impl Into<PathBuf>) -> Self {
        Self {
            category,
            slots,
            source: source.into(),
            border: None,
            fit: Fit::default(),
            use_alt_location: false,
        }
    }

    pub fn with_border(mut self, border: Border) -> Self {
        self.border = Some(border);
        self
    }

    pub fn with_fit(mut self, fit: Fit) -> Self {
        self.fit = fit;
        self
    }

    pub fn from_alt_location(mut self) -> Self {
        self.use_alt_location = true;
        self
    }
}

/// What a successful replacement touched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaceReport {
    /// Bundle files rewritten, in slot order
    pub written: Vec<PathBuf>,
    /// Bundle codes that were only found in the alternate location
    pub alt_bundles: Vec<String>,
}

/// A fully encoded bundle waiting to be written
struct StagedBundle {
    path: PathBuf,
    bytes: Vec<u8>,
    used_alt: bool,
}

/// Replaces textures inside bundles
pub struct ReplaceEngine<C, L = BundleLocator> {
    codec: C,
    locator: L,
    settings: Settings,
}

impl<C: BundleCodec> ReplaceEngine<C, BundleLocator> {
    /// Engine using the locator described by `settings`
    pub fn with_settings(codec: C, settings: Settings) -> Self {
        let locator = BundleLocator::from_settings(&settings);
        Self::new(codec, locator, settings)
    }
}

impl<C: BundleCodec, L: Locate> ReplaceEngine<C, L> {
    pub fn new(codec: C, locator: L, settings: Settings) -> Self {
        Self {
            codec,
            locator,
            settings,
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the texture of every slot in the request.
    ///
    /// With backups enabled, every slot must already have a backup.
    pub fn replace(&self, request: &ReplaceRequest) -> Result<ReplaceReport> {
        if request.slots.is_empty() {
            return Err(Error::EmptyRequest);
        }

        if self.settings.create_backup {
            if let Some(slot) = request
                .slots
                .iter()
                .find(|slot| !backup::has_backup(&self.settings, request.category, &slot.bundle))
            {
                return Err(Error::BackupRequired {
                    bundle: slot.bundle.clone(),
                });
            }
        }

        let source = imaging::open_rgba(&request.source)?;
        tracing::info!(
            "🎨 Replacing {} {} ({} slots) with {}",
            request.category,
            request.slots[0].bundle,
            request.slots.len(),
            request.source.display()
        );

        let artwork = Artwork::prepare(
            request.category,
            source,
            request.border.as_ref(),
            request.fit,
        );

        let mut report = ReplaceReport::default();
        let mut staged = Vec::with_capacity(request.slots.len());
        for slot in &request.slots {
            let bundle = self.stage(request.category, request.use_alt_location, &artwork, slot)?;
            staged.push((slot, bundle));
        }

        self.commit(staged, &mut report)?;
        Ok(report)
    }

    /// Put each slot's own source image back in place, all or nothing.
    ///
    /// Every slot is decoded and re-encoded before the first bundle is
    /// written. Sources go in unchanged: no border, stretch fit, and no
    /// backup precondition since the sources are the backups.
    pub(crate) fn restore_slots(
        &self,
        category: Category,
        sources: &[(Slot, PathBuf)],
    ) -> Result<ReplaceReport> {
        if sources.is_empty() {
            return Err(Error::EmptyRequest);
        }

        let mut staged = Vec::with_capacity(sources.len());
        for (slot, source) in sources {
            let image = imaging::open_rgba(source)?;
            let artwork = Artwork::prepare(category, image, None, Fit::Stretch);
            let bundle = self.stage(category, false, &artwork, slot)?;
            staged.push((slot, bundle));
        }

        let mut report = ReplaceReport::default();
        self.commit(staged, &mut report)?;
        Ok(report)
    }

    /// Write every staged bundle, in slot order
    fn commit(&self, staged: Vec<(&Slot, StagedBundle)>, report: &mut ReplaceReport) -> Result<()> {
        for (slot, bundle) in staged {
            write_atomic(&bundle.path, &bundle.bytes)?;
            tracing::info!("✅ Wrote {}", bundle.path.display());
            if bundle.used_alt {
                report.alt_bundles.push(slot.bundle.clone());
            }
            report.written.push(bundle.path);
        }
        Ok(())
    }

    /// Decode, composite and re-encode one slot without touching the disk
    fn stage(
        &self,
        category: Category,
        use_alt: bool,
        artwork: &Artwork,
        slot: &Slot,
    ) -> Result<StagedBundle> {
        let mut bundle = open_texture(&self.codec, &self.locator, &slot.bundle, use_alt)?;
        let path = bundle.path.clone();
        let encode_error = |source: CodecError| Error::Encode {
            bundle: slot.bundle.clone(),
            source,
        };

        {
            let mut texture = bundle
                .environment
                .read_texture(bundle.texture_index)
                .map_err(|source| Error::Codec {
                    path: path.clone(),
                    source,
                })?;
            let current = texture.image().map_err(|source| Error::Codec {
                path: path.clone(),
                source,
            })?;

            let composed = artwork.compose(category, slot, current)?;
            texture.set_dimensions(composed.width(), composed.height());
            texture
                .set_image(&composed, REPLACEMENT_FORMAT, self.settings.mipmap_count)
                .map_err(encode_error)?;
            texture.save().map_err(encode_error)?;
        }

        let bytes = bundle
            .environment
            .save(self.settings.packer)
            .map_err(encode_error)?;

        Ok(StagedBundle {
            path,
            bytes,
            used_alt: bundle.used_alt,
        })
    }
}

/// Replace `path` with `bytes` in one rename, leaving the old file intact on failure
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let write_error = |source: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    let written = File::create(&temp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|()| fs::rename(&temp, path)) {
        let _ = fs::remove_file(&temp);
        return Err(write_error(e));
    }
    Ok(())
}
