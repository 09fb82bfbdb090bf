//! Backup and restore of pristine textures
//!
//! A backup is a PNG at `backups/<category>/<slug>.png`. Card backups hold
//! only the slot's region of the shared sheet, so replaying one through the
//! engine puts back exactly the pixels that were there. Restore is a normal
//! replacement with the backup as source image.

use std::path::{Path, PathBuf};

use image::imageops;
use walkdir::WalkDir;

use crate::bundle::{open_texture, BundleCodec, Locate};
use crate::error::{Error, Result};
use crate::imaging::{save_png, slugify};
use crate::regions;
use crate::replace::ReplaceEngine;
use crate::state::config::Settings;
use crate::state::data::{Asset, Category, Slot};
use crate::state::library::Library;

/// Backup file for `name` (a bundle code or an alternate backup name)
pub fn backup_path(settings: &Settings, category: Category, name: &str) -> PathBuf {
    settings
        .backups_dir(category)
        .join(format!("{}.png", slugify(name, false)))
}

pub fn has_backup(settings: &Settings, category: Category, name: &str) -> bool {
    backup_path(settings, category, name).is_file()
}

/// Extracted texture file for a bundle code
pub fn image_path(settings: &Settings, category: Category, code: &str) -> PathBuf {
    settings
        .images_dir(category)
        .join(format!("{}.png", slugify(code, false)))
}

/// Every backup PNG of a category, sorted by path
pub fn list_backups(settings: &Settings, category: Category) -> Vec<PathBuf> {
    let mut backups: Vec<PathBuf> = WalkDir::new(settings.backups_dir(category))
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("png"))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();
    backups.sort();
    backups
}

/// Backs up and restores slots through a [`ReplaceEngine`]
pub struct BackupManager<'a, C, L> {
    engine: &'a ReplaceEngine<C, L>,
}

impl<'a, C: BundleCodec, L: Locate> BackupManager<'a, C, L> {
    pub fn new(engine: &'a ReplaceEngine<C, L>) -> Self {
        Self { engine }
    }

    fn settings(&self) -> &Settings {
        self.engine.settings()
    }

    /// Snapshot the current texture of a slot. Overwrites an existing backup.
    pub fn backup(&self, category: Category, slot: &Slot) -> Result<PathBuf> {
        let path = backup_path(self.settings(), category, &slot.bundle);
        self.snapshot(category, slot, &path)?;
        tracing::info!("💾 Backed up {} to {}", slot.bundle, path.display());
        Ok(path)
    }

    /// Like [`backup`](Self::backup) but into `images/` for the user to edit
    pub fn extract_texture(&self, category: Category, slot: &Slot) -> Result<PathBuf> {
        let path = image_path(self.settings(), category, &slot.bundle);
        self.snapshot(category, slot, &path)?;
        tracing::info!("🖼️  Extracted {} to {}", slot.bundle, path.display());
        Ok(path)
    }

    fn snapshot(&self, category: Category, slot: &Slot, dest: &Path) -> Result<()> {
        let mut bundle = open_texture(
            self.engine.codec(),
            self.engine.locator(),
            &slot.bundle,
            false,
        )?;
        let texture = bundle.read_image()?;

        let image = match regions::region(category, slot.size) {
            Some(region) => {
                let (width, height) = texture.dimensions();
                if !region.fits(width, height) {
                    return Err(Error::RegionOutOfBounds {
                        bundle: slot.bundle.clone(),
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

        save_png(&image, dest)
    }

    /// Put a slot's backup back into its bundle.
    ///
    /// `alt_name` looks the backup up under another name than the bundle
    /// code. Returns `Ok(false)` without touching anything when there is
    /// no backup.
    pub fn restore(&self, category: Category, slot: &Slot, alt_name: Option<&str>) -> Result<bool> {
        let name = alt_name.unwrap_or(&slot.bundle);
        let path = backup_path(self.settings(), category, name);
        if !path.is_file() {
            tracing::warn!("⚠️  No backup for {} at {}", slot.bundle, path.display());
            return Ok(false);
        }

        self.engine.restore_slots(category, &[(slot.clone(), path)])?;
        tracing::info!("♻️  Restored {}", slot.bundle);
        Ok(true)
    }

    /// Back up every slot of an asset
    pub fn backup_asset(&self, asset: &Asset) -> Result<Vec<PathBuf>> {
        asset
            .slots()
            .iter()
            .map(|slot| self.backup(asset.category, slot))
            .collect()
    }

    /// Restore every slot of an asset. Returns `Ok(false)` and writes
    /// nothing unless every slot has a backup. Bundles are only written once
    /// every slot has been re-encoded, so a failing slot leaves all of them
    /// as they were.
    pub fn restore_asset(&self, asset: &Asset) -> Result<bool> {
        let mut sources = Vec::new();
        for slot in asset.slots() {
            let path = backup_path(self.settings(), asset.category, &slot.bundle);
            if !path.is_file() {
                tracing::warn!("⚠️  {} has no backup for {}", asset.name, slot.bundle);
                return Ok(false);
            }
            sources.push((slot, path));
        }

        self.engine.restore_slots(asset.category, &sources)?;
        tracing::info!("♻️  Restored {} ({} slots)", asset.name, sources.len());
        Ok(true)
    }

    /// Back up an asset the first time it is about to be modified.
    ///
    /// Does nothing when backups are disabled or every slot already has one.
    /// Returns whether a backup was taken.
    pub fn ensure_backup(&self, library: &Library, asset: &Asset) -> Result<bool> {
        if !self.settings().create_backup {
            return Ok(false);
        }

        let pending: Vec<Slot> = asset
            .slots()
            .into_iter()
            .filter(|slot| !has_backup(self.settings(), asset.category, &slot.bundle))
            .collect();

        for slot in &pending {
            self.backup(asset.category, slot)?;
        }
        if !asset.has_backup || !pending.is_empty() {
            library.set_backup_state(asset.id, true)?;
        }
        Ok(!pending.is_empty())
    }
}
