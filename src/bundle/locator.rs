use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::state::config::Settings;
use crate::state::data::Category;

/// Resolves a bundle code to the file that holds it
pub trait Locate: Send + Sync {
    /// Path of the bundle. With `use_alt` the alternate storage is searched
    /// instead, and a missing file there is [`Error::AssetNotFound`].
    fn locate(&self, code: &str, use_alt: bool) -> Result<PathBuf>;
}

/// Game bundles live under `<root>/<first two chars of code>/<code>`
#[derive(Debug, Clone)]
pub struct BundleLocator {
    game_path: PathBuf,
    alt_path: Option<PathBuf>,
}

/// Two-character directory prefix of a bundle code
fn prefix(code: &str) -> &str {
    code.get(..2).unwrap_or(code)
}

impl BundleLocator {
    pub fn new(game_path: impl Into<PathBuf>, alt_path: Option<PathBuf>) -> Self {
        Self {
            game_path: game_path.into(),
            alt_path,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.game_path.clone(), settings.alt_path.clone())
    }

    /// Where the live game keeps the bundle
    pub fn primary_path(&self, code: &str) -> PathBuf {
        self.game_path.join(prefix(code)).join(code)
    }

    /// Where the bundle would be in the alternate storage, if one is configured
    pub fn alt_path(&self, code: &str) -> Option<PathBuf> {
        self.alt_path
            .as_ref()
            .map(|root| root.join(prefix(code)).join(code))
    }
}

impl Locate for BundleLocator {
    fn locate(&self, code: &str, use_alt: bool) -> Result<PathBuf> {
        if !use_alt {
            return Ok(self.primary_path(code));
        }

        self.alt_path(code)
            .filter(|path| path.is_file())
            .ok_or_else(|| Error::AssetNotFound {
                bundle: code.to_string(),
            })
    }
}

/// Copy a live bundle to `bundles/<category>/<code>` in the workspace.
/// Falls back to the alternate location when the primary file is absent.
pub fn copy_bundle<L: Locate + ?Sized>(
    locator: &L,
    settings: &Settings,
    category: Category,
    code: &str,
) -> Result<PathBuf> {
    let mut source = locator.locate(code, false)?;
    if !source.is_file() {
        source = locator.locate(code, true)?;
    }

    let dest_dir = settings.bundles_dir(category);
    fs::create_dir_all(&dest_dir)?;
    let dest = dest_dir.join(code);
    fs::copy(&source, &dest)?;

    tracing::info!("📦 Copied {} to {}", code, dest.display());
    Ok(dest)
}
