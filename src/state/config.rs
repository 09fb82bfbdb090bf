//! Application settings
//!
//! Settings are assembled once at startup and then passed by reference to
//! every component. Nothing in the crate mutates them after construction.
//! They are stored as JSON next to the catalog database.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data::Category;
use crate::bundle::Packer;
use crate::error::Result;

/// Default number of mipmap levels written with every replaced texture
pub const DEFAULT_MIPMAP_COUNT: u32 = 10;

/// All settings consumed by the replacement core
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Root of the live game bundles (`<game_path>/<code[..2]>/<code>`)
    pub game_path: PathBuf,

    /// Alternate storage for bundles the game downloaded on demand.
    /// Probed once when the primary bundle holds no texture.
    pub alt_path: Option<PathBuf>,

    /// Root of the `backups/`, `images/` and `bundles/` trees
    pub workspace: PathBuf,

    /// Mipmap levels generated when re-encoding
    pub mipmap_count: u32,

    /// Compression scheme used when the bundle is serialized back
    pub packer: Packer,

    /// Back up every asset before its first replacement
    pub create_backup: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            game_path: PathBuf::new(),
            alt_path: None,
            workspace: PathBuf::from("."),
            mipmap_count: DEFAULT_MIPMAP_COUNT,
            packer: Packer::Lz4,
            create_backup: false,
        }
    }
}

impl Settings {
    /// Settings pointing at a game install, everything else default
    pub fn new(game_path: impl Into<PathBuf>) -> Self {
        Self {
            game_path: game_path.into(),
            ..Self::default()
        }
    }

    /// Default location of the settings file:
    /// - Linux: ~/.local/share/texture-swap/settings.json
    /// - macOS: ~/Library/Application Support/texture-swap/settings.json
    /// - Windows: %APPDATA%\texture-swap\settings.json
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .map(|dir| dir.join("texture-swap").join("settings.json"))
    }

    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write settings as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// `backups/<category>`
    pub fn backups_dir(&self, category: Category) -> PathBuf {
        self.workspace.join("backups").join(category.subfolder())
    }

    /// `images/<category>`
    pub fn images_dir(&self, category: Category) -> PathBuf {
        self.workspace.join("images").join(category.subfolder())
    }

    /// `bundles/<category>`
    pub fn bundles_dir(&self, category: Category) -> PathBuf {
        self.workspace.join("bundles").join(category.subfolder())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.mipmap_count, 10);
        assert_eq!(settings.packer, Packer::Lz4);
        assert!(!settings.create_backup);
        assert!(settings.alt_path.is_none());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let settings =
            Settings::from_json(r#"{ "game_path": "/games/dl/LocalData", "packer": "lzma" }"#)
                .unwrap();

        assert_eq!(settings.game_path, PathBuf::from("/games/dl/LocalData"));
        assert_eq!(settings.packer, Packer::Lzma);
        assert_eq!(settings.mipmap_count, DEFAULT_MIPMAP_COUNT);
    }

    #[test]
    fn test_upper_case_packer_from_settings_file() {
        let settings =
            Settings::from_json(r#"{ "game_path": "/g", "packer": "LZ4" }"#).unwrap();
        assert_eq!(settings.packer, Packer::Lz4);
        assert_eq!(
            Settings::from_json(r#"{ "packer": "LZMA" }"#).unwrap().packer,
            "LZMA".parse::<Packer>().unwrap()
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::new("/games/dl");
        settings.create_backup = true;
        settings.mipmap_count = 4;
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_workspace_layout() {
        let mut settings = Settings::default();
        settings.workspace = PathBuf::from("/ws");

        assert_eq!(
            settings.backups_dir(Category::Card),
            PathBuf::from("/ws/backups/cards")
        );
        assert_eq!(
            settings.images_dir(Category::Field),
            PathBuf::from("/ws/images/fields")
        );
        assert_eq!(
            settings.bundles_dir(Category::Sleeve),
            PathBuf::from("/ws/bundles/sleeves")
        );
    }
}
