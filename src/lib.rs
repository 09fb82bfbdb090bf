//! Texture replacement for Unity asset bundles
//!
//! Swaps the artwork of cards, sleeves and fields inside a mobile card
//! game's bundles and keeps PNG backups so every change can be undone.
//!
//! - `imaging`: pure RGBA transforms (resize, ratio crop, borders, masks)
//! - `bundle`: the codec seam and bundle file lookup
//! - `replace`: the replacement engine
//! - `backup`: backup, restore and texture extraction
//! - `thumbnail`: parallel thumbnail refresh for asset listings
//! - `state`: settings, data model and the SQLite catalog
//!
//! Bundle parsing itself is provided by a [`bundle::BundleCodec`]
//! implementation supplied by the host application.

pub mod backup;
pub mod bundle;
pub mod error;
pub mod imaging;
pub mod regions;
pub mod replace;
pub mod state;
pub mod thumbnail;

pub use backup::BackupManager;
pub use bundle::{BundleCodec, BundleLocator, Locate, Packer};
pub use error::{CodecError, Error, Result};
pub use replace::{Border, Fit, ReplaceEngine, ReplaceReport, ReplaceRequest};
pub use state::config::Settings;
pub use state::data::{Asset, Category, Slot, SlotSize};
pub use state::library::Library;
