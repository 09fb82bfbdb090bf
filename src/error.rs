//! Error types shared across the crate.
//!
//! Every engine-level failure surfaces to the immediate caller as an
//! [`Error`]. A missing backup during restore is *not* an error: restore
//! reports it as `Ok(false)`.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a bundle codec implementation.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("bundle I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed bundle: {0}")]
    Malformed(String),

    #[error("texture encode failed: {0}")]
    Encode(String),
}

#[derive(Debug, Error)]
pub enum Error {
    /// No `Texture2D` object was found, even after the alternate-location retry.
    #[error("no Texture2D found for bundle {bundle}")]
    AssetNotFound { bundle: String },

    /// The user supplied image could not be read or decoded.
    #[error("cannot read source image {}: {source}", path.display())]
    SourceImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Re-encoding the texture or serializing the bundle failed.
    #[error("cannot encode texture for bundle {bundle}: {source}")]
    Encode {
        bundle: String,
        #[source]
        source: CodecError,
    },

    /// The final bundle write failed. The original file is left in place.
    #[error("cannot write bundle {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backups are enabled but the slot has not been backed up yet.
    #[error("bundle {bundle} must be backed up before it can be replaced")]
    BackupRequired { bundle: String },

    #[error("region {region:?} does not fit in a {width}x{height} texture (bundle {bundle})")]
    RegionOutOfBounds {
        bundle: String,
        region: (u32, u32, u32, u32),
        width: u32,
        height: u32,
    },

    #[error("invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),

    #[error("replace request has no bundle slots")]
    EmptyRequest,

    /// The bundle exists but the codec could not open it.
    #[error("cannot open bundle {}: {source}", path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("catalog error: {0}")]
    Catalog(#[from] rusqlite::Error),

    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// A background worker panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;
