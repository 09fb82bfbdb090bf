//! Shared data structures for the application state
//!
//! These structs represent the data model that flows between
//! the catalog, the replacement engine and the backup manager.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Asset category. Each one owns a subfolder under `backups/`, `images/`
/// and `bundles/`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Card,
    Field,
    Sleeve,
}

impl Category {
    /// Folder name used inside the workspace (e.g. `backups/cards`)
    pub fn subfolder(self) -> &'static str {
        match self {
            Category::Card => "cards",
            Category::Field => "fields",
            Category::Sleeve => "sleeves",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Category::Card => "card",
            Category::Field => "field",
            Category::Sleeve => "sleeve",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Category::Card),
            "field" => Ok(Category::Field),
            "sleeve" => Ok(Category::Sleeve),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Physical size variant of an asset texture
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SlotSize {
    Small,
    Medium,
    Large,
}

/// One bundle file holding one size variant of an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub size: SlotSize,
    /// Bundle code, e.g. "a1b2c3d4"
    pub bundle: String,
}

impl Slot {
    pub fn new(size: SlotSize, bundle: impl Into<String>) -> Self {
        Self {
            size,
            bundle: bundle.into(),
        }
    }
}

/// A logical asset as stored in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Unique database ID
    pub id: i64,
    pub category: Category,
    /// Display name (cards only; sleeves and fields use their medium bundle)
    pub name: String,
    pub small_bundle: String,
    pub medium_bundle: String,
    /// Only cards have a large variant, and not all of them
    pub large_bundle: Option<String>,
    pub favorite: bool,
    pub has_backup: bool,
}

impl Asset {
    /// Slots in small → medium → large order
    pub fn slots(&self) -> Vec<Slot> {
        let mut slots = vec![
            Slot::new(SlotSize::Small, &self.small_bundle),
            Slot::new(SlotSize::Medium, &self.medium_bundle),
        ];
        if let Some(large) = &self.large_bundle {
            slots.push(Slot::new(SlotSize::Large, large));
        }
        slots
    }
}
