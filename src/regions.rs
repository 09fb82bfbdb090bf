//! Where each slot's artwork lives inside its texture.
//!
//! Card textures are sheets that pack several rendered sizes together, so a
//! card slot only owns one rectangle of its sheet. Fields and sleeves own the
//! whole texture and have no entry.

use crate::state::data::{Category, SlotSize};

/// Pixel rectangle in texture space, right/bottom exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Region {
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn width(&self) -> u32 {
        self.right - self.left
    }

    pub const fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub const fn top_left(&self) -> (u32, u32) {
        (self.left, self.top)
    }

    pub const fn size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub const fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (self.left, self.top, self.right, self.bottom)
    }

    /// Whether the region lies inside a texture of the given size
    pub const fn fits(&self, width: u32, height: u32) -> bool {
        self.right <= width && self.bottom <= height
    }
}

/// Card art rectangles on the shared 512x512 card sheet.
///
/// Placeholder layout: three non-overlapping boxes standing in for the game's
/// real sheet coordinates, which are not part of this crate. Replace these
/// constants once the actual layout is known.
pub const CARD_SMALL: Region = Region::new(320, 160, 400, 240);
pub const CARD_MEDIUM: Region = Region::new(320, 0, 480, 160);
pub const CARD_LARGE: Region = Region::new(0, 0, 320, 320);

/// Artwork region of a slot, or `None` when the slot covers the full texture
pub const fn region(category: Category, size: SlotSize) -> Option<Region> {
    match (category, size) {
        (Category::Card, SlotSize::Small) => Some(CARD_SMALL),
        (Category::Card, SlotSize::Medium) => Some(CARD_MEDIUM),
        (Category::Card, SlotSize::Large) => Some(CARD_LARGE),
        (Category::Field | Category::Sleeve, _) => None,
    }
}
