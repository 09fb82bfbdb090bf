use std::borrow::Cow;

use image::RgbaImage;

use super::{Border, Fit};
use crate::error::{Error, Result};
use crate::imaging;
use crate::regions;
use crate::state::data::{Category, Slot};

/// The user image after category-wide preparation, ready to be placed
/// into each slot's texture.
pub(super) enum Artwork {
    /// Pasted into the slot's region of the existing sheet (cards)
    Regions { image: RgbaImage, fit: Fit },
    /// Becomes the whole texture (fields, sleeves)
    Full(RgbaImage),
}

impl Artwork {
    /// Run the per-category preparation once, so expensive effects like the
    /// faded border are not repeated for every slot.
    pub(super) fn prepare(
        category: Category,
        source: RgbaImage,
        border: Option<&Border>,
        fit: Fit,
    ) -> Self {
        match category {
            Category::Card => Artwork::Regions { image: source, fit },
            Category::Field => Artwork::Full(source),
            Category::Sleeve => Artwork::Full(match border {
                Some(border) if border.fade => imaging::add_border_with_fade(&source, border.color),
                Some(border) => imaging::add_border(&source, border.color),
                None => source,
            }),
        }
    }

    /// Produce the new texture for one slot from its current texture
    pub(super) fn compose(
        &self,
        category: Category,
        slot: &Slot,
        texture: RgbaImage,
    ) -> Result<RgbaImage> {
        match self {
            Artwork::Full(image) => Ok(image.clone()),
            Artwork::Regions { image, fit } => {
                // Only card slots carry regions; anything else covers the texture
                let Some(region) = regions::region(category, slot.size) else {
                    return Ok(image.clone());
                };

                let (width, height) = texture.dimensions();
                if !region.fits(width, height) {
                    return Err(Error::RegionOutOfBounds {
                        bundle: slot.bundle.clone(),
                        region: region.as_tuple(),
                        width,
                        height,
                    });
                }

                let art = match fit {
                    Fit::Stretch => Cow::Borrowed(image),
                    Fit::Crop => Cow::Owned(imaging::crop_to_ratio(
                        image,
                        region.width(),
                        region.height(),
                    )),
                };
                Ok(imaging::overlay(texture, &art, region.top_left(), region.size()))
            }
        }
    }
}
