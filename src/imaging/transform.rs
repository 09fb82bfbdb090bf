use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};

use crate::error::{Error, Result};

/// Pixel rectangle `(left, top, right, bottom)`, right/bottom exclusive
pub type BoxRegion = (u32, u32, u32, u32);

/// Load a user supplied image as 8-bit RGBA
pub fn open_rgba(path: &Path) -> Result<RgbaImage> {
    image::open(path)
        .map(|img| img.into_rgba8())
        .map_err(|source| Error::SourceImage {
            path: path.to_path_buf(),
            source,
        })
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &RgbaImage) -> image::ImageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Save an image as PNG, creating parent directories
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Lanczos resize to an exact size. Aspect ratio is not preserved;
/// crop first with [`crop_to_ratio`] when it matters.
pub fn resize(image: &RgbaImage, size: (u32, u32)) -> RgbaImage {
    if image.dimensions() == size {
        return image.clone();
    }
    imageops::resize(image, size.0, size.1, FilterType::Lanczos3)
}

/// Center crop so that `width / height == ratio_w / ratio_h`.
///
/// The longer side loses symmetric margins of `(current - target) / 2`
/// pixels (truncated), so an odd difference leaves the extra pixel on the
/// right or bottom.
pub fn crop_to_ratio(image: &RgbaImage, ratio_w: u32, ratio_h: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || ratio_w == 0 || ratio_h == 0 {
        return image.clone();
    }

    let original = width as f64 / height as f64;
    let target = ratio_w as f64 / ratio_h as f64;

    if original > target {
        let new_width = ((height as f64 * target) as u32).clamp(1, width);
        let margin = (width - new_width) / 2;
        imageops::crop_imm(image, margin, 0, new_width, height).to_image()
    } else if original < target {
        let new_height = ((width as f64 / target) as u32).clamp(1, height);
        let margin = (height - new_height) / 2;
        imageops::crop_imm(image, 0, margin, width, new_height).to_image()
    } else {
        image.clone()
    }
}

/// Resize `overlay` to `size` and paste it opaque onto `base` at `top_left`.
pub fn overlay(
    mut base: RgbaImage,
    overlay: &RgbaImage,
    top_left: (u32, u32),
    size: (u32, u32),
) -> RgbaImage {
    let resized = resize(overlay, size);
    imageops::replace(&mut base, &resized, top_left.0 as i64, top_left.1 as i64);
    base
}

/// Resize `foreground` into `bounds` and paste it onto `background` with the
/// foreground's alpha as the mask.
///
/// Every channel, alpha included, is interpolated between background and
/// foreground by the mask value (`bg + (fg - bg) * a / 255`, rounded), the
/// way a masked PIL `paste` behaves. This is not "over" compositing: a
/// transparent background stays partly transparent.
pub fn paste_scaled(
    mut background: RgbaImage,
    foreground: &RgbaImage,
    bounds: BoxRegion,
) -> RgbaImage {
    let (left, top, right, bottom) = bounds;
    let resized = resize(
        foreground,
        (right.saturating_sub(left), bottom.saturating_sub(top)),
    );

    let (bg_width, bg_height) = background.dimensions();
    for (x, y, fg) in resized.enumerate_pixels() {
        let (bx, by) = (left + x, top + y);
        if bx >= bg_width || by >= bg_height {
            continue;
        }
        let mask = fg[3] as u32;
        let bg = background.get_pixel_mut(bx, by);
        for channel in 0..4 {
            let b = bg[channel] as u32;
            let f = fg[channel] as u32;
            bg[channel] = ((b * (255 - mask) + f * mask + 127) / 255) as u8;
        }
    }
    background
}
