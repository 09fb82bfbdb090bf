use image::imageops;
use image::{Rgba, RgbaImage};

/// Channel difference from the background above which a pixel counts as content
const TRIM_TOLERANCE: u8 = 100;

/// Pad to a centered square and cut it to the inscribed circle.
/// Everything outside the circle becomes fully transparent; pixels inside
/// keep their own alpha, so the padding stays transparent too.
///
/// Unlike a PIL `putalpha(mask)`, which overwrites alpha and turns padding
/// inside the circle opaque black, the mask here only ever lowers alpha.
pub fn circular_mask(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let size = width.max(height);

    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 0]));
    imageops::replace(
        &mut canvas,
        image,
        ((size - width) / 2) as i64,
        ((size - height) / 2) as i64,
    );

    let radius = size as f64 / 2.0;
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - radius;
        let dy = y as f64 + 0.5 - radius;
        if dx * dx + dy * dy > radius * radius {
            pixel[3] = 0;
        }
    }

    canvas
}

/// Crop away the uniform margin around the content.
///
/// The background color is the top-left pixel. Returns `None` when no
/// pixel differs from it enough to count as content.
pub fn trim(image: &RgbaImage) -> Option<RgbaImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let background = *image.get_pixel(0, 0);
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        let differs = pixel
            .0
            .iter()
            .zip(background.0.iter())
            .any(|(a, b)| a.abs_diff(*b) > TRIM_TOLERANCE);
        if !differs {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((left, top, right, bottom)) => {
                (left.min(x), top.min(y), right.max(x), bottom.max(y))
            }
        });
    }

    let (left, top, right, bottom) = bounds?;
    Some(imageops::crop_imm(image, left, top, right - left + 1, bottom - top + 1).to_image())
}
