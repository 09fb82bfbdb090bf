//! Sleeve borders: a solid frame, or a frame whose color bleeds into the
//! artwork with a soft gradient.

use image::imageops;
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Solid border thickness as a fraction of (width, height)
const SOLID_BORDER: (f64, f64) = (0.06, 0.05);
/// Faded border thickness as a fraction of (width, height)
const FADE_BORDER: (f64, f64) = (0.05, 0.04);

/// Images with at least this many pixels are faded row-parallel.
const PARALLEL_PIXEL_THRESHOLD: usize = 64 * 1024;

/// Parse `#rrggbb` (leading `#` optional) into an opaque color
pub fn parse_hex_color(value: &str) -> Result<Rgba<u8>> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(Error::InvalidColor(value.to_string()));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| Error::InvalidColor(value.to_string()))
    };
    Ok(Rgba([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255]))
}

/// Border thickness for an image, truncated to whole pixels
fn border_size(width: u32, height: u32, factors: (f64, f64)) -> (u32, u32) {
    (
        (width as f64 * factors.0) as u32,
        (height as f64 * factors.1) as u32,
    )
}

/// Grow the canvas by `(border_x, border_y)` on every side, filled with `color`
fn expand(image: &RgbaImage, border_x: u32, border_y: u32, color: Rgba<u8>) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut canvas = RgbaImage::from_pixel(width + 2 * border_x, height + 2 * border_y, color);
    imageops::replace(&mut canvas, image, border_x as i64, border_y as i64);
    canvas
}

/// Add a solid border of 6% of the width left/right and 5% of the height
/// top/bottom. A 100x100 image becomes 112x110.
pub fn add_border(image: &RgbaImage, color: Rgba<u8>) -> RgbaImage {
    let (border_x, border_y) = border_size(image.width(), image.height(), SOLID_BORDER);
    expand(image, border_x, border_y, color)
}

/// Blend weight of the original pixel at normalized distance `t` from the
/// content edge: 0 at the edge, approaching 1 at the end of the fade.
pub(crate) fn fade_factor(t: f64) -> f64 {
    let smooth1 = t * t * (3.0 - 2.0 * t);
    let smooth2 = smooth1 * smooth1 * (3.0 - 2.0 * smooth1);
    1.0 - (-4.0 * smooth2).exp()
}

/// Add a 5% / 4% border whose color fades into the artwork.
///
/// Pixels within `2 * min(border_x, border_y)` of the original edge are
/// mixed with the border color; everything further in is copied unchanged,
/// and the border itself is the solid color.
pub fn add_border_with_fade(image: &RgbaImage, color: Rgba<u8>) -> RgbaImage {
    let (width, height) = image.dimensions();
    let (border_x, border_y) = border_size(width, height, FADE_BORDER);
    let mut output = expand(image, border_x, border_y, color);

    let fade_distance = 2.0 * border_x.min(border_y) as f64;
    if fade_distance == 0.0 {
        return output;
    }

    let stride = output.width() as usize * 4;
    let process_row = |(y, row): (usize, &mut [u8])| {
        let y = y as u32;
        if y < border_y || y >= border_y + height {
            return;
        }
        let orig_y = y - border_y;
        let edge_y = orig_y.min(height - 1 - orig_y);

        for orig_x in 0..width {
            let distance = orig_x.min(width - 1 - orig_x).min(edge_y) as f64;
            if distance >= fade_distance {
                continue;
            }

            let fade = fade_factor(distance / fade_distance);
            let source = image.get_pixel(orig_x, orig_y);
            let offset = (orig_x + border_x) as usize * 4;
            for channel in 0..4 {
                let blended =
                    (1.0 - fade) * color[channel] as f64 + fade * source[channel] as f64;
                row[offset + channel] = blended as u8;
            }
        }
    };

    let raw: &mut [u8] = &mut output;
    if (width as usize) * (height as usize) >= PARALLEL_PIXEL_THRESHOLD {
        raw.par_chunks_mut(stride).enumerate().for_each(process_row);
    } else {
        raw.chunks_mut(stride).enumerate().for_each(process_row);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 90, 255])
        })
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff8000").unwrap(), Rgba([255, 128, 0, 255]));
        assert_eq!(parse_hex_color("0A0b0C").unwrap(), Rgba([10, 11, 12, 255]));
        assert!(matches!(parse_hex_color("#fff"), Err(Error::InvalidColor(_))));
        assert!(matches!(parse_hex_color("#gg0000"), Err(Error::InvalidColor(_))));
        assert!(matches!(parse_hex_color("#ééé"), Err(Error::InvalidColor(_))));
    }

    #[test]
    fn test_add_border_100x100() {
        let out = add_border(&gradient(100, 100), RED);
        assert_eq!(out.dimensions(), (112, 110));
        assert_eq!(*out.get_pixel(0, 0), RED);
        assert_eq!(*out.get_pixel(5, 50), RED);
        assert_eq!(out.get_pixel(6, 5), gradient(100, 100).get_pixel(0, 0));
    }

    #[test]
    fn test_add_border_with_fade_size() {
        let out = add_border_with_fade(&gradient(100, 100), RED);
        assert_eq!(out.dimensions(), (110, 108));
    }

    #[test]
    fn test_fade_factor_curve() {
        assert_eq!(fade_factor(0.0), 0.0);
        let mut previous = 0.0;
        for step in 1..=100 {
            let value = fade_factor(step as f64 / 100.0);
            assert!(value >= previous);
            previous = value;
        }
        assert!(previous > 0.98 && previous < 1.0);
    }

    #[test]
    fn test_fade_leaves_interior_and_border_exact() {
        let img = gradient(200, 160);
        let out = add_border_with_fade(&img, RED);
        // border 10 x 6, fade distance 12
        let (bx, by, fade) = (10u32, 6u32, 12u32);
        assert_eq!(out.dimensions(), (220, 172));

        for (x, y, px) in out.enumerate_pixels() {
            let inside = x >= bx && x < bx + 200 && y >= by && y < by + 160;
            if !inside {
                assert_eq!(*px, RED, "border pixel ({x}, {y})");
                continue;
            }
            let (ox, oy) = (x - bx, y - by);
            let distance = ox.min(199 - ox).min(oy).min(159 - oy);
            if distance >= fade {
                assert_eq!(px, img.get_pixel(ox, oy), "interior pixel ({ox}, {oy})");
            }
        }

        // The outermost content ring is pure border color
        assert_eq!(*out.get_pixel(bx, by + 80), RED);
    }

    #[test]
    fn test_fade_is_monotonic_toward_interior() {
        let img = RgbaImage::from_pixel(300, 300, Rgba([255, 255, 255, 255]));
        let out = add_border_with_fade(&img, Rgba([0, 0, 0, 255]));
        // border 15 x 12, fade distance 24
        let row = 12 + 150;

        let mut previous = 0u8;
        for x in 15..15 + 30 {
            let value = out.get_pixel(x, row)[0];
            assert!(value >= previous, "fade dipped at x = {x}");
            previous = value;
        }
        assert_eq!(previous, 255);
    }

    #[test]
    fn test_fade_parallel_path_matches_sequential_layout() {
        // Large enough to take the rayon path
        let img = gradient(320, 256);
        let out = add_border_with_fade(&img, RED);
        assert_eq!(out.dimensions(), (352, 276));
        assert_eq!(out.get_pixel(16 + 160, 10 + 128), img.get_pixel(160, 128));
    }

    #[test]
    fn test_tiny_image_has_no_fade() {
        let img = gradient(10, 10);
        let out = add_border_with_fade(&img, RED);
        assert_eq!(out.dimensions(), (10, 10));
        assert_eq!(out, img);
    }

    proptest! {
        #[test]
        fn border_sizes_follow_factors(width in 1u32..400, height in 1u32..400) {
            let img = RgbaImage::new(width, height);

            let solid = add_border(&img, RED);
            let bx = (width as f64 * 0.06) as u32;
            let by = (height as f64 * 0.05) as u32;
            prop_assert_eq!(solid.dimensions(), (width + 2 * bx, height + 2 * by));

            let faded = add_border_with_fade(&img, RED);
            let bx = (width as f64 * 0.05) as u32;
            let by = (height as f64 * 0.04) as u32;
            prop_assert_eq!(faded.dimensions(), (width + 2 * bx, height + 2 * by));
        }
    }
}
