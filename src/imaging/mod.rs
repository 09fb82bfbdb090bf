//! Image transform library
//!
//! Pure operations on 8-bit RGBA buffers used by the replacement pipeline:
//! - Resizing, ratio cropping and compositing (transform.rs)
//! - Solid and faded sleeve borders (border.rs)
//! - Circular masking and margin trimming (mask.rs)
//! - File name slugs (slug.rs)

pub mod border;
pub mod mask;
pub mod slug;
pub mod transform;

pub use border::{add_border, add_border_with_fade, parse_hex_color};
pub use mask::{circular_mask, trim};
pub use slug::slugify;
pub use transform::{
    crop_to_ratio, encode_png, open_rgba, overlay, paste_scaled, resize, save_png, BoxRegion,
};
