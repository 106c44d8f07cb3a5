//! Pre-shrinking of large sources before they are painted.
//!
//! The renderer samples bilinearly, which aliases badly once the source is
//! several times larger than the area it is drawn into. Shrinking with a
//! triangle filter first keeps export quality close to what a browser
//! canvas produces.

use std::borrow::Cow;

use image::imageops::FilterType;
use image::RgbaImage;

/// Shrink `image` so it is no larger than `max_width` x `max_height`.
///
/// Aspect ratio is preserved. Images that already fit are borrowed
/// unchanged, and images are never enlarged.
pub fn shrink_to_fit(image: &RgbaImage, max_width: u32, max_height: u32) -> Cow<'_, RgbaImage> {
    let (width, height) = image.dimensions();
    if max_width == 0 || max_height == 0 || (width <= max_width && height <= max_height) {
        return Cow::Borrowed(image);
    }

    let (new_width, new_height) = calculate_fit_dimensions(width, height, max_width, max_height);
    Cow::Owned(image::imageops::resize(
        image,
        new_width,
        new_height,
        FilterType::Triangle,
    ))
}

/// Calculate dimensions that fit within the bounds while preserving aspect ratio.
fn calculate_fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let new_width = (width as f64 * scale).round() as u32;
    let new_height = (height as f64 * scale).round() as u32;
    (new_width.max(1), new_height.max(1))
}
