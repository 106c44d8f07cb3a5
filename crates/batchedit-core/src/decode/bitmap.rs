//! Decoding encoded bytes into upright RGBA bitmaps.

use std::io::Cursor;

use image::{ImageReader, RgbaImage};

use super::orientation::{apply_orientation, read_orientation};
use crate::error::{Error, Result};

/// Decode PNG, JPEG or WebP bytes into an upright RGBA bitmap.
///
/// The container format is sniffed from the magic bytes, so the file name
/// extension is never trusted. EXIF orientation is applied when present.
///
/// # Errors
///
/// Returns `Error::InvalidImage` for empty, unknown, corrupted or
/// zero-sized input.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    if bytes.is_empty() {
        return Err(Error::InvalidImage("empty input".to_string()));
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::InvalidImage(e.to_string()))?;

    if reader.format().is_none() {
        return Err(Error::InvalidImage(
            "unrecognized image format".to_string(),
        ));
    }

    let img = reader
        .decode()
        .map_err(|e| Error::InvalidImage(e.to_string()))?;

    let upright = apply_orientation(img, read_orientation(bytes)).into_rgba8();
    let (width, height) = upright.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::InvalidImage(format!(
            "image has zero dimensions ({width}x{height})"
        )));
    }

    Ok(upright)
}
