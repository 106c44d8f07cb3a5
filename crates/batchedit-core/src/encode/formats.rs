//! JPEG, PNG and WebP encoding of rendered surfaces.
//!
//! Pixel data is normalized to RGB for JPEG and kept as RGBA for PNG and
//! WebP so alpha survives wherever the container supports it.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};

use crate::decode::decode_image;
use crate::error::{Error, Result};
use crate::model::OutputFormat;

/// JPEG quality used for exports, matching the browser canvas default (0.92).
pub const JPEG_QUALITY: u8 = 92;

/// An encoded image together with its format and pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBitmap {
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl EncodedBitmap {
    /// Decode back into an RGBA bitmap.
    pub fn decode(&self) -> Result<RgbaImage> {
        decode_image(&self.bytes)
    }

    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode an RGBA surface into `format`.
///
/// # Errors
///
/// Returns `Error::RenderFailed` if the surface is empty or the encoder fails.
pub fn encode(surface: &RgbaImage, format: OutputFormat) -> Result<EncodedBitmap> {
    let (width, height) = surface.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::RenderFailed(format!(
            "cannot encode a {width}x{height} surface"
        )));
    }

    let mut buffer = Cursor::new(Vec::new());
    match format {
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(surface.clone()).into_rgb8();
            JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| Error::RenderFailed(format!("JPEG encoding failed: {e}")))?;
        }
        OutputFormat::Png => {
            PngEncoder::new(&mut buffer)
                .write_image(surface.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| Error::RenderFailed(format!("PNG encoding failed: {e}")))?;
        }
        OutputFormat::Webp => {
            // The pure-Rust encoder only writes lossless WebP.
            WebPEncoder::new_lossless(&mut buffer)
                .encode(surface.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| Error::RenderFailed(format!("WebP encoding failed: {e}")))?;
        }
    }

    Ok(EncodedBitmap {
        format,
        width,
        height,
        bytes: buffer.into_inner(),
    })
}
