//! Image encoding for previews and exports.
//!
//! This module provides functionality for:
//! - Encoding rendered RGBA surfaces to JPEG, PNG or WebP
//! - Carrying encoded bytes with their format and size ([`EncodedBitmap`])
//!
//! # Examples
//!
//! ```ignore
//! use batchedit_core::encode::encode;
//! use batchedit_core::OutputFormat;
//!
//! let surface = image::RgbaImage::new(100, 100);
//! let png = encode(&surface, OutputFormat::Png).unwrap();
//! println!("Encoded {} bytes", png.len());
//! ```

mod formats;

pub use formats::{encode, EncodedBitmap, JPEG_QUALITY};
