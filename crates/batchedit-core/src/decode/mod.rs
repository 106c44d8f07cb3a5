//! Image ingest for batchedit.
//!
//! This module provides functionality for:
//! - Decoding PNG, JPEG and WebP bytes into RGBA bitmaps
//! - Applying EXIF orientation so images arrive upright
//! - Pre-shrinking large sources before they are painted
//!
//! # Examples
//!
//! ```ignore
//! use batchedit_core::decode::decode_image;
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let bitmap = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", bitmap.width(), bitmap.height());
//! ```

mod bitmap;
mod orientation;
mod resize;

pub use bitmap::decode_image;
pub use orientation::{apply_orientation, read_orientation, Orientation};
pub use resize::shrink_to_fit;
