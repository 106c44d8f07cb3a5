//! Transform model: where and how an image is drawn on a canvas.
//!
//! This module is pure geometry. It turns an image's natural size and its
//! [`EditState`](crate::model::EditState) into a [`DrawSpec`] that the
//! renderer applies pixel by pixel.
//!
//! # Transform Order
//!
//! 1. Fit the image into the canvas (two-stage aspect fit)
//! 2. Move to the canvas center
//! 3. Rotate by the edit rotation (multiples of 90 degrees)
//! 4. Scale by the clamped zoom
//! 5. Pan, in unscaled canvas pixels
//!
//! # Coordinate System
//!
//! - Canvas coordinates are pixels, origin top-left, y pointing down
//! - Positive rotation is clockwise on screen
//! - Box coordinates are normalized (0.0 to 1.0) across the drawn image

mod draw;

pub use draw::{compute_draw, compute_draw_for, DrawSpec};
