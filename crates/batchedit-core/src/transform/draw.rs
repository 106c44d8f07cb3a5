//! Draw geometry for painting one image onto a canvas.
//!
//! The editor paints with the canvas 2D transform stack:
//!
//! ```text
//! translate(cx, cy)
//! rotate(rotation)
//! scale(zoom, zoom)
//! translate(pan.x / zoom, pan.y / zoom)
//! drawImage(img, -w/2, -h/2, w, h)
//! ```
//!
//! so a point `(lx, ly)` of the drawn box lands on the canvas at
//!
//! ```text
//! canvas = center + R(rotation) * (zoom * local + pan)
//! ```
//!
//! Dividing pan by zoom before the final translate keeps the pan in
//! unscaled canvas pixels, so dragging feels the same at every zoom level.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{clamp_zoom, EditState, PanOffset};

/// Computed geometry for painting one image onto a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawSpec {
    /// Canvas center, where the box center is placed before panning.
    pub center_x: f64,
    pub center_y: f64,
    /// Rotation as requested, sign preserved.
    pub rotation_deg: i32,
    /// Rotation reduced into [0, 360), used for the trigonometry.
    pub normalized_rotation_deg: i32,
    /// Zoom factor after clamping.
    pub scale: f64,
    /// Translation applied after scaling, i.e. pan / scale.
    pub translate_x: f64,
    pub translate_y: f64,
    /// Size of the drawn box before zoom.
    pub width: f64,
    pub height: f64,
}

/// Compute the draw parameters for an image on a `canvas_w` x `canvas_h` canvas.
///
/// The box is fitted in two stages: first to the canvas bounding box, then
/// to the image's own aspect ratio inside it. The result is centered,
/// rotated about the canvas center, scaled by the clamped zoom and panned.
///
/// # Errors
///
/// Returns `Error::InvalidImage` if any natural or canvas dimension is zero.
pub fn compute_draw(
    natural_w: u32,
    natural_h: u32,
    rotation_deg: i32,
    zoom_scale: f64,
    pan: PanOffset,
    canvas_w: u32,
    canvas_h: u32,
) -> Result<DrawSpec> {
    if natural_w == 0 || natural_h == 0 {
        return Err(Error::InvalidImage(format!(
            "natural size {natural_w}x{natural_h} has a zero edge"
        )));
    }
    if canvas_w == 0 || canvas_h == 0 {
        return Err(Error::InvalidImage(format!(
            "canvas size {canvas_w}x{canvas_h} has a zero edge"
        )));
    }

    let (cw, ch) = (canvas_w as f64, canvas_h as f64);
    let canvas_aspect = cw / ch;
    let image_aspect = natural_w as f64 / natural_h as f64;

    let (box_w, box_h) = if canvas_aspect > 1.0 {
        (cw, cw / canvas_aspect)
    } else {
        (ch * canvas_aspect, ch)
    };

    let (width, height) = if image_aspect < canvas_aspect {
        (box_h * image_aspect, box_h)
    } else {
        (box_w, box_w / image_aspect)
    };

    let scale = clamp_zoom(zoom_scale);

    Ok(DrawSpec {
        center_x: cw / 2.0,
        center_y: ch / 2.0,
        rotation_deg,
        normalized_rotation_deg: rotation_deg.rem_euclid(360),
        scale,
        translate_x: pan.x / scale,
        translate_y: pan.y / scale,
        width,
        height,
    })
}

/// [`compute_draw`] for an image's natural size and edit state.
pub fn compute_draw_for(
    natural_w: u32,
    natural_h: u32,
    edit: &EditState,
    canvas_w: u32,
    canvas_h: u32,
) -> Result<DrawSpec> {
    compute_draw(
        natural_w,
        natural_h,
        edit.rotation,
        edit.zoom_scale,
        edit.pan_offset,
        canvas_w,
        canvas_h,
    )
}

impl DrawSpec {
    /// Sine and cosine of the normalized rotation.
    ///
    /// Quarter turns are returned exactly so axis-aligned renders stay
    /// pixel exact.
    fn sin_cos(&self) -> (f64, f64) {
        match self.normalized_rotation_deg {
            0 => (0.0, 1.0),
            90 => (1.0, 0.0),
            180 => (0.0, -1.0),
            270 => (-1.0, 0.0),
            deg => (deg as f64).to_radians().sin_cos(),
        }
    }

    /// Map a canvas point back into normalized box coordinates.
    ///
    /// Returns `(u, v)` where `(0, 0)` is the top-left and `(1, 1)` the
    /// bottom-right corner of the drawn image. The point is covered by the
    /// image iff both lie in `[0, 1)`.
    pub fn source_point(&self, x: f64, y: f64) -> (f64, f64) {
        let (sin, cos) = self.sin_cos();
        let dx = x - self.center_x;
        let dy = y - self.center_y;

        // Undo the rotation: R(-theta)
        let rx = cos * dx + sin * dy;
        let ry = -sin * dx + cos * dy;

        // Undo scale(zoom) and translate(pan / zoom)
        let lx = rx / self.scale - self.translate_x;
        let ly = ry / self.scale - self.translate_y;

        (lx / self.width + 0.5, ly / self.height + 0.5)
    }

    /// Map normalized box coordinates forward onto the canvas.
    pub fn canvas_point(&self, u: f64, v: f64) -> (f64, f64) {
        let (sin, cos) = self.sin_cos();
        let lx = ((u - 0.5) * self.width + self.translate_x) * self.scale;
        let ly = ((v - 0.5) * self.height + self.translate_y) * self.scale;

        (
            self.center_x + cos * lx - sin * ly,
            self.center_y + sin * lx + cos * ly,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn draw(nw: u32, nh: u32, rot: i32, zoom: f64, cw: u32, ch: u32) -> DrawSpec {
        compute_draw(nw, nh, rot, zoom, PanOffset::default(), cw, ch).unwrap()
    }

    #[test]
    fn test_square_on_square_fills_canvas() {
        let spec = draw(500, 500, 0, 1.0, 800, 800);
        assert!(approx(spec.width, 800.0));
        assert!(approx(spec.height, 800.0));
        assert!(approx(spec.center_x, 400.0));
        assert!(approx(spec.center_y, 400.0));
    }

    #[test]
    fn test_tall_source_on_square_canvas() {
        // Height twice the width: full canvas height, half the width.
        let spec = draw(500, 1000, 0, 1.0, 800, 800);
        assert!(approx(spec.height, 800.0));
        assert!(approx(spec.width, 400.0));
        let (left, top) = spec.canvas_point(0.0, 0.0);
        assert!(approx(left, 200.0));
        assert!(approx(top, 0.0));
    }

    #[test]
    fn test_wide_source_letterboxed() {
        let spec = draw(1600, 900, 0, 1.0, 800, 800);
        assert!(approx(spec.width, 800.0));
        assert!(approx(spec.height, 450.0));
        let (_, top) = spec.canvas_point(0.0, 0.0);
        let (_, bottom) = spec.canvas_point(1.0, 1.0);
        assert!(approx(top, 175.0));
        assert!(approx(bottom, 625.0));
    }

    #[test]
    fn test_wide_canvas_fits_portrait_by_height() {
        let spec = draw(900, 1600, 0, 1.0, 1600, 900);
        assert!(approx(spec.height, 900.0));
        assert!(approx(spec.width, 900.0 * 900.0 / 1600.0));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let err = compute_draw(0, 10, 0, 1.0, PanOffset::default(), 10, 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidImage);
        let err = compute_draw(10, 10, 0, 1.0, PanOffset::default(), 10, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidImage);
    }

    #[test]
    fn test_rotation_sign_preserved_but_normalized() {
        let spec = draw(10, 10, -90, 1.0, 10, 10);
        assert_eq!(spec.rotation_deg, -90);
        assert_eq!(spec.normalized_rotation_deg, 270);
    }

    #[test]
    fn test_pan_is_divided_by_zoom() {
        let spec = compute_draw(10, 10, 0, 2.0, PanOffset::new(40.0, -20.0), 100, 100).unwrap();
        assert!(approx(spec.translate_x, 20.0));
        assert!(approx(spec.translate_y, -10.0));
        // The box center moves by the pan in canvas pixels.
        let (cx, cy) = spec.canvas_point(0.5, 0.5);
        assert!(approx(cx, 90.0));
        assert!(approx(cy, 30.0));
    }

    #[test]
    fn test_quarter_turn_maps_top_left_to_top_right() {
        let spec = draw(100, 100, 90, 1.0, 100, 100);
        let (x, y) = spec.canvas_point(0.0, 0.0);
        assert!(approx(x, 100.0));
        assert!(approx(y, 0.0));
    }

    #[test]
    fn test_source_point_inverts_canvas_point() {
        let spec = compute_draw(640, 480, 270, 1.7, PanOffset::new(13.0, -7.5), 300, 200).unwrap();
        for &(u, v) in &[(0.0, 0.0), (0.25, 0.75), (1.0, 1.0), (0.5, 0.1)] {
            let (x, y) = spec.canvas_point(u, v);
            let (bu, bv) = spec.source_point(x, y);
            assert!((bu - u).abs() < 1e-9 && (bv - v).abs() < 1e-9);
        }
    }

    #[test]
    fn test_compute_draw_for_uses_edit_state() {
        let mut edit = EditState::new();
        edit.rotate_right();
        edit.set_zoom(3.0);
        let spec = compute_draw_for(10, 20, &edit, 50, 50).unwrap();
        assert_eq!(spec.rotation_deg, 90);
        assert_eq!(spec.scale, 3.0);
    }
}
