//! Pixel sampling and alpha compositing.

use image::{Rgba, RgbaImage};

/// Premultiplied RGBA, each channel in 0..=255.
type Premultiplied = [f64; 4];

#[inline]
fn premultiplied(image: &RgbaImage, px: u32, py: u32) -> Premultiplied {
    let p = image.get_pixel(px, py).0;
    let a = p[3] as f64 / 255.0;
    [p[0] as f64 * a, p[1] as f64 * a, p[2] as f64 * a, p[3] as f64]
}

/// Sample a pixel using bilinear interpolation.
///
/// Coordinates are in source pixel space with pixel centers on integers.
/// Samples past the border are clamped to the edge pixels. Interpolation
/// happens on premultiplied values so transparent texels do not darken
/// their neighbours.
pub(super) fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> Premultiplied {
    let max_x = (image.width() - 1) as f64;
    let max_y = (image.height() - 1) as f64;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(image.width() - 1);
    let y1 = (y0 + 1).min(image.height() - 1);

    // Fractional distances
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = premultiplied(image, x0, y0);
    let p10 = premultiplied(image, x1, y0);
    let p01 = premultiplied(image, x0, y1);
    let p11 = premultiplied(image, x1, y1);

    let mut result = [0.0; 4];
    for i in 0..4 {
        result[i] = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
    }
    result
}

/// Composite a premultiplied texel over a straight-alpha background.
pub(super) fn composite_over(src: Premultiplied, dst: Rgba<u8>) -> Rgba<u8> {
    let src_a = src[3] / 255.0;
    let dst_a = dst[3] as f64 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (src[i] + dst[i] as f64 * dst_a * (1.0 - src_a)) / out_a;
        out[i] = c.clamp(0.0, 255.0).round() as u8;
    }
    out[3] = (out_a * 255.0).clamp(0.0, 255.0).round() as u8;
    Rgba(out)
}
