//! Canvas renderer: paints one bitmap onto an offscreen RGBA surface.
//!
//! Painting uses inverse mapping: for each output pixel we map its center
//! back through the [`DrawSpec`] into the source image and interpolate.
//!
//! ```text
//! (u, v)  = draw.source_point(x + 0.5, y + 0.5)
//! src_x   = u * src_w - 0.5
//! src_y   = v * src_h - 0.5
//! ```
//!
//! Pixels whose `(u, v)` falls outside `[0, 1)` keep the background.

mod sample;

use image::{Rgba, RgbaImage};

use crate::decode::shrink_to_fit;
use crate::encode::{encode, EncodedBitmap};
use crate::error::{Error, Result};
use crate::model::{EditState, OutputFormat, OutputSettings, SourceImage, MAX_DIMENSION};
use crate::transform::{compute_draw_for, DrawSpec};

use sample::{composite_over, sample_bilinear};

/// Opaque white, the export background for formats without transparency.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Paint `source` onto a new `canvas_w` x `canvas_h` surface.
///
/// With `background` set the surface is filled first; otherwise it starts
/// fully transparent.
///
/// # Errors
///
/// Returns `Error::RenderFailed` if the surface size is zero or larger
/// than [`MAX_DIMENSION`] on either edge, or if the source is empty.
pub fn paint(
    source: &RgbaImage,
    draw: &DrawSpec,
    canvas_w: u32,
    canvas_h: u32,
    background: Option<Rgba<u8>>,
) -> Result<RgbaImage> {
    if !(1..=MAX_DIMENSION).contains(&canvas_w) || !(1..=MAX_DIMENSION).contains(&canvas_h) {
        return Err(Error::RenderFailed(format!(
            "cannot allocate a {canvas_w}x{canvas_h} surface"
        )));
    }
    if source.width() == 0 || source.height() == 0 {
        return Err(Error::RenderFailed("source bitmap is empty".to_string()));
    }

    let fill = background.unwrap_or(Rgba([0, 0, 0, 0]));

    // Shrink oversized sources to roughly their on-canvas size first.
    let drawn_w = (draw.width * draw.scale).ceil().max(1.0) as u32;
    let drawn_h = (draw.height * draw.scale).ceil().max(1.0) as u32;
    let src = shrink_to_fit(source, drawn_w, drawn_h);
    let (src_w, src_h) = (src.width() as f64, src.height() as f64);

    let surface = RgbaImage::from_fn(canvas_w, canvas_h, |x, y| {
        let (u, v) = draw.source_point(x as f64 + 0.5, y as f64 + 0.5);
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return fill;
        }
        let texel = sample_bilinear(&src, u * src_w - 0.5, v * src_h - 0.5);
        composite_over(texel, fill)
    });

    Ok(surface)
}

/// Paint and encode in one step.
pub fn render(
    source: &RgbaImage,
    draw: &DrawSpec,
    canvas_w: u32,
    canvas_h: u32,
    background: Option<Rgba<u8>>,
    format: OutputFormat,
) -> Result<EncodedBitmap> {
    let surface = paint(source, draw, canvas_w, canvas_h, background)?;
    encode(&surface, format)
}

/// Render the editor preview of an image: transparent background, PNG.
///
/// This is the explicit "recompute on change" entry point for the UI shell;
/// it never stores anything on the edit state.
pub fn render_preview(
    source: &SourceImage,
    edit: &EditState,
    settings: &OutputSettings,
) -> Result<EncodedBitmap> {
    let draw = compute_draw_for(
        source.width(),
        source.height(),
        edit,
        settings.target_width,
        settings.target_height,
    )?;
    render(
        source.bitmap(),
        &draw,
        settings.target_width,
        settings.target_height,
        None,
        OutputFormat::Png,
    )
}

/// Render a bitmap into the canonical output canvas for export.
///
/// The background is opaque white unless the output format keeps
/// transparency.
pub fn render_output(
    bitmap: &RgbaImage,
    edit: &EditState,
    settings: &OutputSettings,
) -> Result<EncodedBitmap> {
    let draw = compute_draw_for(
        bitmap.width(),
        bitmap.height(),
        edit,
        settings.target_width,
        settings.target_height,
    )?;
    let background = if settings.format.keeps_transparency() {
        None
    } else {
        Some(WHITE)
    };
    render(
        bitmap,
        &draw,
        settings.target_width,
        settings.target_height,
        background,
        settings.format,
    )
}
