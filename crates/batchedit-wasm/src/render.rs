//! WASM bindings for preview and output rendering.
//!
//! The UI shell recomputes a preview whenever an edit changes and renders
//! single images for export with these functions.
//!
//! # Example
//!
//! ```typescript
//! import { JsSourceImage, JsEditState, JsOutputSettings, render_preview } from '@batchedit/wasm';
//!
//! const source = new JsSourceImage(id, file.name, new Uint8Array(await file.arrayBuffer()));
//! const edit = new JsEditState();
//! edit.rotate_right();
//! const preview = render_preview(source, edit, new JsOutputSettings(800, 800, 'jpeg'));
//! img.src = URL.createObjectURL(new Blob([preview.bytes()], { type: preview.mime }));
//! ```

use crate::types::{to_js_error, JsEditState, JsEncodedImage, JsOutputSettings, JsSourceImage};
use batchedit_core::render::{render_output as core_render_output, render_preview as core_render_preview};
use batchedit_core::transform::compute_draw_for;
use wasm_bindgen::prelude::*;

/// Compute where an image is drawn on the output canvas.
///
/// Returns a plain object with `centerX`, `centerY`, `rotationDeg`,
/// `normalizedRotationDeg`, `scale`, `translateX`, `translateY`, `width`
/// and `height`, matching the canvas 2D transform stack.
#[wasm_bindgen]
pub fn compute_draw(
    source: &JsSourceImage,
    edit: &JsEditState,
    settings: &JsOutputSettings,
) -> Result<JsValue, JsValue> {
    let settings = settings.inner();
    let draw = compute_draw_for(
        source.inner().width(),
        source.inner().height(),
        edit.inner(),
        settings.target_width,
        settings.target_height,
    )
    .map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&draw).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Render the editor preview: transparent background, PNG.
#[wasm_bindgen]
pub fn render_preview(
    source: &JsSourceImage,
    edit: &JsEditState,
    settings: &JsOutputSettings,
) -> Result<JsEncodedImage, JsValue> {
    core_render_preview(source.inner(), edit.inner(), settings.inner())
        .map(JsEncodedImage::from)
        .map_err(to_js_error)
}

/// Render one image as it will appear in the export archive.
///
/// The background is white unless the output format is PNG.
#[wasm_bindgen]
pub fn render_output(
    source: &JsSourceImage,
    edit: &JsEditState,
    settings: &JsOutputSettings,
) -> Result<JsEncodedImage, JsValue> {
    core_render_output(source.inner().bitmap(), edit.inner(), settings.inner())
        .map(JsEncodedImage::from)
        .map_err(to_js_error)
}

/// Name of the archive for the given settings.
#[wasm_bindgen]
pub fn archive_file_name(settings: &JsOutputSettings) -> String {
    settings.inner().archive_file_name()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn source() -> JsSourceImage {
        JsSourceImage::new("img1", "photo.png", png_bytes(32, 16)).ok().unwrap()
    }

    #[test]
    fn test_source_image_getters() {
        let source = source();
        assert_eq!(source.id(), "img1");
        assert_eq!((source.width(), source.height()), (32, 16));
        assert_eq!(source.base_name(), "photo");
    }

    #[test]
    fn test_render_preview_is_png() {
        let settings = JsOutputSettings::new(64, 64, "jpeg").ok().unwrap();
        let preview = render_preview(&source(), &JsEditState::new(), &settings).ok().unwrap();
        assert_eq!(preview.mime(), "image/png");
        assert_eq!((preview.width(), preview.height()), (64, 64));
    }

    #[test]
    fn test_render_output_uses_settings_format() {
        let settings = JsOutputSettings::new(48, 24, "jpg").ok().unwrap();
        let output = render_output(&source(), &JsEditState::new(), &settings).ok().unwrap();
        assert_eq!(output.mime(), "image/jpeg");
        assert_eq!(&output.bytes()[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_archive_file_name() {
        let settings = JsOutputSettings::new(1024, 1024, "png").ok().unwrap();
        assert_eq!(archive_file_name(&settings), "edited-images-1024x1024-png.zip");
    }
}

/// Tests that cross the `JsValue` boundary.
///
/// These only run on wasm32 targets. Use `wasm-pack test` to run them.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Cursor;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Drawn {
        center_x: f64,
        center_y: f64,
        rotation_deg: i32,
        normalized_rotation_deg: i32,
        scale: f64,
        translate_x: f64,
        width: f64,
        height: f64,
    }

    fn source(width: u32, height: u32) -> JsSourceImage {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        JsSourceImage::new("img1", "photo.png", bytes.into_inner()).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_compute_draw_returns_camel_case_object() {
        let mut edit = JsEditState::new();
        edit.rotate_left();
        edit.set_zoom(2.0);
        edit.pan_to(8.0, 0.0);
        let settings = JsOutputSettings::new(64, 64, "png").unwrap();

        let value = compute_draw(&source(32, 16), &edit, &settings).unwrap();
        let drawn: Drawn = serde_wasm_bindgen::from_value(value).unwrap();

        assert_eq!((drawn.center_x, drawn.center_y), (32.0, 32.0));
        assert_eq!(drawn.rotation_deg, -90);
        assert_eq!(drawn.normalized_rotation_deg, 270);
        assert_eq!(drawn.scale, 2.0);
        assert_eq!(drawn.translate_x, 4.0);
        assert_eq!((drawn.width, drawn.height), (64.0, 32.0));
    }

    #[wasm_bindgen_test]
    fn test_render_output_png_keeps_transparency() {
        let settings = JsOutputSettings::new(32, 32, "png").unwrap();
        let output = render_output(&source(32, 16), &JsEditState::new(), &settings).unwrap();
        let img = image::load_from_memory(&output.bytes()).unwrap().to_rgba8();
        // Letterbox rows above the 32x16 image stay transparent.
        assert_eq!(img.get_pixel(16, 0)[3], 0);
        assert_eq!(img.get_pixel(16, 16)[3], 255);
    }
}
