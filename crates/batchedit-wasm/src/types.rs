//! WASM-compatible wrapper types for the batch editor model.
//!
//! These types wrap the core `SourceImage`, `EditState` and `OutputSettings`
//! so the UI shell can hold them as JavaScript objects and pass them back
//! into the rendering functions.

use std::str::FromStr;

use batchedit_core::{EditState, ImageId, OutputFormat, OutputSettings, SizePreset, SourceImage};
use wasm_bindgen::prelude::*;

/// Convert a core error into a JavaScript error string.
pub(crate) fn to_js_error(err: batchedit_core::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// An uploaded image, decoded and upright.
///
/// The bitmap lives in WASM memory; only its dimensions cross into
/// JavaScript.
#[wasm_bindgen]
pub struct JsSourceImage {
    inner: SourceImage,
}

#[wasm_bindgen]
impl JsSourceImage {
    /// Decode `bytes` under the id the UI assigned to the upload.
    #[wasm_bindgen(constructor)]
    pub fn new(id: &str, file_name: &str, bytes: Vec<u8>) -> Result<JsSourceImage, JsValue> {
        let inner = SourceImage::with_id(ImageId::new(id), file_name, bytes).map_err(to_js_error)?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(getter)]
    pub fn id(&self) -> String {
        self.inner.id().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn file_name(&self) -> String {
        self.inner.file_name().to_string()
    }

    /// Natural width after EXIF orientation
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    /// Natural height after EXIF orientation
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// File name without its extension, as used for archive entries
    pub fn base_name(&self) -> String {
        self.inner.base_name()
    }
}

impl JsSourceImage {
    pub(crate) fn inner(&self) -> &SourceImage {
        &self.inner
    }
}

/// Per-image edit state for JavaScript.
#[wasm_bindgen]
#[derive(Default)]
pub struct JsEditState {
    inner: EditState,
}

#[wasm_bindgen]
impl JsEditState {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotation in degrees (multiple of 90, sign preserved)
    #[wasm_bindgen(getter)]
    pub fn rotation(&self) -> i32 {
        self.inner.rotation
    }

    #[wasm_bindgen(getter)]
    pub fn zoom_scale(&self) -> f64 {
        self.inner.zoom_scale
    }

    #[wasm_bindgen(getter)]
    pub fn pan_x(&self) -> f64 {
        self.inner.pan_offset.x
    }

    #[wasm_bindgen(getter)]
    pub fn pan_y(&self) -> f64 {
        self.inner.pan_offset.y
    }

    #[wasm_bindgen(getter)]
    pub fn edited(&self) -> bool {
        self.inner.edited
    }

    #[wasm_bindgen(getter)]
    pub fn remove_background(&self) -> bool {
        self.inner.ai_flags.remove_background
    }

    #[wasm_bindgen(getter)]
    pub fn expand(&self) -> bool {
        self.inner.ai_flags.expand
    }

    pub fn rotate_left(&mut self) {
        self.inner.rotate_left();
    }

    pub fn rotate_right(&mut self) {
        self.inner.rotate_right();
    }

    /// Set the zoom factor, clamped to 0.5..=4.0
    pub fn set_zoom(&mut self, scale: f64) {
        self.inner.set_zoom(scale);
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.inner.zoom_by(delta);
    }

    pub fn pan_to(&mut self, x: f64, y: f64) {
        self.inner.pan_to(x, y);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.inner.pan_by(dx, dy);
    }

    pub fn request_background_removal(&mut self) {
        self.inner.request_background_removal();
    }

    pub fn request_expand(&mut self) {
        self.inner.request_expand();
    }

    /// Reset zoom and pan; rotation and AI flags are kept
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Serialize to a plain JavaScript object
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Restore from a plain JavaScript object
    pub fn from_json(value: JsValue) -> Result<JsEditState, JsValue> {
        let inner: EditState =
            serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { inner })
    }
}

impl JsEditState {
    pub(crate) fn inner(&self) -> &EditState {
        &self.inner
    }
}

/// Global output size and format for JavaScript.
#[wasm_bindgen]
#[derive(Default)]
pub struct JsOutputSettings {
    inner: OutputSettings,
}

#[wasm_bindgen]
impl JsOutputSettings {
    /// Create settings; `format` is `jpeg`, `jpg`, `png` or `webp`.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, format: &str) -> Result<JsOutputSettings, JsValue> {
        let format = OutputFormat::from_str(format).map_err(to_js_error)?;
        let inner = OutputSettings::new(width, height, format);
        inner.validate().map_err(to_js_error)?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.target_width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.target_height
    }

    #[wasm_bindgen(getter)]
    pub fn format(&self) -> String {
        self.inner.format.to_string()
    }

    /// MIME type of exported images
    #[wasm_bindgen(getter)]
    pub fn mime(&self) -> String {
        self.inner.format.mime().to_string()
    }

    /// Apply a size preset (`800`, `1024`, `2048`, `16:9`, `1:1`), keeping the format
    pub fn apply_preset(&mut self, preset: &str) -> Result<(), JsValue> {
        let preset = SizePreset::from_str(preset).map_err(to_js_error)?;
        self.inner.apply_preset(preset);
        Ok(())
    }

    /// Name of the archive an export with these settings produces
    pub fn archive_file_name(&self) -> String {
        self.inner.archive_file_name()
    }
}

impl JsOutputSettings {
    pub(crate) fn inner(&self) -> &OutputSettings {
        &self.inner
    }
}

/// An encoded image returned to JavaScript.
#[wasm_bindgen]
pub struct JsEncodedImage {
    width: u32,
    height: u32,
    mime: String,
    bytes: Vec<u8>,
}

#[wasm_bindgen]
impl JsEncodedImage {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn mime(&self) -> String {
        self.mime.clone()
    }

    /// Returns the encoded bytes as Uint8Array.
    ///
    /// Note: This creates a copy. Wrap it in a `Blob` with `mime` to display it.
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {
        // Dropping self releases the memory
    }
}

impl From<batchedit_core::EncodedBitmap> for JsEncodedImage {
    fn from(encoded: batchedit_core::EncodedBitmap) -> Self {
        Self {
            width: encoded.width,
            height: encoded.height,
            mime: encoded.mime().to_string(),
            bytes: encoded.bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_state_operations() {
        let mut edit = JsEditState::new();
        assert!(!edit.edited());
        edit.rotate_left();
        assert_eq!(edit.rotation(), -90);
        edit.zoom_by(10.0);
        assert_eq!(edit.zoom_scale(), 4.0);
        edit.pan_by(3.0, -2.0);
        assert_eq!((edit.pan_x(), edit.pan_y()), (3.0, -2.0));
        edit.request_background_removal();
        assert!(edit.remove_background());

        edit.reset();
        assert!(!edit.edited());
        assert_eq!(edit.zoom_scale(), 1.0);
        assert_eq!(edit.rotation(), -90);
    }

    #[test]
    fn test_output_settings() {
        let mut settings = JsOutputSettings::new(800, 600, "webp").ok().unwrap();
        assert_eq!(settings.format(), "webp");
        assert_eq!(settings.mime(), "image/webp");
        settings.apply_preset("16:9").ok().unwrap();
        assert_eq!((settings.width(), settings.height()), (1600, 900));
        assert_eq!(settings.archive_file_name(), "edited-images-1600x900-webp.zip");
    }

    #[test]
    fn test_default_output_settings() {
        let settings = JsOutputSettings::default();
        assert_eq!(settings.format(), "jpeg");
        assert_eq!(settings.width(), 800);
    }
}
