//! Data model: source images, per-image edit state and output settings.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::decode::decode_image;
use crate::error::{Error, Result};

/// Smallest zoom factor the editor allows.
pub const MIN_ZOOM: f64 = 0.5;
/// Largest zoom factor the editor allows.
pub const MAX_ZOOM: f64 = 4.0;
/// Largest output edge, in pixels.
pub const MAX_DIMENSION: u32 = 8192;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of an ingested image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate an id that is unique within this process.
    pub fn generate() -> Self {
        let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Self(format!(
            "img{:x}{:04x}",
            chrono::Utc::now().timestamp_millis(),
            seq
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ingested image. Immutable; clones share the underlying buffers.
#[derive(Debug, Clone)]
pub struct SourceImage {
    id: ImageId,
    file_name: String,
    bytes: Arc<[u8]>,
    bitmap: Arc<RgbaImage>,
}

impl SourceImage {
    /// Decode `bytes` and wrap them with a freshly generated id.
    pub fn ingest(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        Self::with_id(ImageId::generate(), file_name, bytes)
    }

    /// Decode `bytes` under a caller-chosen id.
    pub fn with_id(id: ImageId, file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let bitmap = decode_image(&bytes)?;
        Ok(Self {
            id,
            file_name: file_name.into(),
            bytes: bytes.into(),
            bitmap: Arc::new(bitmap),
        })
    }

    pub fn id(&self) -> &ImageId {
        &self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The bytes exactly as they were ingested.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The decoded, upright bitmap.
    pub fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }

    /// Natural width in pixels after EXIF orientation.
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    /// Natural height in pixels after EXIF orientation.
    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    /// File name with its last extension removed (`a.b.png` -> `a.b`).
    ///
    /// Falls back to the image id when nothing is left, e.g. for `.png`.
    pub fn base_name(&self) -> String {
        let stem = match self.file_name.rsplit_once('.') {
            Some((stem, ext)) if !ext.is_empty() && !ext.contains(['/', '\\']) => stem,
            _ => self.file_name.as_str(),
        };
        if stem.is_empty() {
            self.id.to_string()
        } else {
            stem.to_string()
        }
    }
}

/// Pan offset in unscaled canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PanOffset {
    pub x: f64,
    pub y: f64,
}

impl PanOffset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Remote processing requested for an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiFlags {
    pub remove_background: bool,
    pub expand: bool,
}

impl AiFlags {
    /// True when any remote processing is requested.
    pub fn any(&self) -> bool {
        self.remove_background || self.expand
    }
}

/// Per-image transforms and AI flags applied by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditState {
    /// Degrees, a multiple of 90. Not normalized; may be negative.
    pub rotation: i32,
    /// Zoom factor, kept within [`MIN_ZOOM`, `MAX_ZOOM`] by the setters.
    pub zoom_scale: f64,
    pub pan_offset: PanOffset,
    /// Set once any transform or AI flag has been applied.
    pub edited: bool,
    pub ai_flags: AiFlags,
}

impl Default for EditState {
    fn default() -> Self {
        Self {
            rotation: 0,
            zoom_scale: 1.0,
            pan_offset: PanOffset::default(),
            edited: false,
            ai_flags: AiFlags::default(),
        }
    }
}

impl EditState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotate 90 degrees counter-clockwise. The sign of the result is kept.
    pub fn rotate_left(&mut self) {
        self.rotation = (self.rotation % 360 - 90) % 360;
        self.edited = true;
    }

    /// Rotate 90 degrees clockwise. The sign of the result is kept.
    pub fn rotate_right(&mut self) {
        self.rotation = (self.rotation % 360 + 90) % 360;
        self.edited = true;
    }

    pub fn set_zoom(&mut self, scale: f64) {
        self.zoom_scale = clamp_zoom(scale);
        self.edited = true;
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.set_zoom(self.zoom_scale + delta);
    }

    pub fn pan_to(&mut self, x: f64, y: f64) {
        self.pan_offset = PanOffset::new(x, y);
        self.edited = true;
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_to(self.pan_offset.x + dx, self.pan_offset.y + dy);
    }

    pub fn request_background_removal(&mut self) {
        self.ai_flags.remove_background = true;
        self.edited = true;
    }

    pub fn request_expand(&mut self) {
        self.ai_flags.expand = true;
        self.edited = true;
    }

    /// Reset zoom and pan and mark the image as unedited.
    ///
    /// Rotation and AI flags survive a reset.
    pub fn reset(&mut self) {
        self.zoom_scale = 1.0;
        self.pan_offset = PanOffset::default();
        self.edited = false;
    }
}

/// Clamp a zoom factor into the supported range. NaN maps to 1.
pub fn clamp_zoom(scale: f64) -> f64 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Encoding of exported images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    /// File extension used inside the archive.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
        }
    }

    /// Whether exports keep a transparent background instead of white.
    pub fn keeps_transparency(self) -> bool {
        matches!(self, OutputFormat::Png)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::Webp),
            other => Err(Error::InvalidSettings(format!(
                "unsupported output format: {other}"
            ))),
        }
    }
}

/// Size presets offered by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SizePreset {
    Square800,
    Square1024,
    Square2048,
    /// 16:9 at 1600x900.
    Widescreen,
    /// 1:1 at 1000x1000.
    Square1000,
}

impl SizePreset {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            SizePreset::Square800 => (800, 800),
            SizePreset::Square1024 => (1024, 1024),
            SizePreset::Square2048 => (2048, 2048),
            SizePreset::Widescreen => (1600, 900),
            SizePreset::Square1000 => (1000, 1000),
        }
    }
}

impl FromStr for SizePreset {
    type Err = Error;

    /// Parse the preset keys used by the settings panel.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "800" => Ok(SizePreset::Square800),
            "1024" => Ok(SizePreset::Square1024),
            "2048" => Ok(SizePreset::Square2048),
            "16:9" => Ok(SizePreset::Widescreen),
            "1:1" => Ok(SizePreset::Square1000),
            other => Err(Error::InvalidSettings(format!("unknown size preset: {other}"))),
        }
    }
}

/// Global output size and format shared by every image of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSettings {
    pub target_width: u32,
    pub target_height: u32,
    pub format: OutputFormat,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            target_width: 800,
            target_height: 800,
            format: OutputFormat::Jpeg,
        }
    }
}

impl OutputSettings {
    pub fn new(target_width: u32, target_height: u32, format: OutputFormat) -> Self {
        Self {
            target_width,
            target_height,
            format,
        }
    }

    /// Replace the target size with a preset, keeping the format.
    pub fn apply_preset(&mut self, preset: SizePreset) {
        let (width, height) = preset.dimensions();
        self.target_width = width;
        self.target_height = height;
    }

    /// Check that both edges are within 1..=[`MAX_DIMENSION`].
    pub fn validate(&self) -> Result<()> {
        let in_range = |v: u32| (1..=MAX_DIMENSION).contains(&v);
        if in_range(self.target_width) && in_range(self.target_height) {
            Ok(())
        } else {
            Err(Error::InvalidSettings(format!(
                "output size {}x{} must be between 1 and {MAX_DIMENSION} on each edge",
                self.target_width, self.target_height
            )))
        }
    }

    /// Name of the archive produced with these settings.
    pub fn archive_file_name(&self) -> String {
        format!(
            "edited-images-{}x{}-{}.zip",
            self.target_width, self.target_height, self.format
        )
    }
}
