//! Batchedit WASM - WebAssembly bindings for the batch editor
//!
//! This crate exposes the batchedit-core preview and output rendering to
//! the browser UI shell. Export orchestration and AI enrichment stay in
//! the core crate.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrappers for source images, edit state and settings
//! - `render` - Draw geometry, preview and output rendering
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsSourceImage, JsEditState, JsOutputSettings, render_output } from '@batchedit/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const source = new JsSourceImage('img1', file.name, new Uint8Array(await file.arrayBuffer()));
//! const output = render_output(source, new JsEditState(), new JsOutputSettings(800, 800, 'jpeg'));
//! console.log(`Rendered ${output.width}x${output.height} ${output.mime}`);
//! ```

use wasm_bindgen::prelude::*;

mod render;
mod types;

// Re-export public types
pub use render::{archive_file_name, compute_draw, render_output, render_preview};
pub use types::{JsEditState, JsEncodedImage, JsOutputSettings, JsSourceImage};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
