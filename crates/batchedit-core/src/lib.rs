//! Batchedit Core - batch image transform and export library
//!
//! This crate provides the core of the batch editor: decoding uploads,
//! the per-image transform model, canvas rendering, optional AI enrichment
//! through a remote workflow, and packaging edited images into one archive.

pub mod decode;
pub mod encode;
pub mod enrich;
pub mod error;
pub mod model;
pub mod pipeline;
#[cfg(feature = "remote")]
pub mod remote;
pub mod render;
pub mod transform;

pub use encode::{encode, EncodedBitmap};
pub use enrich::{AiEnricher, EnrichRequest, Enricher, EnrichmentConfig, ObjectStore, WorkflowRunner};
pub use error::{Error, ErrorKind, Result};
pub use model::{
    AiFlags, EditState, ImageId, OutputFormat, OutputSettings, PanOffset, SizePreset, SourceImage,
};
pub use pipeline::{
    Archive, CancelToken, CollisionPolicy, ExportPipeline, JobState, NoopProgress, Progress,
    ProgressReporter,
};
pub use render::{render_output, render_preview};
pub use transform::{compute_draw, DrawSpec};
