//! AI enrichment: round-trip an image through the remote workflow.
//!
//! The adapter hands the edited preview to a remote workflow by uploading
//! it to object storage and passing the public URL:
//!
//! ```text
//! preview PNG -> ObjectStore::put_png -> WorkflowRunner::run -> download -> decode
//! ```
//!
//! Storage and the workflow API sit behind the [`ObjectStore`] and
//! [`WorkflowRunner`] traits; the `remote` feature provides HTTP
//! implementations of both.

mod config;
mod response;

pub use config::{EnrichmentConfig, StorageConfig};
#[cfg(feature = "remote")]
pub(crate) use config::config_url;
pub use response::{parse_workflow_response, workflow_request_body};

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::json;
use url::Url;

use crate::encode::{encode, EncodedBitmap};
use crate::error::{Error, Result};
use crate::model::{EditState, ImageId, OutputFormat, OutputSettings, SourceImage};
use crate::render::render_preview;

/// One image to enrich, as snapshotted by the export job.
#[derive(Debug, Clone)]
pub struct EnrichRequest {
    pub source: SourceImage,
    pub edit: EditState,
    pub settings: OutputSettings,
}

/// Turns an edited image into its AI-processed bitmap.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Check that credentials are configured. Performs no I/O.
    fn ensure_ready(&self) -> Result<()>;

    /// Run every flagged workflow on the image and return the final bitmap.
    async fn enrich(&self, request: &EnrichRequest) -> Result<EncodedBitmap>;
}

/// Publicly readable object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a PNG under `key` and return the URL it can be fetched from.
    ///
    /// Fails with `Error::UploadFailed`.
    async fn put_png(&self, key: &str, bytes: Vec<u8>) -> Result<Url>;
}

/// The remote workflow API.
#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    /// Run `workflow_id` and return the URL of its output.
    ///
    /// Fails with `Error::RemoteProcessingFailed`.
    async fn run(&self, workflow_id: &str, parameters: serde_json::Value) -> Result<Url>;

    /// Fetch a workflow output.
    async fn download(&self, url: &Url) -> Result<Vec<u8>>;
}

/// [`Enricher`] backed by object storage and the workflow API.
pub struct AiEnricher {
    store: Arc<dyn ObjectStore>,
    runner: Arc<dyn WorkflowRunner>,
    api_key: Option<String>,
    workflow_id: String,
    expand_workflow_id: Option<String>,
}

impl AiEnricher {
    pub fn new(
        config: &EnrichmentConfig,
        store: Arc<dyn ObjectStore>,
        runner: Arc<dyn WorkflowRunner>,
    ) -> Self {
        Self {
            store,
            runner,
            api_key: config.api_key().ok().map(str::to_string),
            workflow_id: config.workflow_id.trim().to_string(),
            expand_workflow_id: config
                .expand_workflow_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        }
    }

    /// Build an enricher talking HTTP to the configured services.
    #[cfg(feature = "remote")]
    pub fn from_config(config: &EnrichmentConfig) -> Result<Self> {
        use crate::remote::{HttpWorkflowRunner, S3ObjectStore};

        let store = Arc::new(S3ObjectStore::new(&config.storage)?);
        let runner = Arc::new(HttpWorkflowRunner::new(config)?);
        Ok(Self::new(config, store, runner))
    }

    async fn run_workflow(
        &self,
        workflow_id: &str,
        id: &ImageId,
        key: &str,
        png: Vec<u8>,
        mut parameters: serde_json::Value,
    ) -> Result<Vec<u8>> {
        let input = self.store.put_png(key, png).await?;
        debug!("Uploaded {} for image {} to {}", key, id, input);

        parameters["input"] = json!(input.as_str());
        let output = self.runner.run(workflow_id, parameters).await?;
        debug!("Workflow {} produced {} for image {}", workflow_id, output, id);

        self.runner.download(&output).await
    }
}

#[async_trait]
impl Enricher for AiEnricher {
    fn ensure_ready(&self) -> Result<()> {
        match &self.api_key {
            Some(_) => Ok(()),
            None => Err(Error::MissingCredential),
        }
    }

    async fn enrich(&self, request: &EnrichRequest) -> Result<EncodedBitmap> {
        self.ensure_ready()?;

        let source = &request.source;
        let flags = request.edit.ai_flags;
        let mut current = render_preview(source, &request.edit, &request.settings)?.bytes;
        let mut remote = false;

        if flags.remove_background {
            let key = object_key(unix_millis(), source.id(), source.file_name(), "");
            current = self
                .run_workflow(&self.workflow_id, source.id(), &key, current, json!({}))
                .await?;
            remote = true;
        }

        if flags.expand {
            match &self.expand_workflow_id {
                Some(workflow_id) => {
                    let key =
                        object_key(unix_millis(), source.id(), source.file_name(), "-expanded");
                    // The previous step may have returned JPEG or WebP; the
                    // store is always told it is PNG, so normalize first.
                    if remote {
                        current = encode(&decode_output(&current)?, OutputFormat::Png)?.bytes;
                    }
                    let parameters = json!({
                        "width": request.settings.target_width,
                        "height": request.settings.target_height,
                    });
                    current = self
                        .run_workflow(workflow_id, source.id(), &key, current, parameters)
                        .await?;
                    remote = true;
                }
                None => warn!(
                    "Expand requested for image {} but no expand workflow is configured; skipping",
                    source.id()
                ),
            }
        }

        let bitmap = if remote {
            decode_output(&current)?
        } else {
            // Nothing ran remotely; the preview is already a valid PNG.
            crate::decode::decode_image(&current)?
        };
        encode(&bitmap, OutputFormat::Png)
    }
}

fn decode_output(bytes: &[u8]) -> Result<image::RgbaImage> {
    crate::decode::decode_image(bytes).map_err(|e| {
        Error::RemoteProcessingFailed(format!("workflow output is not a usable image: {e}"))
    })
}

fn unix_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Object key for an upload: `<millis>-<id>-<file name><suffix>.png`.
///
/// The id keeps repeated file names from colliding within one millisecond.
pub fn object_key(millis: i64, id: &ImageId, file_name: &str, suffix: &str) -> String {
    format!(
        "{}-{}-{}{}.png",
        millis,
        sanitize_key_segment(id.as_str()),
        sanitize_key_segment(file_name),
        suffix
    )
}

/// Keep ASCII alphanumerics, `.`, `-` and `_`; replace everything else with `_`.
fn sanitize_key_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}
