//! Batch export: turns the edited images of a session into one archive.
//!
//! An export walks a fixed sequence of states:
//!
//! ```text
//! Idle -> SelectingEdited -> (EnrichingAi) -> Rendering -> Packaging -> Compressing -> Done
//!                                  any stage on error ---------------------------------> Failed
//! ```
//!
//! The job snapshots settings and edit states when it starts, so edits made
//! while it runs never leak into the result. Any error aborts the whole
//! export; no archive is produced for a failed job.

mod archive;
mod progress;
mod queue;

pub use archive::{Archive, ArchiveBuilder, CollisionPolicy};
pub use progress::{JobState, NoopProgress, Progress, ProgressReporter};
pub use queue::TaskQueue;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::RgbaImage;
use log::{debug, error, info};

use crate::encode::EncodedBitmap;
use crate::enrich::{EnrichRequest, Enricher};
use crate::error::{Error, Result};
use crate::model::{EditState, OutputSettings, SourceImage};
use crate::render::render_output;

use progress::compressing_status;

/// Cooperative cancellation flag shared between the caller and a job.
///
/// The job checks it between per-image steps and between stages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Error::Cancelled)` once cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Exports edited images, optionally through an [`Enricher`].
#[derive(Clone)]
pub struct ExportPipeline {
    enricher: Option<Arc<dyn Enricher>>,
    ai_concurrency: usize,
    collision_policy: CollisionPolicy,
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportPipeline {
    /// A pipeline with no enricher: AI-flagged images fail with
    /// `MissingCredential`.
    pub fn new() -> Self {
        Self {
            enricher: None,
            ai_concurrency: 1,
            collision_policy: CollisionPolicy::default(),
        }
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Maximum number of images enriched at once. Defaults to 1.
    pub fn with_ai_concurrency(mut self, limit: usize) -> Self {
        self.ai_concurrency = limit.max(1);
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Export every edited image in `images` with `settings`.
    pub async fn export(
        &self,
        images: &[(SourceImage, EditState)],
        settings: &OutputSettings,
        progress: &dyn ProgressReporter,
    ) -> Result<Archive> {
        self.export_with_cancel(images, settings, progress, &CancelToken::new())
            .await
    }

    /// Like [`export`](Self::export), stopping with `Error::Cancelled` once
    /// `cancel` fires.
    pub async fn export_with_cancel(
        &self,
        images: &[(SourceImage, EditState)],
        settings: &OutputSettings,
        progress: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Archive> {
        let mut job = BatchExportJob::new(images, settings);
        match job.run(self, progress, cancel).await {
            Ok(archive) => Ok(archive),
            Err(err) => {
                error!("Export failed: {}", err);
                progress.report(&Progress::failed(&err));
                Err(err)
            }
        }
    }
}

#[derive(Debug, Clone)]
struct JobItem {
    source: SourceImage,
    edit: EditState,
}

/// One export run over a snapshot of the session.
#[derive(Debug)]
pub struct BatchExportJob {
    settings: OutputSettings,
    items: Vec<JobItem>,
    state: JobState,
}

impl BatchExportJob {
    /// Snapshot `settings` and the edited pairs of `images`, in order.
    pub fn new(images: &[(SourceImage, EditState)], settings: &OutputSettings) -> Self {
        let items = images
            .iter()
            .filter(|(_, edit)| edit.edited)
            .map(|(source, edit)| JobItem {
                source: source.clone(),
                edit: edit.clone(),
            })
            .collect();
        Self {
            settings: *settings,
            items,
            state: JobState::Idle,
        }
    }

    /// Last stage the job entered. Failures surface through the returned
    /// error and a final `Failed` progress event.
    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn settings(&self) -> &OutputSettings {
        &self.settings
    }

    /// Number of images that will end up in the archive.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of images flagged for AI processing.
    pub fn ai_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.edit.ai_flags.any())
            .count()
    }

    fn report(
        &mut self,
        progress: &dyn ProgressReporter,
        state: JobState,
        current: usize,
        total: usize,
        status: impl Into<String>,
    ) {
        if self.state != state {
            debug!("Export job: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
        progress.report(&Progress::new(state, current, total, status));
    }

    async fn run(
        &mut self,
        pipeline: &ExportPipeline,
        progress: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Archive> {
        self.report(progress, JobState::SelectingEdited, 0, 0, "Preparing...");
        cancel.check()?;
        self.settings.validate()?;

        let total = self.items.len();
        let ai_total = self.ai_count();
        info!(
            "Exporting {} edited images ({} with AI) at {}x{} {}",
            total,
            ai_total,
            self.settings.target_width,
            self.settings.target_height,
            self.settings.format
        );

        let enriched = if ai_total > 0 {
            self.enrich(pipeline, progress, cancel).await?
        } else {
            vec![None; total]
        };

        let rendered = self.render(&enriched, progress, cancel)?;
        let builder = self.package(pipeline.collision_policy, rendered, progress, cancel)?;

        let file_name = self.settings.archive_file_name();
        let entries = builder.len();
        self.report(
            progress,
            JobState::Compressing,
            0,
            entries,
            "Generating zip file...",
        );
        let archive = builder.finish(file_name, |done, entries| {
            cancel.check()?;
            self.report(
                progress,
                JobState::Compressing,
                done,
                entries,
                compressing_status(done, entries),
            );
            Ok(())
        })?;

        self.report(progress, JobState::Done, total, total, "Done");
        info!(
            "Export finished: {} ({} entries, {} bytes)",
            archive.file_name,
            archive.len(),
            archive.bytes.len()
        );
        Ok(archive)
    }

    /// Enrich every AI-flagged image. Returns one slot per item; only
    /// flagged items are filled.
    async fn enrich(
        &mut self,
        pipeline: &ExportPipeline,
        progress: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Vec<Option<RgbaImage>>> {
        // Checked before any upload so a missing key wastes no work.
        let enricher = pipeline.enricher.clone().ok_or(Error::MissingCredential)?;
        enricher.ensure_ready()?;

        let (indices, requests): (Vec<usize>, Vec<EnrichRequest>) = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.edit.ai_flags.any())
            .map(|(index, item)| {
                let request = EnrichRequest {
                    source: item.source.clone(),
                    edit: item.edit.clone(),
                    settings: self.settings,
                };
                (index, request)
            })
            .unzip();
        let ai_total = requests.len();

        self.report(
            progress,
            JobState::EnrichingAi,
            0,
            ai_total,
            "Processing images with AI...",
        );

        let queue = TaskQueue::new(pipeline.ai_concurrency);
        let outputs = queue
            .run(
                requests,
                |request| {
                    let enricher = Arc::clone(&enricher);
                    async move {
                        cancel.check()?;
                        debug!("Enriching image {}", request.source.id());
                        enricher.enrich(&request).await
                    }
                },
                |index, _: &EncodedBitmap| {
                    cancel.check()?;
                    self.report(
                        progress,
                        JobState::EnrichingAi,
                        index + 1,
                        ai_total,
                        format!("Processing image {} of {}", index + 1, ai_total),
                    );
                    Ok(())
                },
            )
            .await?;

        let mut enriched = vec![None; self.items.len()];
        for (index, output) in indices.into_iter().zip(outputs) {
            let bitmap = output.decode().map_err(|e| {
                Error::RemoteProcessingFailed(format!("enriched image is unreadable: {e}"))
            })?;
            enriched[index] = Some(bitmap);
        }
        Ok(enriched)
    }

    /// Render every item into the output canvas, in order.
    ///
    /// Enriched bitmaps already carry the user's transforms, so they are
    /// only fitted into the canvas. The stage is entered with the first
    /// finished image, so its counters run from 1 to the item count.
    fn render(
        &mut self,
        enriched: &[Option<RgbaImage>],
        progress: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Vec<EncodedBitmap>> {
        let total = self.items.len();
        let fit = EditState::new();
        let mut rendered = Vec::with_capacity(total);
        for index in 0..total {
            cancel.check()?;
            let item = &self.items[index];
            let output = match &enriched[index] {
                Some(bitmap) => render_output(bitmap, &fit, &self.settings)?,
                None => render_output(item.source.bitmap(), &item.edit, &self.settings)?,
            };
            debug!(
                "Rendered image {} ({} bytes)",
                item.source.id(),
                output.len()
            );
            rendered.push(output);

            self.report(
                progress,
                JobState::Rendering,
                index + 1,
                total,
                format!("Rendering image {} of {}", index + 1, total),
            );
        }
        Ok(rendered)
    }

    fn package(
        &mut self,
        policy: CollisionPolicy,
        rendered: Vec<EncodedBitmap>,
        progress: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<ArchiveBuilder> {
        let total = rendered.len();
        self.report(progress, JobState::Packaging, 0, total, "Packaging images...");

        let extension = self.settings.format.extension();
        let mut builder = ArchiveBuilder::new(policy);
        for (index, output) in rendered.into_iter().enumerate() {
            cancel.check()?;
            let base_name = self.items[index].source.base_name();
            let name = builder.add(&base_name, extension, output.bytes);
            debug!("Packaged {}", name);

            self.report(
                progress,
                JobState::Packaging,
                index + 1,
                total,
                format!("Adding image {} of {} to zip", index + 1, total),
            );
        }
        Ok(builder)
    }
}
