//! Progress events emitted by an export job.

use serde::Serialize;

use crate::error::{Error, ErrorKind};

/// Lifecycle of a [`BatchExportJob`](super::BatchExportJob).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    Idle,
    SelectingEdited,
    EnrichingAi,
    Rendering,
    Packaging,
    Compressing,
    Done,
    Failed,
}

impl JobState {
    /// True for `Done` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

/// One progress event: the job's state plus its counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub state: JobState,
    pub current: usize,
    pub total: usize,
    pub status: String,
    /// Set only on the terminal `Failed` event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl Progress {
    pub fn new(state: JobState, current: usize, total: usize, status: impl Into<String>) -> Self {
        Self {
            state,
            current,
            total,
            status: status.into(),
            error: None,
        }
    }

    /// The terminal event for a failed job. Counters are cleared.
    pub fn failed(error: &Error) -> Self {
        Self {
            state: JobState::Failed,
            current: 0,
            total: 0,
            status: error.to_string(),
            error: Some(error.kind()),
        }
    }
}

/// Observer the UI shell implements to follow an export.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: &Progress);
}

impl<F> ProgressReporter for F
where
    F: Fn(&Progress) + Send + Sync,
{
    fn report(&self, progress: &Progress) {
        self(progress)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _progress: &Progress) {}
}

/// `Compressing: N%` for `done` of `total` entries.
pub(crate) fn compressing_status(done: usize, total: usize) -> String {
    let percent = if total == 0 {
        100.0
    } else {
        done as f64 * 100.0 / total as f64
    };
    format!("Compressing: {}%", percent.round() as u32)
}
