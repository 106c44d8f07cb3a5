//! Error taxonomy shared by every stage of the export pipeline.

use serde::Serialize;
use thiserror::Error;

/// Errors produced while decoding, rendering, enriching or packaging images.
#[derive(Debug, Error)]
pub enum Error {
    /// Zero dimensions or bytes that cannot be decoded as an image.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// The drawing surface could not be created or encoding failed.
    #[error("Render failed: {0}")]
    RenderFailed(String),

    /// Object storage rejected the upload or could not be reached.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// The workflow call errored, returned a bad status, or a malformed envelope.
    #[error("Remote processing failed: {0}")]
    RemoteProcessingFailed(String),

    /// AI processing was requested but no API key is configured.
    #[error("No API key configured; set one in settings before exporting AI-processed images")]
    MissingCredential,

    /// Packaging or compressing the archive failed.
    #[error("Archive failed: {0}")]
    ArchiveFailed(String),

    /// Output settings or enrichment configuration are out of range.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// The caller cancelled the export between two steps.
    #[error("Export cancelled")]
    Cancelled,
}

/// Discriminant of [`Error`], carried by the terminal `Failed` progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidImage,
    RenderFailed,
    UploadFailed,
    RemoteProcessingFailed,
    MissingCredential,
    ArchiveFailed,
    InvalidSettings,
    Cancelled,
}

impl Error {
    /// The kind of failure, without the message.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidImage(_) => ErrorKind::InvalidImage,
            Error::RenderFailed(_) => ErrorKind::RenderFailed,
            Error::UploadFailed(_) => ErrorKind::UploadFailed,
            Error::RemoteProcessingFailed(_) => ErrorKind::RemoteProcessingFailed,
            Error::MissingCredential => ErrorKind::MissingCredential,
            Error::ArchiveFailed(_) => ErrorKind::ArchiveFailed,
            Error::InvalidSettings(_) => ErrorKind::InvalidSettings,
            Error::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ArchiveFailed(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
