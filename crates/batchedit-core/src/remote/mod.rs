//! HTTP implementations of the enrichment seams.
//!
//! Only compiled with the `remote` feature; the wasm bindings build
//! without it.

mod s3;
mod workflow;

pub use s3::S3ObjectStore;
pub use workflow::HttpWorkflowRunner;

/// Read an error response body for a message, never failing.
async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "could not read error body".to_string())
}
