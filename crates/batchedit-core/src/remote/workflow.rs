use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use url::Url;

use super::error_body;
use crate::enrich::{parse_workflow_response, workflow_request_body, EnrichmentConfig, WorkflowRunner};
use crate::error::{Error, Result};

/// Runs workflows over HTTP with a bearer credential.
pub struct HttpWorkflowRunner {
    client: reqwest::Client,
    api_url: Url,
    api_key: Option<String>,
}

impl HttpWorkflowRunner {
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        let api_url = crate::enrich::config_url("apiUrl", &config.api_url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::InvalidSettings(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url,
            api_key: config.api_key().ok().map(str::to_string),
        })
    }
}

#[async_trait]
impl WorkflowRunner for HttpWorkflowRunner {
    async fn run(&self, workflow_id: &str, parameters: serde_json::Value) -> Result<Url> {
        let api_key = self.api_key.as_deref().ok_or(Error::MissingCredential)?;
        let body = workflow_request_body(workflow_id, parameters);

        debug!("POST {} (workflow {})", self.api_url, workflow_id);
        let response = self
            .client
            .post(self.api_url.clone())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                Error::RemoteProcessingFailed(format!("failed to reach workflow API: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::RemoteProcessingFailed(format!(
                "workflow API returned {}: {}",
                status,
                error_body(response).await
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            Error::RemoteProcessingFailed(format!("failed to read workflow response: {e}"))
        })?;
        parse_workflow_response(&bytes)
    }

    async fn download(&self, url: &Url) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            Error::RemoteProcessingFailed(format!("failed to fetch workflow output: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::RemoteProcessingFailed(format!(
                "fetching {} returned {}",
                url, status
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            Error::RemoteProcessingFailed(format!("failed to read workflow output: {e}"))
        })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::remote::canned;

    fn runner_for(base: &Url) -> HttpWorkflowRunner {
        let config = EnrichmentConfig {
            api_url: base.join("v1/workflow/run").unwrap().to_string(),
            api_key: Some("pat_123".to_string()),
            request_timeout_secs: 5,
            ..EnrichmentConfig::default()
        };
        HttpWorkflowRunner::new(&config).unwrap()
    }

    #[test]
    fn test_rejects_bad_api_url() {
        let config = EnrichmentConfig {
            api_url: "not a url".to_string(),
            ..EnrichmentConfig::default()
        };
        let err = HttpWorkflowRunner::new(&config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidSettings);
    }

    #[tokio::test]
    async fn test_run_without_key_makes_no_request() {
        // No key: fails before any network access.
        let runner = HttpWorkflowRunner::new(&EnrichmentConfig::default()).unwrap();
        let err = runner
            .run("1", serde_json::json!({ "input": "https://a/b.png" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingCredential);
    }

    #[tokio::test]
    async fn test_run_returns_output_url() {
        let base = canned::serve(vec![(
            200,
            r#"{"code":0,"msg":"Success","data":"{\"output\":\"https://cdn.example.com/out.png\"}"}"#,
        )])
        .await;
        let url = runner_for(&base)
            .run("1", serde_json::json!({ "input": "https://a/b.png" }))
            .await
            .unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/out.png");
    }

    #[tokio::test]
    async fn test_run_server_error_is_remote_failure() {
        let base = canned::serve(vec![(500, "workflow crashed")]).await;
        let err = runner_for(&base)
            .run("1", serde_json::json!({ "input": "https://a/b.png" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteProcessingFailed);
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("workflow crashed"));
    }

    #[tokio::test]
    async fn test_download_server_error_is_remote_failure() {
        let base = canned::serve(vec![(500, "")]).await;
        let runner = runner_for(&base);
        let err = runner
            .download(&base.join("out.png").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteProcessingFailed);
    }

    #[tokio::test]
    async fn test_download_returns_body() {
        let base = canned::serve(vec![(200, "PNGDATA")]).await;
        let bytes = runner_for(&base)
            .download(&base.join("out.png").unwrap())
            .await
            .unwrap();
        assert_eq!(bytes, b"PNGDATA");
    }
}
