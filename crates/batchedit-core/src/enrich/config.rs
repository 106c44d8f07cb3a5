//! Persisted enrichment settings: workflow API and object storage.
//!
//! The UI shell stores these as JSON under camelCase keys; every field has
//! a default so a partially filled settings page still deserializes.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.coze.cn/v1/workflow/run";
pub const DEFAULT_WORKFLOW_ID: &str = "7476056293154881574";
pub const DEFAULT_REGION: &str = "cn-shanghai";
pub const DEFAULT_ENDPOINT: &str = "https://tos-s3-cn-shanghai.volces.com";
pub const DEFAULT_BUCKET: &str = "images-hh";

/// Workflow API credentials and endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnrichmentConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    /// Workflow that removes the background.
    pub workflow_id: String,
    /// Workflow that expands the canvas; expansion is skipped when unset.
    pub expand_workflow_id: Option<String>,
    pub request_timeout_secs: u64,
    pub storage: StorageConfig,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            workflow_id: DEFAULT_WORKFLOW_ID.to_string(),
            expand_workflow_id: None,
            request_timeout_secs: 60,
            storage: StorageConfig::default(),
        }
    }
}

/// S3-compatible object storage used to hand images to the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// Public base URL objects are served from, if it differs from the endpoint.
    pub public_base_url: Option<String>,
    /// Address buckets as `endpoint/bucket` instead of `bucket.endpoint`.
    pub path_style: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            bucket: DEFAULT_BUCKET.to_string(),
            public_base_url: None,
            path_style: false,
        }
    }
}

impl EnrichmentConfig {
    /// Parse the JSON persisted by the settings page.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidSettings(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidSettings(e.to_string()))
    }

    /// The API credential, trimmed.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingCredential` if no non-blank key is configured.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(Error::MissingCredential)
    }

    /// Check that every field the settings page marks as required is filled in.
    pub fn validate(&self) -> Result<()> {
        self.api_key()?;
        config_url("apiUrl", &self.api_url)?;
        require("workflowId", &self.workflow_id)?;
        self.storage.validate()
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        require("region", &self.region)?;
        config_url("endpoint", &self.endpoint)?;
        require("accessKey", &self.access_key)?;
        require("secretKey", &self.secret_key)?;
        require("bucket", &self.bucket)?;
        if let Some(base) = &self.public_base_url {
            config_url("publicBaseUrl", base)?;
        }
        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::InvalidSettings(format!("`{field}` is required")))
    } else {
        Ok(())
    }
}

pub(crate) fn config_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value.trim())
        .map_err(|e| Error::InvalidSettings(format!("`{field}` is not a valid URL: {e}")))
}
