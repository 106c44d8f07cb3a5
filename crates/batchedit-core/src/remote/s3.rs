use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rusty_s3::{Bucket, Credentials, S3Action, UrlStyle};
use url::Url;

use super::error_body;
use crate::enrich::{config_url, ObjectStore, StorageConfig};
use crate::error::{Error, Result};

/// How long a presigned upload URL stays valid.
const PRESIGN_TTL: Duration = Duration::from_secs(10 * 60);

/// S3-compatible storage reached through presigned PUT URLs.
pub struct S3ObjectStore {
    client: reqwest::Client,
    bucket: Bucket,
    credentials: Credentials,
    public_base_url: Option<Url>,
}

impl S3ObjectStore {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        config.validate()?;

        let endpoint = config_url("endpoint", &config.endpoint)?;
        let style = if config.path_style {
            UrlStyle::Path
        } else {
            UrlStyle::VirtualHost
        };
        let bucket = Bucket::new(
            endpoint,
            style,
            config.bucket.trim().to_string(),
            config.region.trim().to_string(),
        )
        .map_err(|e| Error::InvalidSettings(format!("invalid bucket configuration: {e}")))?;

        let public_base_url = match &config.public_base_url {
            Some(base) => Some(with_trailing_slash(config_url("publicBaseUrl", base)?)),
            None => None,
        };

        Ok(Self {
            client: reqwest::Client::new(),
            bucket,
            credentials: Credentials::new(config.access_key.trim(), config.secret_key.trim()),
            public_base_url,
        })
    }

    /// URL the object under `key` is publicly served from.
    pub fn public_url(&self, key: &str) -> Result<Url> {
        let url = match &self.public_base_url {
            Some(base) => base.join(key),
            None => self.bucket.object_url(key),
        };
        url.map_err(|e| Error::UploadFailed(format!("cannot build a URL for {key}: {e}")))
    }

    fn presigned_put(&self, key: &str) -> Url {
        self.bucket
            .put_object(Some(&self.credentials), key)
            .sign(PRESIGN_TTL)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_png(&self, key: &str, bytes: Vec<u8>) -> Result<Url> {
        let url = self.presigned_put(key);
        debug!("PUT {} ({} bytes)", key, bytes.len());

        let response = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::UploadFailed(format!("failed to reach object storage: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UploadFailed(format!(
                "object storage returned {}: {}",
                status,
                error_body(response).await
            )));
        }

        self.public_url(key)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::remote::canned;

    fn storage() -> StorageConfig {
        StorageConfig {
            access_key: "AK".to_string(),
            secret_key: "SK".to_string(),
            ..StorageConfig::default()
        }
    }

    #[test]
    fn test_virtual_host_object_url() {
        let store = S3ObjectStore::new(&storage()).unwrap();
        let url = store.public_url("1-a-b.png").unwrap();
        assert_eq!(
            url.as_str(),
            "https://images-hh.tos-s3-cn-shanghai.volces.com/1-a-b.png"
        );
    }

    #[test]
    fn test_path_style_object_url() {
        let config = StorageConfig {
            path_style: true,
            ..storage()
        };
        let url = S3ObjectStore::new(&config).unwrap().public_url("k.png").unwrap();
        assert_eq!(
            url.as_str(),
            "https://tos-s3-cn-shanghai.volces.com/images-hh/k.png"
        );
    }

    #[test]
    fn test_public_base_url_wins() {
        let config = StorageConfig {
            public_base_url: Some("https://cdn.example.com/uploads".to_string()),
            ..storage()
        };
        let url = S3ObjectStore::new(&config).unwrap().public_url("k.png").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/uploads/k.png");
    }

    #[test]
    fn test_presigned_put_is_signed() {
        let store = S3ObjectStore::new(&storage()).unwrap();
        let url = store.presigned_put("k.png");
        assert!(url.path().ends_with("/k.png"));
        assert!(url.query_pairs().any(|(k, _)| k == "X-Amz-Signature"));
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let config = StorageConfig {
            secret_key: String::new(),
            ..storage()
        };
        let err = S3ObjectStore::new(&config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidSettings);
    }

    fn local_store(base: &Url) -> S3ObjectStore {
        let config = StorageConfig {
            endpoint: base.to_string(),
            path_style: true,
            ..storage()
        };
        S3ObjectStore::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_put_returns_public_url() {
        let base = canned::serve(vec![(200, "")]).await;
        let url = local_store(&base).put_png("k.png", vec![1, 2, 3]).await.unwrap();
        assert_eq!(url, base.join("images-hh/k.png").unwrap());
    }

    #[tokio::test]
    async fn test_put_forbidden_is_upload_failure() {
        let base = canned::serve(vec![(403, "<Error><Code>AccessDenied</Code></Error>")]).await;
        let err = local_store(&base)
            .put_png("k.png", vec![1, 2, 3])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UploadFailed);
        assert!(err.to_string().contains("AccessDenied"));
    }
}
