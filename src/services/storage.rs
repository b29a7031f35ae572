//! Object storage for rendered documents and packets.

use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::GovernanceError;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `body` under `bucket/path` and returns a retrievable URL.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<String, GovernanceError>;
}

/// Storage service speaking the `/storage/v1/object` REST dialect.
pub struct HttpObjectStorage {
    base_url: String,
    api_key: String,
    http_client: Client,
}

impl HttpObjectStorage {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, GovernanceError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http_client,
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<String, GovernanceError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path);
        debug!("Uploading {} bytes to {}", body.len(), url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header("content-type", content_type)
            .header("x-upsert", "true")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GovernanceError::ExternalServiceError(format!(
                "Upload to {}/{} failed with {}: {}",
                bucket, path, status, text
            )));
        }

        Ok(self.public_url(bucket, path))
    }
}

/// Writes objects below a local directory. Used for development and by
/// the operator binaries when no storage service is configured.
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        _content_type: &str,
        body: Vec<u8>,
    ) -> Result<String, GovernanceError> {
        if path.split('/').any(|segment| segment == "..") {
            return Err(GovernanceError::ValidationError(format!(
                "Invalid object path: {}",
                path
            )));
        }

        let target = self.root.join(bucket).join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                GovernanceError::ExternalServiceError(format!(
                    "Failed to create {:?}: {}",
                    parent, e
                ))
            })?;
        }
        tokio::fs::write(&target, body).await.map_err(|e| {
            GovernanceError::ExternalServiceError(format!("Failed to write {:?}: {}", target, e))
        })?;

        info!("Stored {}/{} locally", bucket, path);
        Ok(format!("{}/{}/{}", self.public_base_url, bucket, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_upload_returns_public_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/contracts-executives/a1/appointment_letter_1.html"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"Key": "ok"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let storage =
            HttpObjectStorage::new(&server.uri(), "service-key", Duration::from_secs(5)).unwrap();
        let url = storage
            .upload(
                "contracts-executives",
                "a1/appointment_letter_1.html",
                "text/html",
                b"<p>hi</p>".to_vec(),
            )
            .await
            .unwrap();

        assert_eq!(
            url,
            format!(
                "{}/storage/v1/object/public/contracts-executives/a1/appointment_letter_1.html",
                server.uri()
            )
        );
    }

    #[tokio::test]
    async fn test_http_upload_failure_is_external_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let storage = HttpObjectStorage::new(&server.uri(), "k", Duration::from_secs(5)).unwrap();
        let result = storage.upload("b", "p.html", "text/html", vec![]).await;
        assert!(matches!(result, Err(GovernanceError::ExternalServiceError(_))));
    }

    #[tokio::test]
    async fn test_local_upload_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://files.local/");
        let url = storage
            .upload("governance-documents", "x/packet.html", "text/html", b"packet".to_vec())
            .await
            .unwrap();

        assert_eq!(url, "http://files.local/governance-documents/x/packet.html");
        let written =
            std::fs::read_to_string(dir.path().join("governance-documents/x/packet.html")).unwrap();
        assert_eq!(written, "packet");
        assert!(storage.upload("b", "../escape", "text/html", vec![]).await.is_err());
    }
}
