//! Per-file upload call.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::endpoint::RemoteEndpoint;
use crate::error::UploadError;

/// Remote folder all docs are uploaded below.
const REMOTE_ROOT: &str = ".edit/docs";

/// Where a generated file goes on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub folder: String,
    pub name: String,
}

impl Destination {
    /// `app/Alert.htm` → folder `.edit/docs/app`, name `Alert.htm`.
    pub fn for_file(relative_path: &str) -> Self {
        let dest = format!("{REMOTE_ROOT}/{relative_path}");
        let (folder, name) = dest.rsplit_once('/').unwrap_or((REMOTE_ROOT, relative_path));
        Self {
            folder: folder.to_string(),
            name: name.to_string(),
        }
    }
}

/// JSON body returned by the server for each file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UploadResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// The whole response as JSON, used as the failure detail.
    pub fn payload(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"status\":\"{}\"}}", self.status))
    }
}

/// Sends one file to the device.
///
/// `HttpUploader` talks to a real server; the pipeline only sees this
/// trait so it can be tested with mocks.
pub trait FileUploader: Send + Sync {
    fn upload<'a>(
        &'a self,
        endpoint: &'a RemoteEndpoint,
        local: &'a Path,
        destination: &'a Destination,
    ) -> Pin<Box<dyn Future<Output = Result<UploadResponse, UploadError>> + Send + 'a>>;
}

/// Multipart `POST /upload?folder=<folder>` against the DroidScript server.
pub struct HttpUploader {
    http: reqwest::Client,
}

impl HttpUploader {
    pub fn new(timeout: Duration) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    async fn send(
        &self,
        endpoint: &RemoteEndpoint,
        local: &Path,
        destination: &Destination,
    ) -> Result<UploadResponse, UploadError> {
        let data = tokio::fs::read(local).await?;
        let part = reqwest::multipart::Part::bytes(data).file_name(destination.name.clone());
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!("{}/upload", endpoint.base_url());
        let resp = self
            .http
            .post(&url)
            .query(&[("folder", destination.folder.as_str())])
            .multipart(form)
            .send()
            .await
            .map_err(UploadError::from_transport)?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(UploadError::from_transport)?;
        debug!(
            file = %destination.name,
            folder = %destination.folder,
            status = status.as_u16(),
            "upload response"
        );

        if !status.is_success() {
            return Err(UploadError::Rejected(format!(
                "HTTP {}: {}",
                status.as_u16(),
                String::from_utf8_lossy(&body)
            )));
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

impl FileUploader for HttpUploader {
    fn upload<'a>(
        &'a self,
        endpoint: &'a RemoteEndpoint,
        local: &'a Path,
        destination: &'a Destination,
    ) -> Pin<Box<dyn Future<Output = Result<UploadResponse, UploadError>> + Send + 'a>> {
        Box::pin(self.send(endpoint, local, destination))
    }
}
