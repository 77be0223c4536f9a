//! Upload error types.

/// Errors produced while uploading docs.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The server answered with anything but `status: ok`.
    #[error("{0}")]
    Rejected(String),

    /// Connect failure or timeout; the endpoint is probably wrong.
    #[error("connection failed: {0}")]
    Connectivity(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cancelled")]
    Cancelled,

    #[error("no valid server endpoint configured")]
    NoEndpoint,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("artifact error: {0}")]
    Artifact(#[from] dsdocs_artifacts::ArtifactError),
}

impl UploadError {
    /// Whether the failure suggests reconfiguring the endpoint.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, UploadError::Connectivity(_))
    }

    /// Maps transport failures, separating connect/timeout errors.
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            UploadError::Connectivity(e.to_string())
        } else {
            UploadError::Http(e)
        }
    }
}
