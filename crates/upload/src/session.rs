//! Upload with the recovery policy around it.

use std::future::Future;
use std::pin::Pin;

use dsdocs_selection::SelectionFilter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::endpoint::RemoteEndpoint;
use crate::error::UploadError;
use crate::pipeline::{UploadEvent, UploadPipeline, UploadReport};

/// Persistent home of the server address.
pub trait EndpointStore: Send + Sync {
    /// Stored address as entered, possibly without a port.
    fn server_ip(&self) -> Option<String>;

    /// Port appended to bare addresses.
    fn port(&self) -> u16;

    fn save(&self, endpoint: &RemoteEndpoint) -> std::io::Result<()>;
}

/// User interaction needed by the recovery flow.
pub trait UploadPrompts: Send + Sync {
    /// Asks for a server address, pre-filled with `current`. `None` when
    /// the user dismisses the prompt.
    fn ask_endpoint<'a>(
        &'a self,
        current: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;

    /// Shows a failure with a "Retry" action; `true` when it was chosen.
    fn offer_retry<'a>(
        &'a self,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

    fn info(&self, message: &str);

    fn error(&self, message: &str);
}

/// Runs uploads and handles their failures interactively.
pub struct UploadSession<'a> {
    pipeline: &'a UploadPipeline<'a>,
    store: &'a dyn EndpointStore,
    prompts: &'a dyn UploadPrompts,
}

impl<'a> UploadSession<'a> {
    pub fn new(
        pipeline: &'a UploadPipeline<'a>,
        store: &'a dyn EndpointStore,
        prompts: &'a dyn UploadPrompts,
    ) -> Self {
        Self {
            pipeline,
            store,
            prompts,
        }
    }

    /// Uploads `filter`, retrying from scratch while the user asks to.
    ///
    /// Without a valid stored endpoint the user is asked for one and the
    /// upload does not start. A connect failure or timeout asks for a new
    /// endpoint before offering the retry. Cancellation is reported and
    /// never retried.
    pub async fn run(
        &self,
        filter: &SelectionFilter,
        cancel: &CancellationToken,
        events_tx: &mpsc::Sender<UploadEvent>,
    ) -> Result<UploadReport, UploadError> {
        loop {
            let Some(endpoint) = self.stored_endpoint() else {
                self.reconfigure_endpoint().await;
                return Err(UploadError::NoEndpoint);
            };

            let report = match self.pipeline.upload(filter, &endpoint, cancel, events_tx).await {
                Ok(report) => report,
                Err(e) => {
                    self.prompts.error(&format!("Upload Failed: {e}"));
                    return Err(e);
                }
            };

            if report.cancelled {
                self.prompts.error("Upload Cancelled");
                return Ok(report);
            }

            let Some(failure) = report.failed.first() else {
                self.prompts.info("Upload Successful");
                return Ok(report);
            };

            if failure.error.is_connectivity() {
                self.reconfigure_endpoint().await;
            }
            let message = format!("Upload Failed: {}", failure.error);
            if !self.prompts.offer_retry(&message).await {
                return Ok(report);
            }
            info!(filter = %filter, "retrying upload");
        }
    }

    /// Asks for a new server address until a valid one or none is given.
    ///
    /// Returns the saved endpoint.
    pub async fn reconfigure_endpoint(&self) -> Option<RemoteEndpoint> {
        let port = self.store.port();
        let current = self
            .store
            .server_ip()
            .map(|ip| RemoteEndpoint::prompt_value(&ip, port))
            .unwrap_or_default();

        loop {
            let answer = self.prompts.ask_endpoint(&current).await;
            let Some(answer) = answer.filter(|a| !a.trim().is_empty()) else {
                self.prompts.error("Server IP not updated!");
                return None;
            };

            let endpoint = match RemoteEndpoint::parse_or_default_port(&answer, port) {
                Ok(endpoint) => endpoint,
                Err(e) => {
                    self.prompts.error(&e.to_string());
                    continue;
                }
            };

            if let Err(e) = self.store.save(&endpoint) {
                warn!(error = %e, "failed to save server endpoint");
                self.prompts.error("Server IP not updated!");
                return None;
            }
            info!(endpoint = %endpoint, "server endpoint updated");
            self.prompts.info("Server IP updated!");
            return Some(endpoint);
        }
    }

    fn stored_endpoint(&self) -> Option<RemoteEndpoint> {
        let stored = self.store.server_ip()?;
        RemoteEndpoint::parse(&stored).ok()
    }
}
