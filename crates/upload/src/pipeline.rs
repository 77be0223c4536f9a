//! Enumerate-and-upload with bounded concurrency.

use std::path::{Path, PathBuf};

use dsdocs_artifacts::{ArtifactResolver, enumerate_files};
use dsdocs_config::DocsConfig;
use dsdocs_selection::SelectionFilter;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{Destination, FileUploader};
use crate::endpoint::RemoteEndpoint;
use crate::error::UploadError;

/// Progress notifications for the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Started { total: usize },
    /// One file finished, successfully or not. `increment` is in percent.
    Progress { increment: f64, label: String },
}

/// A file whose upload failed.
#[derive(Debug)]
pub struct FailedFile {
    pub path: String,
    pub error: UploadError,
}

/// Outcome of one pipeline run.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub total: usize,
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedFile>,
    pub cancelled: bool,
}

impl UploadReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }

    /// Files that were never started.
    pub fn skipped(&self) -> usize {
        self.total - self.succeeded.len() - self.failed.len()
    }
}

/// Uploads the generated files a selection covers.
pub struct UploadPipeline<'a> {
    out_dir: PathBuf,
    config: &'a DocsConfig,
    uploader: &'a dyn FileUploader,
    concurrency: usize,
}

impl<'a> UploadPipeline<'a> {
    pub fn new(
        out_dir: impl Into<PathBuf>,
        config: &'a DocsConfig,
        uploader: &'a dyn FileUploader,
        concurrency: usize,
    ) -> Self {
        Self {
            out_dir: out_dir.into(),
            config,
            uploader,
            concurrency: concurrency.max(1),
        }
    }

    /// Uploads every file selected by `filter` to `endpoint`.
    ///
    /// At most `concurrency` uploads are in flight. The first failure or
    /// an observed cancellation stops new uploads from starting; uploads
    /// already in flight are allowed to finish.
    pub async fn upload(
        &self,
        filter: &SelectionFilter,
        endpoint: &RemoteEndpoint,
        cancel: &CancellationToken,
        events_tx: &mpsc::Sender<UploadEvent>,
    ) -> Result<UploadReport, UploadError> {
        let resolver = ArtifactResolver::new(&self.out_dir, self.config);
        let filter = resolver.resolve_selection(filter)?;
        let base = resolver.base_path(&filter.language, &filter.version)?;

        let mut files = enumerate_files(&base, &filter.scope, &filter.name)?;
        files.reverse();

        let total = files.len();
        info!(
            filter = %filter,
            endpoint = %endpoint,
            files = total,
            concurrency = self.concurrency,
            "upload started"
        );
        let _ = events_tx.send(UploadEvent::Started { total }).await;

        let mut report = UploadReport {
            total,
            ..UploadReport::default()
        };
        let increment = if total > 0 { 100.0 / total as f64 } else { 0.0 };

        let mut pending = files.into_iter();
        let mut in_flight = FuturesUnordered::new();
        let mut stopped = false;

        loop {
            while !stopped && in_flight.len() < self.concurrency {
                if cancel.is_cancelled() {
                    debug!("cancellation observed, no further uploads");
                    report.cancelled = true;
                    stopped = true;
                    break;
                }
                let Some(file) = pending.next() else {
                    break;
                };
                in_flight.push(self.upload_one(&base, endpoint, file));
            }

            let Some((file, result)) = in_flight.next().await else {
                break;
            };

            let _ = events_tx
                .send(UploadEvent::Progress {
                    increment,
                    label: file.clone(),
                })
                .await;

            match result {
                Ok(()) => report.succeeded.push(file),
                Err(error) => {
                    warn!(file = %file, error = %error, "upload failed, aborting batch");
                    report.failed.push(FailedFile { path: file, error });
                    stopped = true;
                }
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            skipped = report.skipped(),
            cancelled = report.cancelled,
            "upload finished"
        );
        Ok(report)
    }

    async fn upload_one(
        &self,
        base: &Path,
        endpoint: &RemoteEndpoint,
        file: String,
    ) -> (String, Result<(), UploadError>) {
        let destination = Destination::for_file(&file);
        let local = base.join(&file);
        let result = match self.uploader.upload(endpoint, &local, &destination).await {
            Ok(resp) if resp.is_ok() => Ok(()),
            Ok(resp) => Err(UploadError::Rejected(resp.payload())),
            Err(e) => Err(e),
        };
        debug!(file = %file, ok = result.is_ok(), "file uploaded");
        (file, result)
    }
}
