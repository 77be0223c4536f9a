//! Publishes generated docs to a device running the DroidScript server.
//!
//! # Pipeline
//!
//! 1. **Resolve**: pin wildcard language/version to the configured defaults
//! 2. **Enumerate**: glob the selection under the variant directory
//! 3. **Upload**: reverse order, bounded concurrency, fail-fast
//!
//! [`UploadSession`] wraps the pipeline with the recovery policy: a
//! timeout asks for a new endpoint, any failure offers a retry.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod pipeline;
pub mod session;

pub use client::{Destination, FileUploader, HttpUploader, UploadResponse};
pub use endpoint::{DEFAULT_PORT, EndpointError, RemoteEndpoint};
pub use error::UploadError;
pub use pipeline::{FailedFile, UploadEvent, UploadPipeline, UploadReport};
pub use session::{EndpointStore, UploadPrompts, UploadSession};
