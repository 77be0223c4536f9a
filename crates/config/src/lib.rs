//! Project configuration and workspace layout for dsdocs.
//!
//! The documentation workspace owns a `files/conf.json` describing the
//! available languages, versions and scopes. This crate only reads it;
//! the generator scripts are the ones that write it (add-variant,
//! set-version), which is why callers reload it before every command.

mod docs;
mod project;

pub use docs::{DEFAULT_LANGUAGE, DocsConfig, Label};
pub use project::ProjectPaths;

/// Errors produced while loading configuration or discovering a workspace.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not a docs workspace: missing {0}")]
    MissingFile(String),
}
