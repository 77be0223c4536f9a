//! Generated output tree: layout, artifact resolution and file enumeration.
//!
//! Layout produced by the generator:
//!
//! ```text
//! out/
//!   docs/<version>/Docs.htm                  root index, default language
//!   docs/<version>/<ScopeTitle>.htm          scope index
//!   docs/<version>/<scope>/<Page>.htm        artifact
//!   docs-<lang>/<version>/...                other languages
//! ```

mod resolver;
mod scanner;

pub use resolver::{ArtifactResolver, ROOT_INDEX, lang_dir, name_glob};
pub use scanner::{enumerate_files, list_markup_files, upload_glob};

/// Errors produced while resolving or enumerating artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("no versions configured")]
    NoVersion,
}
