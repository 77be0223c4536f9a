//! Selection filter over the documentation variant space.
//!
//! A selection is the 4-tuple (language, version, scope, name). Each
//! field is either a concrete value or the wildcard `*`. Builds accept
//! partial selections; path resolution and uploads first pin language
//! and version to configured defaults.

mod file_filter;
mod filter;
mod pattern;
mod variant;

pub use file_filter::filter_from_path;
pub use filter::{Field, FilterOverride, SelectionFilter, WILDCARD, is_wildcard};
pub use pattern::validate_name_pattern;
pub use variant::{VariantInput, VariantKind, parse_variant_input};

/// User-entered text that cannot be used. Recovered by asking again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid RegExp Pattern: {pattern} ({reason})")]
    InvalidPattern { pattern: String, reason: String },

    #[error("{0}")]
    Variant(String),

    #[error("unknown filter field: {0}")]
    UnknownField(String),

    /// A language, version or scope that the project does not define.
    #[error("{field} {value} is not configured (known: {known})")]
    NotConfigured {
        field: Field,
        value: String,
        known: String,
    },
}
