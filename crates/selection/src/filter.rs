//! The selection 4-tuple and its merge/serialization rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Sentinel meaning "unconstrained".
pub const WILDCARD: &str = "*";

pub fn is_wildcard(value: &str) -> bool {
    value == WILDCARD
}

/// One of the four selection axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Language,
    Version,
    Scope,
    Name,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Language, Field::Version, Field::Scope, Field::Name];

    pub fn label(self) -> &'static str {
        match self {
            Field::Language => "language",
            Field::Version => "version",
            Field::Scope => "scope",
            Field::Name => "name",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Field {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "language" | "lang" => Ok(Field::Language),
            "version" | "ver" => Ok(Field::Version),
            "scope" => Ok(Field::Scope),
            "name" => Ok(Field::Name),
            other => Err(ValidationError::UnknownField(other.to_string())),
        }
    }
}

/// Which documentation variant(s) an operation targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionFilter {
    #[serde(alias = "lang")]
    pub language: String,
    #[serde(alias = "ver")]
    pub version: String,
    pub scope: String,
    pub name: String,
}

impl Default for SelectionFilter {
    fn default() -> Self {
        Self::any()
    }
}

impl SelectionFilter {
    /// The fully unconstrained selection.
    pub fn any() -> Self {
        Self::new(WILDCARD, WILDCARD, WILDCARD, WILDCARD)
    }

    pub fn new(
        language: impl Into<String>,
        version: impl Into<String>,
        scope: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            version: version.into(),
            scope: scope.into(),
            name: name.into(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Language => &self.language,
            Field::Version => &self.version,
            Field::Scope => &self.scope,
            Field::Name => &self.name,
        }
    }

    /// Returns a copy with one field replaced.
    pub fn with(&self, field: Field, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let value = value.into();
        match field {
            Field::Language => next.language = value,
            Field::Version => next.version = value,
            Field::Scope => next.scope = value,
            Field::Name => next.name = value,
        }
        next
    }

    /// Applies `over` field by field; absent override fields keep `self`'s value.
    pub fn merge(&self, over: &FilterOverride) -> Self {
        let pick = |o: &Option<String>, base: &str| o.clone().unwrap_or_else(|| base.to_string());
        Self {
            language: pick(&over.language, &self.language),
            version: pick(&over.version, &self.version),
            scope: pick(&over.scope, &self.scope),
            name: pick(&over.name, &self.name),
        }
    }

    /// Positional `lang.scope.name` string consumed by the generator.
    ///
    /// Wildcarded fields are skipped entirely; version is passed separately.
    pub fn to_argument_string(&self) -> String {
        [&self.language, &self.scope, &self.name]
            .into_iter()
            .filter(|f| !is_wildcard(f))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// `scope.name` selector for the parser, present only for a named selection.
    pub fn parser_selector(&self) -> Option<String> {
        if is_wildcard(&self.name) {
            None
        } else {
            Some(format!("{}.{}", self.scope, self.name))
        }
    }

    /// Pins wildcarded language and version to the given defaults.
    pub fn resolve_variant(&self, default_language: &str, default_version: &str) -> Self {
        let mut resolved = self.clone();
        if is_wildcard(&resolved.language) {
            resolved.language = default_language.to_string();
        }
        if is_wildcard(&resolved.version) {
            resolved.version = default_version.to_string();
        }
        resolved
    }

    pub fn is_any(&self) -> bool {
        Field::ALL.iter().all(|f| is_wildcard(self.get(*f)))
    }

    /// Human-readable multi-line summary used for status tooltips.
    pub fn summary(&self) -> String {
        Field::ALL
            .iter()
            .map(|f| format!("{}: {}", f.label(), self.get(*f)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for SelectionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.language, self.version, self.scope, self.name
        )
    }
}

/// Partial selection supplied by a command; `None` means "keep the base value".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOverride {
    pub language: Option<String>,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub name: Option<String>,
}

impl FilterOverride {
    pub fn is_empty(&self) -> bool {
        self.language.is_none() && self.version.is_none() && self.scope.is_none() && self.name.is_none()
    }
}

impl From<SelectionFilter> for FilterOverride {
    fn from(f: SelectionFilter) -> Self {
        Self {
            language: Some(f.language),
            version: Some(f.version),
            scope: Some(f.scope),
            name: Some(f.name),
        }
    }
}
