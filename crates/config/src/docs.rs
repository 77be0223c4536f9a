//! `files/conf.json` model.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ConfigError;

/// Language whose output lives in the bare `docs` directory.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A code with its human-readable title, e.g. `app` / `Reference`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub code: String,
    pub name: String,
}

/// On-disk shape. Both the short keys written by the generator and the
/// long spelled-out keys are accepted.
#[derive(Debug, Default, Deserialize)]
struct DocsConfigFile {
    #[serde(default, alias = "languages")]
    langs: Map<String, Value>,
    #[serde(default, alias = "versions")]
    vers: Vec<String>,
    #[serde(default)]
    scopes: Map<String, Value>,
    #[serde(default, alias = "typeNames")]
    tname: BTreeMap<String, String>,
    #[serde(default, alias = "typeDescriptions")]
    tdesc: BTreeMap<String, String>,
}

/// Languages, versions and scopes known to the docs workspace.
///
/// Order matters: the first language and the first (newest) version are
/// the defaults whenever a selection leaves them unconstrained.
#[derive(Debug, Clone, Default)]
pub struct DocsConfig {
    pub languages: Vec<Label>,
    pub versions: Vec<String>,
    pub scopes: Vec<Label>,
    pub type_names: BTreeMap<String, String>,
    pub type_descriptions: BTreeMap<String, String>,
}

impl DocsConfig {
    /// Reads and parses a `conf.json` file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            languages = config.languages.len(),
            versions = config.versions.len(),
            scopes = config.scopes.len(),
            "docs config loaded"
        );
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let file: DocsConfigFile = serde_json::from_str(content)?;
        Ok(Self {
            languages: labels(file.langs),
            versions: file.vers,
            scopes: labels(file.scopes),
            type_names: file.tname,
            type_descriptions: file.tdesc,
        })
    }

    /// First configured language, or [`DEFAULT_LANGUAGE`] when none are listed.
    pub fn first_language(&self) -> &str {
        self.languages
            .first()
            .map(|l| l.code.as_str())
            .unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Newest configured version.
    pub fn latest_version(&self) -> Option<&str> {
        self.versions.first().map(String::as_str)
    }

    pub fn scope_name(&self, code: &str) -> Option<&str> {
        find(&self.scopes, code)
    }

    /// Type names merged with their descriptions; descriptions win on
    /// duplicate keys.
    pub fn type_labels(&self) -> BTreeMap<&str, &str> {
        self.type_names
            .iter()
            .chain(self.type_descriptions.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

fn find<'a>(labels: &'a [Label], code: &str) -> Option<&'a str> {
    labels
        .iter()
        .find(|l| l.code == code)
        .map(|l| l.name.as_str())
}

fn labels(map: Map<String, Value>) -> Vec<Label> {
    map.into_iter()
        .map(|(code, value)| {
            let name = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            Label { code, name }
        })
        .collect()
}
