//! Selection → on-disk path resolution.

use std::path::{Path, PathBuf};

use dsdocs_config::{DEFAULT_LANGUAGE, DocsConfig};
use dsdocs_selection::{SelectionFilter, is_wildcard};
use glob::{MatchOptions, Pattern};
use tracing::debug;

use crate::ArtifactError;

/// Index page at the root of every variant tree.
pub const ROOT_INDEX: &str = "Docs.htm";

/// Output directory name for a language.
pub fn lang_dir(lang: &str) -> String {
    if is_wildcard(lang) || lang == DEFAULT_LANGUAGE {
        "docs".to_string()
    } else {
        format!("docs-{lang}")
    }
}

/// Glob fragment for a user-entered name pattern.
///
/// `.*` becomes `*`, whitespace is dropped, and the result is wrapped so
/// the name may appear anywhere in the file name. Runs of `*` collapse to
/// one since `**` is only valid as a whole path component.
pub fn name_glob(name: &str) -> String {
    let wrapped = format!("*{}*", name.replace(".*", "*"));
    let mut out = String::with_capacity(wrapped.len());
    for c in wrapped.chars().filter(|c| !c.is_whitespace()) {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Maps selections to paths under an `out/` directory.
pub struct ArtifactResolver<'a> {
    out_dir: PathBuf,
    config: &'a DocsConfig,
}

impl<'a> ArtifactResolver<'a> {
    pub fn new(out_dir: impl Into<PathBuf>, config: &'a DocsConfig) -> Self {
        Self {
            out_dir: out_dir.into(),
            config,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Pins wildcarded language and version to the configured defaults.
    pub fn resolve_selection(&self, filter: &SelectionFilter) -> Result<SelectionFilter, ArtifactError> {
        let version = self.config.latest_version().ok_or(ArtifactError::NoVersion)?;
        Ok(filter.resolve_variant(self.config.first_language(), version))
    }

    /// Variant tree for a language and version; wildcards take the defaults.
    pub fn base_path(&self, lang: &str, ver: &str) -> Result<PathBuf, ArtifactError> {
        let lang = if is_wildcard(lang) {
            self.config.first_language()
        } else {
            lang
        };
        let ver = if is_wildcard(ver) {
            self.config.latest_version().ok_or(ArtifactError::NoVersion)?
        } else {
            ver
        };
        Ok(self.out_dir.join(lang_dir(lang)).join(ver))
    }

    /// The single page a selection denotes, or an index page.
    ///
    /// A name that matches zero or several pages falls back to the root
    /// index instead of failing.
    pub fn resolve_artifact(&self, filter: &SelectionFilter) -> Result<PathBuf, ArtifactError> {
        let base = self.base_path(&filter.language, &filter.version)?;
        let root_index = base.join(ROOT_INDEX);

        if is_wildcard(&filter.name) {
            if is_wildcard(&filter.scope) {
                return Ok(root_index);
            }
            return Ok(match self.config.scope_name(&filter.scope) {
                Some(title) => base.join(scope_index_name(title)),
                None => {
                    debug!(scope = %filter.scope, "unknown scope, using root index");
                    root_index
                }
            });
        }

        let matches = self.glob_pages(&base, &filter.scope, &filter.name);
        match matches.as_slice() {
            [single] => Ok(single.clone()),
            other => {
                debug!(
                    filter = %filter,
                    matches = other.len(),
                    "selection is not a single page, using root index"
                );
                Ok(root_index)
            }
        }
    }

    fn glob_pages(&self, base: &Path, scope: &str, name: &str) -> Vec<PathBuf> {
        let scope_part = if is_wildcard(scope) {
            scope.to_string()
        } else {
            Pattern::escape(scope)
        };
        let pattern = format!(
            "{}/{}/{}",
            Pattern::escape(&base.to_string_lossy()),
            scope_part,
            name_glob(name)
        );
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };
        match glob::glob_with(&pattern, options) {
            Ok(paths) => paths
                .filter_map(Result::ok)
                .filter(|p| p.is_file())
                .collect(),
            Err(e) => {
                debug!(pattern = %pattern, error = %e, "name is not a usable glob");
                Vec::new()
            }
        }
    }
}

fn scope_index_name(title: &str) -> String {
    let compact: String = title.chars().filter(|c| !c.is_whitespace()).collect();
    format!("{compact}.htm")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config() -> DocsConfig {
        DocsConfig::from_json(
            r#"{
                "langs": {"en": "English", "de": "Deutsch"},
                "vers": ["v257", "v256"],
                "scopes": {"app": "Reference", "ui": "Ui Components"}
            }"#,
        )
        .unwrap()
    }

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("docs").join("v257").join("app");
        fs::create_dir_all(&app).unwrap();
        for page in ["CreateButton.htm", "CreateImage.htm", "Alert.htm"] {
            fs::write(app.join(page), b"<html>").unwrap();
        }
        fs::write(dir.path().join("docs").join("v257").join(ROOT_INDEX), b"").unwrap();
        dir
    }

    #[test]
    fn base_path_uses_language_directory_and_newest_version() {
        let conf = config();
        let r = ArtifactResolver::new("/ws/out", &conf);
        assert_eq!(
            r.base_path("*", "*").unwrap(),
            PathBuf::from("/ws/out/docs/v257")
        );
        assert_eq!(
            r.base_path("de", "v256").unwrap(),
            PathBuf::from("/ws/out/docs-de/v256")
        );
    }

    #[test]
    fn base_path_without_versions_is_an_error() {
        let conf = DocsConfig::default();
        let r = ArtifactResolver::new("/ws/out", &conf);
        assert!(matches!(r.base_path("en", "*"), Err(ArtifactError::NoVersion)));
    }

    #[test]
    fn wildcard_name_resolves_to_index_pages() {
        let conf = config();
        let r = ArtifactResolver::new("/ws/out", &conf);
        let root = r.resolve_artifact(&SelectionFilter::any()).unwrap();
        assert_eq!(root, PathBuf::from("/ws/out/docs/v257/Docs.htm"));

        let scope = r
            .resolve_artifact(&SelectionFilter::new("en", "*", "ui", "*"))
            .unwrap();
        assert_eq!(scope, PathBuf::from("/ws/out/docs/v257/UiComponents.htm"));
    }

    #[test]
    fn single_match_returns_that_page() {
        let dir = tree();
        let conf = config();
        let r = ArtifactResolver::new(dir.path(), &conf);
        let page = r
            .resolve_artifact(&SelectionFilter::new("en", "v257", "app", "Alert"))
            .unwrap();
        assert_eq!(page, dir.path().join("docs/v257/app/Alert.htm"));
    }

    #[test]
    fn regex_style_name_is_translated() {
        let dir = tree();
        let conf = config();
        let r = ArtifactResolver::new(dir.path(), &conf);
        let page = r
            .resolve_artifact(&SelectionFilter::new("en", "*", "app", "Create.*Image"))
            .unwrap();
        assert_eq!(page, dir.path().join("docs/v257/app/CreateImage.htm"));
    }

    #[test]
    fn multiple_matches_fall_back_to_root_index() {
        let dir = tree();
        let conf = config();
        let r = ArtifactResolver::new(dir.path(), &conf);
        let page = r
            .resolve_artifact(&SelectionFilter::new("en", "*", "app", "Create"))
            .unwrap();
        assert_eq!(page, dir.path().join("docs/v257/Docs.htm"));
    }

    #[test]
    fn zero_matches_equal_wildcard_resolution() {
        let dir = tree();
        let conf = config();
        let r = ArtifactResolver::new(dir.path(), &conf);
        let missing = r
            .resolve_artifact(&SelectionFilter::new("en", "*", "*", "Nope"))
            .unwrap();
        let wildcard = r
            .resolve_artifact(&SelectionFilter::new("en", "*", "*", "*"))
            .unwrap();
        assert_eq!(missing, wildcard);

        let scoped_missing = r
            .resolve_artifact(&SelectionFilter::new("en", "*", "app", "Nope"))
            .unwrap();
        assert_eq!(scoped_missing, dir.path().join("docs/v257/Docs.htm"));
    }

    #[test]
    fn wildcard_scope_searches_every_scope() {
        let dir = tree();
        let conf = config();
        let r = ArtifactResolver::new(dir.path(), &conf);
        let page = r
            .resolve_artifact(&SelectionFilter::new("*", "*", "*", "Alert"))
            .unwrap();
        assert_eq!(page, dir.path().join("docs/v257/app/Alert.htm"));
    }

    #[test]
    fn name_glob_translation() {
        assert_eq!(name_glob("Create.*"), "*Create*");
        assert_eq!(name_glob("*"), "*");
        assert_eq!(name_glob("Create Button"), "*CreateButton*");
    }

    #[test]
    fn lang_dir_names() {
        assert_eq!(lang_dir("en"), "docs");
        assert_eq!(lang_dir("*"), "docs");
        assert_eq!(lang_dir("es"), "docs-es");
    }

    #[test]
    fn resolve_selection_pins_defaults() {
        let conf = config();
        let r = ArtifactResolver::new("/ws/out", &conf);
        let f = r.resolve_selection(&SelectionFilter::new("*", "*", "app", "*")).unwrap();
        assert_eq!(f, SelectionFilter::new("en", "v257", "app", "*"));
    }
}
