//! Docs workspace layout.

use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Well-known paths inside a docs workspace.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub generator: PathBuf,
    pub parser: PathBuf,
    pub update_pages: PathBuf,
    pub markdown_gen: PathBuf,
    pub conf: PathBuf,
}

impl ProjectPaths {
    /// Builds the layout for `root` without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let files = root.join("files");
        Self {
            generator: files.join("generate.js"),
            parser: files.join("jsdoc-parser.js"),
            update_pages: files.join("updatePages.js"),
            markdown_gen: files.join("markdown-generator.js"),
            conf: files.join("conf.json"),
            root,
        }
    }

    /// Builds the layout and checks the files every command depends on.
    ///
    /// The update-pages and markdown scripts are optional; their commands
    /// report the missing file when invoked.
    pub fn discover(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let paths = Self::new(root);
        for required in [&paths.generator, &paths.parser, &paths.conf] {
            if !required.exists() {
                return Err(ConfigError::MissingFile(required.display().to_string()));
            }
        }
        tracing::debug!(root = %paths.root.display(), "docs workspace discovered");
        Ok(paths)
    }

    /// Root of all generated output.
    pub fn out_dir(&self) -> PathBuf {
        self.root.join("out")
    }

    /// Markup sources for one language: `files/markup/<lang>`.
    pub fn markup_dir(&self, lang: &str) -> PathBuf {
        self.root.join("files").join("markup").join(lang)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn workspace(with: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("files")).unwrap();
        for name in with {
            fs::write(dir.path().join("files").join(name), b"").unwrap();
        }
        dir
    }

    #[test]
    fn discover_complete_workspace() {
        let dir = workspace(&["generate.js", "jsdoc-parser.js", "conf.json"]);
        let paths = ProjectPaths::discover(dir.path()).unwrap();
        assert_eq!(paths.out_dir(), dir.path().join("out"));
        assert_eq!(
            paths.markup_dir("en"),
            dir.path().join("files").join("markup").join("en")
        );
    }

    #[test]
    fn discover_rejects_missing_parser() {
        let dir = workspace(&["generate.js", "conf.json"]);
        let err = ProjectPaths::discover(dir.path()).unwrap_err();
        match err {
            ConfigError::MissingFile(f) => assert!(f.ends_with("jsdoc-parser.js")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn optional_scripts_are_not_required() {
        let dir = workspace(&["generate.js", "jsdoc-parser.js", "conf.json"]);
        let paths = ProjectPaths::discover(dir.path()).unwrap();
        assert!(!paths.update_pages.exists());
        assert!(!paths.markdown_gen.exists());
    }
}
