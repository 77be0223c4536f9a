//! File enumeration for upload and markup listing.

use std::path::Path;

use dsdocs_selection::is_wildcard;
use glob::{MatchOptions, Pattern};

use crate::ArtifactError;

/// Glob (relative to a variant directory) selecting the files to upload.
///
/// A fully wildcarded selection takes every file at any depth. A trailing
/// `**` only yields directories, hence `**/*`. A concrete scope is matched
/// literally.
pub fn upload_glob(scope: &str, name: &str) -> String {
    if is_wildcard(scope) && is_wildcard(name) {
        return "**/*".to_string();
    }
    let scope_part = if is_wildcard(scope) {
        scope.to_string()
    } else {
        Pattern::escape(scope)
    };
    let name_part = if is_wildcard(name) {
        "*".to_string()
    } else {
        upload_name_glob(name)
    };
    format!("{scope_part}/{name_part}")
}

/// File-name glob for an upload name, anchored at the start of the stem.
///
/// `Alert` selects `Alert.htm` but neither `AlertDialog.htm` nor
/// `ShowAlert.htm`; `Create.*` becomes the prefix glob `Create*`.
fn upload_name_glob(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    for c in name.replace(".*", "*").chars().filter(|c| !c.is_whitespace()) {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    if !out.ends_with('*') {
        out.push_str(".*");
    }
    out
}

/// Relative, `/`-separated paths of the files under `variant_dir` that the
/// scope and name select, in enumeration order.
pub fn enumerate_files(
    variant_dir: &Path,
    scope: &str,
    name: &str,
) -> Result<Vec<String>, ArtifactError> {
    let pattern = format!(
        "{}/{}",
        Pattern::escape(&variant_dir.to_string_lossy()),
        upload_glob(scope, name)
    );
    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::new()
    };

    let mut files = Vec::new();
    for entry in glob::glob_with(&pattern, options)? {
        let path = entry?;
        if !path.is_file() {
            continue;
        }
        let rel = path.strip_prefix(variant_dir).map_err(std::io::Error::other)?;
        files.push(rel.to_string_lossy().replace('\\', "/"));
    }

    tracing::debug!(pattern = %pattern, count = files.len(), "enumerated upload files");
    Ok(files)
}

/// `<scope>/<file>` for every file one level inside each scope directory of
/// a markup language tree, sorted.
pub fn list_markup_files(markup_dir: &Path) -> Result<Vec<String>, ArtifactError> {
    let mut files = Vec::new();
    for scope in std::fs::read_dir(markup_dir)? {
        let scope = scope?;
        if !scope.metadata()?.is_dir() {
            continue;
        }
        let scope_name = scope.file_name().to_string_lossy().into_owned();
        for entry in std::fs::read_dir(scope.path())? {
            let entry = entry?;
            if entry.metadata()?.is_file() {
                files.push(format!(
                    "{scope_name}/{}",
                    entry.file_name().to_string_lossy()
                ));
            }
        }
    }
    files.sort();
    Ok(files)
}
