//! Derives a selection from a markup source or generated page path.

use std::path::{Component, Path};

use crate::filter::{SelectionFilter, WILDCARD};

/// Maps a file inside the docs workspace to the selection it belongs to.
///
/// - `files/markup/<lang>/<scope>/<Name>.md` → `{lang, *, scope, Name}`
/// - `out/docs[-<lang>]/<ver>/<scope>/<Name>.htm` → `{lang, ver, scope, Name}`
///
/// Returns `None` for paths outside both trees.
pub fn filter_from_path(path: &Path) -> Option<SelectionFilter> {
    let parts: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    if let Some(i) = find_pair(&parts, "files", "markup") {
        let rest = &parts[i + 2..];
        if let [lang, scope, file] = rest {
            return Some(SelectionFilter::new(*lang, WILDCARD, *scope, stem(file)));
        }
        return None;
    }

    let i = parts.iter().rposition(|p| *p == "out")?;
    let rest = &parts[i + 1..];
    let (docs, rest) = rest.split_first()?;
    let language = match docs.strip_prefix("docs") {
        Some("") => "en",
        Some(suffix) => suffix.strip_prefix('-')?,
        None => return None,
    };
    match rest {
        [ver, scope, file] => Some(SelectionFilter::new(language, *ver, *scope, stem(file))),
        [ver, _index] => Some(SelectionFilter::new(language, *ver, WILDCARD, WILDCARD)),
        _ => None,
    }
}

fn find_pair(parts: &[&str], first: &str, second: &str) -> Option<usize> {
    parts
        .windows(2)
        .rposition(|w| w[0] == first && w[1] == second)
}

fn stem(file: &str) -> &str {
    Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file)
}
