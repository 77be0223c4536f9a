//! Generator options and argument composition.

use dsdocs_process::Args;
use dsdocs_selection::{SelectionFilter, is_wildcard};

/// A change to the variant lists in the project config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantEdit {
    /// Register a new value, e.g. `-al="en=English"`.
    Add { field: char, value: String },
    /// Set a value, e.g. `-sv="v257"` for the current version.
    Set { field: char, value: String },
}

/// Flags for one generator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Remove all generated output first (`-C`).
    pub clean: bool,
    /// Clear the selected output (`-c`).
    pub clear: bool,
    /// Only regenerate outdated pages (`-u`).
    pub update: bool,
    /// Produce pages; `false` passes `-n`.
    pub generate: bool,
    pub edit: Option<VariantEdit>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            clean: false,
            clear: false,
            update: false,
            generate: true,
            edit: None,
        }
    }
}

impl BuildOptions {
    pub fn clean() -> Self {
        Self {
            clean: true,
            ..Self::default()
        }
    }

    pub fn clear() -> Self {
        Self {
            clear: true,
            ..Self::default()
        }
    }

    pub fn update() -> Self {
        Self {
            update: true,
            ..Self::default()
        }
    }

    /// Config edit without page generation.
    pub fn edit(edit: VariantEdit) -> Self {
        Self {
            generate: false,
            edit: Some(edit),
            ..Self::default()
        }
    }
}

/// Generator arguments in the fixed order
/// `-C -c -n -u -a<f>="<v>" -s<f>="<v>" -v=<version> "<filter>"`.
pub fn generator_args(filter: &SelectionFilter, options: &BuildOptions) -> Args {
    let mut args = Args::new();
    if options.clean {
        args.plain("-C");
    }
    if options.clear {
        args.plain("-c");
    }
    if !options.generate {
        args.plain("-n");
    }
    if options.update {
        args.plain("-u");
    }
    match &options.edit {
        Some(VariantEdit::Add { field, value }) => {
            args.assign(format!("-a{field}"), value.as_str());
        }
        Some(VariantEdit::Set { field, value }) => {
            args.assign(format!("-s{field}"), value.as_str());
        }
        None => {}
    }
    if !is_wildcard(&filter.version) {
        args.plain(format!("-v={}", filter.version));
    }
    args.quoted(filter.to_argument_string());
    args
}

/// Parser arguments: a `-p=<scope>.<name>` selector for named selections.
pub fn parser_args(filter: &SelectionFilter) -> Args {
    let mut args = Args::new();
    if let Some(selector) = filter.parser_selector() {
        args.plain(format!("-p={selector}"));
    }
    args
}
