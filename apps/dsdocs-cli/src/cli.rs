//! Command line definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dsdocs_selection::{Field, FilterOverride, ValidationError, VariantKind, validate_name_pattern};

#[derive(Parser, Debug)]
#[command(
    name = "dsdocs",
    version,
    about = "Build, preview and upload DroidScript documentation variants",
    long_about = None
)]
pub struct Cli {
    /// Docs workspace root (the directory holding `files/` and `out/`)
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Interpreter used to run the docs scripts
    #[arg(long, global = true, default_value = "node")]
    pub interpreter: String,

    /// Maximum number of concurrent uploads
    #[arg(long, global = true, default_value_t = 4)]
    pub concurrency: usize,

    /// Per-file upload timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Selection overrides applied to a single command.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Language code, or `*`
    #[arg(long)]
    pub lang: Option<String>,

    /// Version, or `*`
    #[arg(long)]
    pub ver: Option<String>,

    /// Scope namespace, or `*`
    #[arg(long)]
    pub scope: Option<String>,

    /// Name pattern (regular expression), or `*`
    #[arg(long)]
    pub name: Option<String>,
}

impl FilterArgs {
    pub fn to_override(&self) -> Result<FilterOverride, ValidationError> {
        let name = self
            .name
            .as_deref()
            .map(validate_name_pattern)
            .transpose()?;
        Ok(FilterOverride {
            language: self.lang.clone(),
            version: self.ver.clone(),
            scope: self.scope.clone(),
            name,
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse sources and regenerate the selection, clearing its old output
    Generate(FilterArgs),

    /// Remove all generated output and regenerate the selection
    Clean(FilterArgs),

    /// Parse sources and regenerate outdated pages of the selection
    Update(FilterArgs),

    /// Run the update-pages script
    UpdatePages,

    /// Run the markdown generator script
    MarkdownGen,

    /// Register a language, version or scope, e.g. `language "en (English)"`
    AddVariant {
        kind: VariantKind,
        value: String,
    },

    /// Set the current docs version
    SetVersion { version: String },

    /// Regenerate the page for a markup source or generated page
    GenerateFile { path: PathBuf },

    /// Upload the selection to the DroidScript device
    Upload(FilterArgs),

    /// Upload the page for a markup source or generated page
    UploadFile { path: PathBuf },

    /// Show, change or clear the persisted selection
    Filter {
        #[command(subcommand)]
        action: Option<FilterAction>,
    },

    /// Open the page the selection resolves to
    Preview(FilterArgs),

    /// List markup source files of a language
    Markup {
        #[arg(long)]
        lang: Option<String>,
    },

    /// List known type names and descriptions
    Types,

    /// Change the DroidScript server address
    ServerIp,
}

#[derive(Subcommand, Debug)]
pub enum FilterAction {
    /// Print the current selection
    Show,

    /// Set one field: language, version, scope or name
    Set { field: Field, value: String },

    /// Reset every field to `*`
    Clear,
}
