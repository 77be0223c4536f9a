//! Commands and their display names.

use std::fmt;
use std::str::FromStr;

/// Every user-facing command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Generate,
    Clean,
    Update,
    UpdatePages,
    MarkdownGen,
    AddVariant,
    SetVersion,
    GenerateFile,
    Upload,
    UploadFile,
    Filter,
    Preview,
}

impl Command {
    pub const ALL: [Command; 12] = [
        Command::Generate,
        Command::Clean,
        Command::Update,
        Command::UpdatePages,
        Command::MarkdownGen,
        Command::AddVariant,
        Command::SetVersion,
        Command::GenerateFile,
        Command::Upload,
        Command::UploadFile,
        Command::Filter,
        Command::Preview,
    ];

    /// Stable identifier used on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Command::Generate => "generate",
            Command::Clean => "clean",
            Command::Update => "update",
            Command::UpdatePages => "update-pages",
            Command::MarkdownGen => "markdown-gen",
            Command::AddVariant => "add-variant",
            Command::SetVersion => "set-version",
            Command::GenerateFile => "generate-file",
            Command::Upload => "upload",
            Command::UploadFile => "upload-file",
            Command::Filter => "filter",
            Command::Preview => "preview",
        }
    }

    /// Label shown while the command runs.
    pub fn display_name(self) -> &'static str {
        match self {
            Command::Generate => "Generate Docs",
            Command::Clean => "Clean Generate",
            Command::Update => "Update Docs",
            Command::UpdatePages => "Update Pages",
            Command::MarkdownGen => "Generate Markdown",
            Command::AddVariant => "Add Variant",
            Command::SetVersion => "Set Version",
            Command::GenerateFile => "Generate File",
            Command::Upload => "Upload Docs",
            Command::UploadFile => "Upload File",
            Command::Filter => "Set Filter",
            Command::Preview => "Preview",
        }
    }

    /// Whether the parser runs before the generator, and a preview follows.
    pub fn regenerates_from_source(self) -> bool {
        matches!(
            self,
            Command::Generate | Command::Update | Command::GenerateFile
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| format!("unknown command: {s}"))
    }
}
