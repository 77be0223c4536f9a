//! Build error types.

use std::fmt;

use dsdocs_process::ProcessError;

/// External step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Parser,
    Generator,
    Script,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Parser => "parser",
            Step::Generator => "generator",
            Step::Script => "script",
        })
    }
}

/// Errors produced while running a build command.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("a command is already running")]
    AlreadyRunning,

    #[error("{step} failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: ProcessError,
    },

    #[error("script not found: {0}")]
    MissingScript(String),

    #[error("config error: {0}")]
    Config(#[from] dsdocs_config::ConfigError),

    #[error("artifact error: {0}")]
    Artifact(#[from] dsdocs_artifacts::ArtifactError),

    #[error("preview failed: {0}")]
    Preview(#[source] std::io::Error),
}

impl BuildError {
    pub fn step(step: Step) -> impl FnOnce(ProcessError) -> Self {
        move |source| BuildError::Step { step, source }
    }

    /// Exit code of the failing step, if it ran.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BuildError::Step { source, .. } => source.exit_code(),
            _ => None,
        }
    }
}
