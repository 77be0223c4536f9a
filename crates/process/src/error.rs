//! Process error types.

/// Why a build step did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", describe_exit(*code, *signal))]
    Exit {
        code: Option<i32>,
        signal: Option<i32>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    /// Exit code of a step that ran and failed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::Exit { code, .. } => *code,
            _ => None,
        }
    }
}

fn describe_exit(code: Option<i32>, signal: Option<i32>) -> String {
    match (code, signal) {
        (Some(code), _) => format!("exited with code {code}"),
        (None, Some(signal)) => format!("terminated by signal {signal}"),
        (None, None) => "terminated abnormally".to_string(),
    }
}
