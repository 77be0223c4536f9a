//! Child process execution.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::args::Args;
use crate::error::ProcessError;
use crate::sink::{OutputSink, strip_ansi};

/// Something that can run a tool script to completion.
///
/// `ProcessRunner` is the real implementation; orchestration code takes
/// the trait so it can be exercised with mocks.
pub trait StepRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        script: &'a Path,
        args: &'a Args,
        sink: &'a dyn OutputSink,
    ) -> Pin<Box<dyn Future<Output = Result<(), ProcessError>> + Send + 'a>>;
}

/// Launches `<interpreter> <script> [args]` as a child process.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    interpreter: String,
    working_dir: Option<PathBuf>,
}

impl ProcessRunner {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            working_dir: None,
        }
    }

    /// Runs children from `dir` instead of the current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// Display form of the command line, as echoed to the sink.
    pub fn command_line(&self, script: &Path, args: &Args) -> String {
        let mut line = format!("{} {}", self.interpreter, script.display());
        if !args.is_empty() {
            line.push(' ');
            line.push_str(&args.to_string());
        }
        line
    }

    /// Runs one step and waits for it.
    ///
    /// Both output streams are drained concurrently with the wait so a
    /// chatty child never blocks on a full pipe.
    pub async fn execute(
        &self,
        script: &Path,
        args: &Args,
        sink: &dyn OutputSink,
    ) -> Result<(), ProcessError> {
        let command_line = self.command_line(script, args);
        sink.append_line(&format!("$ {command_line}"));
        info!(command = %command_line, "starting step");

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(script)
            .args(args.to_argv())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| {
            sink.append_line(&format!("$ Error: {source}"));
            ProcessError::Spawn {
                program: self.interpreter.clone(),
                source,
            }
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (status, (), ()) = tokio::join!(
            child.wait(),
            forward_lines(stdout, sink),
            forward_lines(stderr, sink),
        );
        let status = status?;

        let (code, signal) = exit_parts(status);
        match code {
            Some(code) => sink.append_line(&format!("$ Exit Code: {code}")),
            None => sink.append_line(&format!(
                "$ Exit Code: signal {}",
                signal.map_or_else(|| "?".to_string(), |s| s.to_string())
            )),
        }

        if status.success() {
            debug!(command = %command_line, "step succeeded");
            Ok(())
        } else {
            warn!(command = %command_line, code = ?code, signal = ?signal, "step failed");
            Err(ProcessError::Exit { code, signal })
        }
    }
}

impl StepRunner for ProcessRunner {
    fn run<'a>(
        &'a self,
        script: &'a Path,
        args: &'a Args,
        sink: &'a dyn OutputSink,
    ) -> Pin<Box<dyn Future<Output = Result<(), ProcessError>> + Send + 'a>> {
        Box::pin(self.execute(script, args, sink))
    }
}

/// Forwards every line of `reader` to the sink until EOF.
///
/// Output that is not valid UTF-8 is converted lossily.
async fn forward_lines<R>(reader: Option<R>, sink: &dyn OutputSink)
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return;
    };
    let mut segments = BufReader::new(reader).split(b'\n');
    loop {
        match segments.next_segment().await {
            Ok(Some(bytes)) => {
                let text = String::from_utf8_lossy(&bytes);
                sink.append_line(&strip_ansi(text.trim_end_matches('\r')));
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read step output");
                break;
            }
        }
    }
}

#[cfg(unix)]
fn exit_parts(status: ExitStatus) -> (Option<i32>, Option<i32>) {
    use std::os::unix::process::ExitStatusExt;
    (status.code(), status.signal())
}

#[cfg(not(unix))]
fn exit_parts(status: ExitStatus) -> (Option<i32>, Option<i32>) {
    (status.code(), None)
}
