//! Terminal front end: prompts, output sink, preview and status printing.

use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::pin::Pin;

use dsdocs_build::{PreviewLauncher, StatusEvent};
use dsdocs_process::OutputSink;
use dsdocs_upload::{UploadEvent, UploadPrompts};
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Interactive prompts on stdin/stderr.
///
/// A pending prompt is abandoned, as if dismissed, once `cancel` fires.
pub struct TerminalPrompts {
    stdin: Mutex<BufReader<Stdin>>,
    cancel: CancellationToken,
}

impl TerminalPrompts {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            stdin: Mutex::new(BufReader::new(tokio::io::stdin())),
            cancel,
        }
    }

    /// Prints `prompt` and reads one line. `None` on end of input or
    /// cancellation.
    async fn read_answer(&self, prompt: &str) -> Option<String> {
        if self.cancel.is_cancelled() {
            return None;
        }
        eprint!("{prompt}");
        let _ = std::io::stderr().flush();

        let mut line = String::new();
        let mut stdin = self.stdin.lock().await;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                eprintln!();
                None
            }
            read = stdin.read_line(&mut line) => match read {
                Ok(0) => None,
                Ok(_) => Some(line.trim().to_string()),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read from stdin");
                    None
                }
            },
        }
    }
}

impl UploadPrompts for TerminalPrompts {
    fn ask_endpoint<'a>(
        &'a self,
        current: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async move {
            let prompt = if current.is_empty() {
                "Server IP (ip:port): ".to_string()
            } else {
                format!("Server IP (ip:port) [{current}]: ")
            };
            let answer = self.read_answer(&prompt).await?;
            if answer.is_empty() && !current.is_empty() {
                return Some(current.to_string());
            }
            Some(answer)
        })
    }

    fn offer_retry<'a>(
        &'a self,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            eprintln!("{message}");
            match self.read_answer("Retry? [y/N]: ").await {
                Some(answer) => is_yes(&answer),
                None => false,
            }
        })
    }

    fn info(&self, message: &str) {
        eprintln!("{message}");
    }

    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes" | "retry")
}

/// Forwards script output to stdout.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    /// Terminal scrollback is kept.
    fn clear(&self) {}

    fn append_line(&self, line: &str) {
        println!("{line}");
    }
}

/// Opens pages with the platform's default handler.
pub struct OpenPreview;

impl PreviewLauncher for OpenPreview {
    fn open(&self, page: &Path) -> std::io::Result<()> {
        open::that(page)
    }
}

/// Prints build status changes until the session is dropped.
pub fn spawn_status_printer(mut rx: mpsc::Receiver<StatusEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Some(line) = status_line(&event) {
                eprintln!("{line}");
            }
        }
    })
}

fn status_line(event: &StatusEvent) -> Option<String> {
    match event {
        StatusEvent::FilterChanged { .. } => None,
        StatusEvent::Busy { command } => Some(format!("{}...", command.display_name())),
        StatusEvent::Done { command, summary } => Some(format!(
            "{} finished\n{}",
            command.display_name(),
            summary
        )),
        StatusEvent::Failed {
            command,
            code,
            message,
            ..
        } => Some(match code {
            Some(code) => format!("{} failed (exit code {code}): {message}", command.display_name()),
            None => format!("{} failed: {message}", command.display_name()),
        }),
    }
}

/// Prints upload progress until the pipeline's sender is dropped.
pub fn spawn_progress_printer(mut rx: mpsc::Receiver<UploadEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut percent = 0.0_f64;
        while let Some(event) = rx.recv().await {
            match event {
                UploadEvent::Started { total } => eprintln!("Uploading {total} files"),
                UploadEvent::Progress { increment, label } => {
                    percent = (percent + increment).min(100.0);
                    eprintln!("[{percent:5.1}%] {label}");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsdocs_build::Command;

    #[tokio::test]
    async fn cancelled_prompts_are_dismissed() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let prompts = TerminalPrompts::new(cancel);

        assert_eq!(prompts.ask_endpoint("10.0.0.2:8088").await, None);
        assert!(!prompts.offer_retry("Upload Failed: x").await);
    }

    #[test]
    fn retry_answers() {
        assert!(is_yes("y"));
        assert!(is_yes("YES"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
    }

    #[test]
    fn status_lines() {
        let busy = StatusEvent::Busy {
            command: Command::Generate,
        };
        assert_eq!(status_line(&busy).as_deref(), Some("Generate Docs..."));

        let failed = StatusEvent::Failed {
            command: Command::Clean,
            summary: String::new(),
            code: Some(2),
            message: "generator failed".into(),
        };
        assert_eq!(
            status_line(&failed).as_deref(),
            Some("Clean Generate failed (exit code 2): generator failed")
        );

        let changed = StatusEvent::FilterChanged {
            summary: String::new(),
        };
        assert!(status_line(&changed).is_none());
    }
}
