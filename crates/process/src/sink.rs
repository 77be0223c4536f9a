//! Output sinks for step output.

use std::sync::{LazyLock, Mutex};

use regex::Regex;

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\x1b\[[0-9;]*[a-z]").expect("ansi regex is valid"));

/// Removes terminal color and cursor sequences.
pub fn strip_ansi(line: &str) -> String {
    ANSI_ESCAPE.replace_all(line, "").into_owned()
}

/// Destination for the output of build steps.
///
/// Implementations must tolerate interleaved calls from the stdout and
/// stderr readers of one process.
pub trait OutputSink: Send + Sync {
    /// Discards previous output. Called when a command starts.
    fn clear(&self);

    /// Appends one line, without its terminator.
    fn append_line(&self, line: &str);
}

/// Sink that keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .map(|l| l.iter().any(|line| line.contains(needle)))
            .unwrap_or(false)
    }
}

impl OutputSink for MemorySink {
    fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }

    fn append_line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}
