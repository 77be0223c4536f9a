//! Runs the external documentation tools.
//!
//! Every step is `<interpreter> <script> [args]`. Output from both streams
//! is forwarded line by line to an [`OutputSink`] as it arrives, with ANSI
//! escape sequences removed. The command line is echoed before the first
//! line and the exit code after the last.

pub mod args;
pub mod error;
pub mod runner;
pub mod sink;

pub use args::{Arg, Args};
pub use error::ProcessError;
pub use runner::{ProcessRunner, StepRunner};
pub use sink::{MemorySink, OutputSink, strip_ansi};
