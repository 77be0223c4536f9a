//! Build orchestration for the documentation tools.
//!
//! A command merges its partial selection onto the [`Session`] filter,
//! then runs up to two external steps through a
//! [`StepRunner`](dsdocs_process::StepRunner):
//!
//! 1. **Parse**: `jsdoc-parser.js [-p=<scope>.<name>]`, only for commands
//!    that regenerate from source
//! 2. **Generate**: `generate.js [flags] "<lang>.<scope>.<name>"`
//!
//! A successful regenerate opens a preview of the resolved page. Status
//! changes are published as [`StatusEvent`]s on the session channel.

pub mod command;
pub mod error;
pub mod options;
pub mod orchestrator;
pub mod session;

pub use command::Command;
pub use error::{BuildError, Step};
pub use options::{BuildOptions, VariantEdit, generator_args, parser_args};
pub use orchestrator::{BuildOrchestrator, BuildReport, BuildRequest, PreviewLauncher};
pub use session::{BusyGuard, Session, StatusEvent};
