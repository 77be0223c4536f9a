//! Command dispatch.
//!
//! Each invocation loads the persisted selection into a fresh build
//! session, re-reads `conf.json`, runs one command and writes the
//! selection back when the command changed it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use dsdocs_artifacts::list_markup_files;
use dsdocs_build::{BuildOrchestrator, BuildRequest, Command, Session};
use dsdocs_config::{DocsConfig, ProjectPaths};
use dsdocs_process::ProcessRunner;
use dsdocs_selection::{
    Field, FilterOverride, SelectionFilter, ValidationError, VariantKind, WILDCARD,
    filter_from_path, is_wildcard, parse_variant_input, validate_name_pattern,
};
use dsdocs_upload::{HttpUploader, UploadError, UploadPipeline, UploadSession};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::{Cli, Commands, FilterAction, FilterArgs};
use crate::config::{ConfigStore, default_config_path};
use crate::terminal::{
    OpenPreview, StdoutSink, TerminalPrompts, spawn_progress_printer, spawn_status_printer,
};

pub struct App {
    root: PathBuf,
    interpreter: String,
    concurrency: usize,
    timeout: Duration,
    store: ConfigStore,
}

impl App {
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let config_path = match &cli.config {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        let store = ConfigStore::open(config_path)?;
        tracing::debug!(settings = %store.path().display(), "settings loaded");
        Ok(Self {
            root: cli.root.clone(),
            interpreter: cli.interpreter.clone(),
            concurrency: cli.concurrency,
            timeout: Duration::from_secs(cli.timeout),
            store,
        })
    }

    pub async fn run(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Generate(args) => self.build(Command::Generate, self.checked(&args)?).await,
            Commands::Clean(args) => self.build(Command::Clean, self.checked(&args)?).await,
            Commands::Update(args) => self.build(Command::Update, self.checked(&args)?).await,
            Commands::UpdatePages => self.script(Command::UpdatePages).await,
            Commands::MarkdownGen => self.script(Command::MarkdownGen).await,
            Commands::AddVariant { kind, value } => self.add_variant(kind, &value).await,
            Commands::SetVersion { version } => self.set_version(&version).await,
            Commands::GenerateFile { path } => match file_filter(&path) {
                Some(filter) => self.build(Command::GenerateFile, filter.into()).await,
                None => Ok(()),
            },
            Commands::Upload(args) => self.upload(self.checked(&args)?).await,
            Commands::UploadFile { path } => match file_filter(&path) {
                Some(filter) => self.upload(filter.into()).await,
                None => Ok(()),
            },
            Commands::Filter { action } => self.filter(action.unwrap_or(FilterAction::Show)),
            Commands::Preview(args) => self.preview(self.checked(&args)?),
            Commands::Markup { lang } => self.markup(lang.as_deref()),
            Commands::Types => self.types(),
            Commands::ServerIp => self.server_ip().await,
        }
    }

    fn discover(&self) -> anyhow::Result<ProjectPaths> {
        ProjectPaths::discover(&self.root)
            .with_context(|| format!("{} is not a docs workspace", self.root.display()))
    }

    /// Per-run overrides, validated against the project's variants.
    fn checked(&self, args: &FilterArgs) -> anyhow::Result<FilterOverride> {
        let over = args.to_override()?;
        if over.language.is_some() || over.version.is_some() || over.scope.is_some() {
            let config = DocsConfig::load(&self.discover()?.conf)?;
            check_override(&config, &over)?;
        }
        Ok(over)
    }

    fn runner(&self, paths: &ProjectPaths) -> ProcessRunner {
        ProcessRunner::new(self.interpreter.as_str()).with_working_dir(paths.root())
    }

    fn session(&self) -> (Session, Option<JoinHandle<()>>) {
        let mut session = Session::new(self.store.filter());
        let printer = session.take_events().map(spawn_status_printer);
        (session, printer)
    }

    async fn build(&self, command: Command, filter: FilterOverride) -> anyhow::Result<()> {
        let paths = self.discover()?;
        let runner = self.runner(&paths);
        let (session, printer) = self.session();

        let orchestrator = BuildOrchestrator::new(&paths, &runner, &StdoutSink, &OpenPreview);
        let request = BuildRequest::for_command(command).with_filter(filter);
        let result = orchestrator.generate(&session, request).await;
        close_session(session, printer).await;

        let report = result?;
        if let Some(page) = report.previewed {
            println!("Preview: {}", page.display());
        }
        Ok(())
    }

    async fn script(&self, command: Command) -> anyhow::Result<()> {
        let paths = self.discover()?;
        let runner = self.runner(&paths);
        let (session, printer) = self.session();

        let orchestrator = BuildOrchestrator::new(&paths, &runner, &StdoutSink, &OpenPreview);
        let result = orchestrator.run_script(&session, command).await;
        close_session(session, printer).await;
        Ok(result?)
    }

    async fn add_variant(&self, kind: VariantKind, raw: &str) -> anyhow::Result<()> {
        let input = parse_variant_input(kind, raw).with_context(|| {
            format!("{kind} should look like \"{}\"", kind.placeholder())
        })?;
        let paths = self.discover()?;
        let runner = self.runner(&paths);
        let (session, printer) = self.session();

        let orchestrator = BuildOrchestrator::new(&paths, &runner, &StdoutSink, &OpenPreview);
        let result = orchestrator.add_variant(&session, &input).await;
        close_session(session, printer).await;
        result?;

        let config = DocsConfig::load(&paths.conf)?;
        print_variants(&config);
        Ok(())
    }

    async fn set_version(&self, version: &str) -> anyhow::Result<()> {
        let paths = self.discover()?;
        let config = DocsConfig::load(&paths.conf)?;
        if is_wildcard(version) {
            anyhow::bail!("set-version needs a concrete version");
        }
        check_configured(&config, Field::Version, version)?;

        let runner = self.runner(&paths);
        let (session, printer) = self.session();
        let orchestrator = BuildOrchestrator::new(&paths, &runner, &StdoutSink, &OpenPreview);
        let result = orchestrator.set_version(&session, version).await;
        close_session(session, printer).await;
        result?;

        let config = DocsConfig::load(&paths.conf)?;
        print_variants(&config);
        Ok(())
    }

    async fn upload(&self, filter: FilterOverride) -> anyhow::Result<()> {
        let paths = self.discover()?;
        let config = DocsConfig::load(&paths.conf)?;
        let uploader = HttpUploader::new(self.timeout)?;
        let pipeline = UploadPipeline::new(paths.out_dir(), &config, &uploader, self.concurrency);
        let cancel = CancellationToken::new();
        let prompts = TerminalPrompts::new(cancel.clone());
        let upload = UploadSession::new(&pipeline, &self.store, &prompts);

        let filter = self.store.filter().merge(&filter);
        let interrupt = cancel_on_interrupt(cancel.clone());
        let (events_tx, events_rx) = mpsc::channel(64);
        let printer = spawn_progress_printer(events_rx);

        let result = upload.run(&filter, &cancel, &events_tx).await;
        interrupt.abort();
        drop(events_tx);
        let _ = printer.await;

        let report = result?;
        if report.cancelled {
            return Err(UploadError::Cancelled.into());
        }
        if !report.is_success() {
            anyhow::bail!(
                "{} of {} files uploaded",
                report.succeeded.len(),
                report.total
            );
        }
        Ok(())
    }

    async fn server_ip(&self) -> anyhow::Result<()> {
        let config = DocsConfig::default();
        let uploader = HttpUploader::new(self.timeout)?;
        let pipeline = UploadPipeline::new(self.root.join("out"), &config, &uploader, 1);
        let prompts = TerminalPrompts::new(CancellationToken::new());
        UploadSession::new(&pipeline, &self.store, &prompts)
            .reconfigure_endpoint()
            .await;
        Ok(())
    }

    fn filter(&self, action: FilterAction) -> anyhow::Result<()> {
        let session = Session::new(self.store.filter());
        let changed = match action {
            FilterAction::Show => false,
            FilterAction::Set { field, value } => {
                let value = field_value(field, &value)?;
                if field != Field::Name && !is_wildcard(&value) {
                    let config = DocsConfig::load(&self.discover()?.conf)?;
                    check_configured(&config, field, &value)?;
                }
                session.set_field(field, value);
                true
            }
            FilterAction::Clear => {
                session.clear_filter();
                true
            }
        };

        let filter = session.filter();
        if changed {
            self.store.save_filter(&filter)?;
            info!(filter = %filter, "selection updated");
        }
        println!("{}", filter.summary());
        Ok(())
    }

    fn preview(&self, filter: FilterOverride) -> anyhow::Result<()> {
        let paths = self.discover()?;
        let runner = self.runner(&paths);
        let orchestrator = BuildOrchestrator::new(&paths, &runner, &StdoutSink, &OpenPreview);

        let filter = self.store.filter().merge(&filter);
        match orchestrator.preview(&filter)? {
            Some(page) => println!("Preview: {}", page.display()),
            None => eprintln!("No generated page for\n{}", filter.summary()),
        }
        Ok(())
    }

    fn markup(&self, lang: Option<&str>) -> anyhow::Result<()> {
        let paths = self.discover()?;
        let config = DocsConfig::load(&paths.conf)?;
        let selected = self.store.filter();
        let lang = match lang {
            Some(lang) => lang,
            None if !is_wildcard(&selected.language) => selected.language.as_str(),
            None => config.first_language(),
        };

        for file in list_markup_files(&paths.markup_dir(lang))? {
            println!("{file}");
        }
        Ok(())
    }

    fn types(&self) -> anyhow::Result<()> {
        let paths = self.discover()?;
        let config = DocsConfig::load(&paths.conf)?;
        for (name, description) in config.type_labels() {
            println!("{name}\t{description}");
        }
        Ok(())
    }
}

/// Normalizes a value entered for one selection field.
fn field_value(field: Field, raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    if field == Field::Name {
        return Ok(validate_name_pattern(raw)?);
    }
    Ok(if raw.is_empty() {
        WILDCARD.to_string()
    } else {
        raw.to_string()
    })
}

/// Rejects a language, version or scope the project does not define.
/// Wildcards and names always pass.
fn check_configured(config: &DocsConfig, field: Field, value: &str) -> Result<(), ValidationError> {
    if is_wildcard(value) {
        return Ok(());
    }
    let known: Vec<&str> = match field {
        Field::Language => config.languages.iter().map(|l| l.code.as_str()).collect(),
        Field::Version => config.versions.iter().map(String::as_str).collect(),
        Field::Scope => config.scopes.iter().map(|l| l.code.as_str()).collect(),
        Field::Name => return Ok(()),
    };
    if known.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::NotConfigured {
            field,
            value: value.to_string(),
            known: known.join(", "),
        })
    }
}

fn check_override(config: &DocsConfig, over: &FilterOverride) -> Result<(), ValidationError> {
    let fields = [
        (Field::Language, &over.language),
        (Field::Version, &over.version),
        (Field::Scope, &over.scope),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            check_configured(config, field, value)?;
        }
    }
    Ok(())
}

fn file_filter(path: &Path) -> Option<SelectionFilter> {
    let filter = filter_from_path(path);
    if filter.is_none() {
        warn!(
            path = %path.display(),
            "not a markup source or generated page, nothing to do"
        );
    }
    filter
}

fn print_variants(config: &DocsConfig) {
    let codes = |labels: &[dsdocs_config::Label]| {
        labels
            .iter()
            .map(|l| l.code.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("languages: {}", codes(&config.languages));
    println!("versions: {}", config.versions.join(", "));
    println!("scopes: {}", codes(&config.scopes));
}

/// Drops the session so the status printer drains and exits.
async fn close_session(session: Session, printer: Option<JoinHandle<()>>) {
    drop(session);
    if let Some(printer) = printer {
        let _ = printer.await;
    }
}

/// Exit status for a process ended by SIGINT.
const INTERRUPTED: i32 = 130;

/// First Ctrl-C cancels the upload and dismisses any open prompt; a second
/// one ends the process.
fn cancel_on_interrupt(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        info!("interrupt received, cancelling upload");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("second interrupt, exiting");
            std::process::exit(INTERRUPTED);
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        workspace: TempDir,
        settings: TempDir,
    }

    impl Fixture {
        /// Workspace whose scripts are shell scripts recording their
        /// arguments next to themselves.
        fn new() -> Self {
            let workspace = tempfile::tempdir().unwrap();
            let files = workspace.path().join("files");
            fs::create_dir_all(files.join("markup/en/app")).unwrap();
            fs::write(files.join("markup/en/app/Alert.md"), "# Alert").unwrap();
            for script in ["generate.js", "jsdoc-parser.js"] {
                fs::write(
                    files.join(script),
                    format!("echo \"$@\" >> files/{script}.log\n"),
                )
                .unwrap();
            }
            fs::write(
                files.join("conf.json"),
                r#"{"langs": {"en": "English"}, "vers": ["v257", "v256"],
                    "scopes": {"app": "Reference"},
                    "tname": {"num": "Number"}, "tdesc": {"str": "String"}}"#,
            )
            .unwrap();
            Self {
                workspace,
                settings: tempfile::tempdir().unwrap(),
            }
        }

        fn app(&self) -> (App, Commands) {
            self.app_with(&["filter"])
        }

        fn app_with(&self, args: &[&str]) -> (App, Commands) {
            let root = self.workspace.path().to_string_lossy().to_string();
            let config = self.settings.path().join("config.json");
            let config = config.to_string_lossy().to_string();
            let mut argv = vec![
                "dsdocs",
                "--root",
                root.as_str(),
                "--interpreter",
                "sh",
                "--config",
                config.as_str(),
            ];
            argv.extend_from_slice(args);
            let cli = Cli::try_parse_from(argv).unwrap();
            let app = App::new(&cli).unwrap();
            (app, cli.command)
        }

        fn log(&self, script: &str) -> String {
            fs::read_to_string(self.workspace.path().join("files").join(format!("{script}.log")))
                .unwrap_or_default()
        }
    }

    #[tokio::test]
    async fn filter_changes_persist_between_invocations() {
        let fx = Fixture::new();

        let (app, cmd) = fx.app_with(&["filter", "set", "scope", "app"]);
        app.run(cmd).await.unwrap();
        let (app, cmd) = fx.app_with(&["filter", "set", "lang", "en"]);
        app.run(cmd).await.unwrap();

        let (app, _) = fx.app();
        assert_eq!(app.store.filter(), SelectionFilter::new("en", "*", "app", "*"));

        let (app, cmd) = fx.app_with(&["filter", "clear"]);
        app.run(cmd).await.unwrap();
        let (app, _) = fx.app();
        assert!(app.store.filter().is_any());
    }

    #[tokio::test]
    async fn invalid_name_pattern_is_not_saved() {
        let fx = Fixture::new();
        let (app, cmd) = fx.app_with(&["filter", "set", "name", "Create("]);
        assert!(app.run(cmd).await.is_err());

        let (app, _) = fx.app();
        assert!(app.store.filter().is_any());
    }

    #[tokio::test]
    async fn unconfigured_values_are_not_saved() {
        let fx = Fixture::new();
        for (field, value) in [("version", "banana"), ("lang", "EN"), ("scope", "gfx")] {
            let (app, cmd) = fx.app_with(&["filter", "set", field, value]);
            let err = app.run(cmd).await.unwrap_err();
            assert!(
                err.downcast_ref::<ValidationError>().is_some(),
                "{field}={value}: {err:#}"
            );
        }
        let (app, _) = fx.app();
        assert!(app.store.filter().is_any());

        let (app, cmd) = fx.app_with(&["filter", "set", "version", "v256"]);
        app.run(cmd).await.unwrap();
        let (app, _) = fx.app();
        assert_eq!(app.store.filter().version, "v256");
    }

    #[tokio::test]
    async fn unconfigured_overrides_stop_the_build() {
        let fx = Fixture::new();
        let (app, cmd) = fx.app_with(&["clean", "--ver", "v999"]);
        assert!(app.run(cmd).await.is_err());
        let (app, cmd) = fx.app_with(&["generate", "--scope", "nope"]);
        assert!(app.run(cmd).await.is_err());
        assert!(fx.log("generate.js").is_empty());
        assert!(fx.log("jsdoc-parser.js").is_empty());
    }

    #[tokio::test]
    async fn clean_runs_generator_with_persisted_selection() {
        let fx = Fixture::new();
        let (app, cmd) = fx.app_with(&["filter", "set", "scope", "app"]);
        app.run(cmd).await.unwrap();

        let (app, cmd) = fx.app_with(&["clean", "--lang", "en"]);
        app.run(cmd).await.unwrap();

        assert_eq!(fx.log("generate.js").trim(), "-C en.app");
        assert!(fx.log("jsdoc-parser.js").is_empty());
    }

    #[tokio::test]
    async fn set_version_rejects_unknown_versions() {
        let fx = Fixture::new();
        let (app, cmd) = fx.app_with(&["set-version", "v999"]);
        assert!(app.run(cmd).await.is_err());
        assert!(fx.log("generate.js").is_empty());

        let (app, cmd) = fx.app_with(&["set-version", "v256"]);
        app.run(cmd).await.unwrap();
        assert_eq!(fx.log("generate.js").trim(), "-n -sv=v256");
    }

    #[tokio::test]
    async fn add_variant_validates_before_running() {
        let fx = Fixture::new();
        let (app, cmd) = fx.app_with(&["add-variant", "language", "EN (English)"]);
        let err = app.run(cmd).await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("\"en (English)\""), "{message}");
        assert!(message.contains("2 lower case letters"), "{message}");
        assert!(fx.log("generate.js").is_empty());
    }

    #[tokio::test]
    async fn file_commands_outside_the_workspace_trees_do_nothing() {
        let fx = Fixture::new();
        let (app, cmd) = fx.app_with(&["generate-file", "/tmp/notes.txt"]);
        app.run(cmd).await.unwrap();
        assert!(fx.log("generate.js").is_empty());
    }

    #[tokio::test]
    async fn missing_workspace_is_reported() {
        let fx = Fixture::new();
        fs::remove_file(fx.workspace.path().join("files/generate.js")).unwrap();
        let (app, cmd) = fx.app_with(&["generate"]);
        let err = app.run(cmd).await.unwrap_err();
        assert!(format!("{err:#}").contains("generate.js"));
    }

    #[tokio::test]
    async fn listing_commands_read_the_workspace() {
        let fx = Fixture::new();
        let (app, cmd) = fx.app_with(&["markup"]);
        app.run(cmd).await.unwrap();
        let (app, cmd) = fx.app_with(&["types"]);
        app.run(cmd).await.unwrap();

        let (app, cmd) = fx.app_with(&["markup", "--lang", "xx"]);
        assert!(app.run(cmd).await.is_err());
    }

    #[test]
    fn configured_values() {
        let config = DocsConfig::from_json(
            r#"{"langs": {"en": "English", "de": "Deutsch"}, "vers": ["v257"],
                "scopes": {"app": "Reference"}}"#,
        )
        .unwrap();
        assert!(check_configured(&config, Field::Language, "de").is_ok());
        assert!(check_configured(&config, Field::Version, "*").is_ok());
        assert!(check_configured(&config, Field::Name, "Anything").is_ok());
        assert_eq!(
            check_configured(&config, Field::Scope, "ui"),
            Err(ValidationError::NotConfigured {
                field: Field::Scope,
                value: "ui".into(),
                known: "app".into(),
            })
        );

        let over = FilterOverride {
            language: Some("de".into()),
            version: Some("v1".into()),
            ..FilterOverride::default()
        };
        assert!(check_override(&config, &over).is_err());
    }

    #[test]
    fn field_values_are_normalized() {
        assert_eq!(field_value(Field::Scope, "  ").unwrap(), "*");
        assert_eq!(field_value(Field::Version, " v257 ").unwrap(), "v257");
        assert_eq!(field_value(Field::Name, "").unwrap(), "*");
        assert!(field_value(Field::Name, "[").is_err());
    }
}
