//! Parser/generator sequencing for build commands.

use std::path::{Path, PathBuf};

use dsdocs_artifacts::ArtifactResolver;
use dsdocs_config::{DocsConfig, ProjectPaths};
use dsdocs_process::{Args, OutputSink, StepRunner};
use dsdocs_selection::{FilterOverride, SelectionFilter, VariantInput};
use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::error::{BuildError, Step};
use crate::options::{BuildOptions, VariantEdit, generator_args, parser_args};
use crate::session::Session;

/// Opens a generated page for viewing.
pub trait PreviewLauncher: Send + Sync {
    fn open(&self, page: &Path) -> std::io::Result<()>;
}

/// One orchestrated generator command.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub command: Command,
    /// Merged onto the session filter for this run only.
    pub filter: FilterOverride,
    pub options: BuildOptions,
}

impl BuildRequest {
    /// Request with the flags a command implies.
    pub fn for_command(command: Command) -> Self {
        let options = match command {
            Command::Generate => BuildOptions::clear(),
            Command::Clean => BuildOptions::clean(),
            Command::Update => BuildOptions::update(),
            _ => BuildOptions::default(),
        };
        Self {
            command,
            filter: FilterOverride::default(),
            options,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<FilterOverride>) -> Self {
        self.filter = filter.into();
        self
    }
}

/// Result of a successful build command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub command: Command,
    pub filter: SelectionFilter,
    /// Page opened after a regenerate, if any.
    pub previewed: Option<PathBuf>,
}

/// Runs build commands against a docs workspace.
pub struct BuildOrchestrator<'a> {
    paths: &'a ProjectPaths,
    runner: &'a dyn StepRunner,
    sink: &'a dyn OutputSink,
    preview: &'a dyn PreviewLauncher,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(
        paths: &'a ProjectPaths,
        runner: &'a dyn StepRunner,
        sink: &'a dyn OutputSink,
        preview: &'a dyn PreviewLauncher,
    ) -> Self {
        Self {
            paths,
            runner,
            sink,
            preview,
        }
    }

    /// Runs the parser (for regenerate commands) and then the generator.
    ///
    /// A parser failure ends the run before the generator starts. The
    /// session is released on every path.
    pub async fn generate(
        &self,
        session: &Session,
        request: BuildRequest,
    ) -> Result<BuildReport, BuildError> {
        let guard = session.begin(request.command)?;
        let filter = session.filter().merge(&request.filter);
        self.sink.clear();

        info!(command = request.command.id(), filter = %filter, "build started");
        let result = self.generate_steps(request.command, &filter, &request.options).await;
        match &result {
            Ok(report) => info!(
                command = request.command.id(),
                previewed = ?report.previewed,
                "build finished"
            ),
            Err(e) => error!(command = request.command.id(), error = %e, "build failed"),
        }

        guard.finish(&filter, &result);
        result
    }

    async fn generate_steps(
        &self,
        command: Command,
        filter: &SelectionFilter,
        options: &BuildOptions,
    ) -> Result<BuildReport, BuildError> {
        if command.regenerates_from_source() {
            let args = parser_args(filter);
            self.runner
                .run(&self.paths.parser, &args, self.sink)
                .await
                .map_err(BuildError::step(Step::Parser))?;
        }

        let args = generator_args(filter, options);
        self.runner
            .run(&self.paths.generator, &args, self.sink)
            .await
            .map_err(BuildError::step(Step::Generator))?;

        let previewed = if command.regenerates_from_source() {
            match self.preview(filter) {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, "preview skipped");
                    None
                }
            }
        } else {
            None
        };

        Ok(BuildReport {
            command,
            filter: filter.clone(),
            previewed,
        })
    }

    /// Registers a language, version or scope with the generator.
    pub async fn add_variant(
        &self,
        session: &Session,
        input: &VariantInput,
    ) -> Result<BuildReport, BuildError> {
        let edit = VariantEdit::Add {
            field: input.kind.field(),
            value: input.value.clone(),
        };
        let request = BuildRequest {
            command: Command::AddVariant,
            filter: FilterOverride::default(),
            options: BuildOptions::edit(edit),
        };
        self.generate(session, request).await
    }

    /// Makes `version` the current docs version.
    pub async fn set_version(
        &self,
        session: &Session,
        version: &str,
    ) -> Result<BuildReport, BuildError> {
        let edit = VariantEdit::Set {
            field: 'v',
            value: version.to_string(),
        };
        let request = BuildRequest {
            command: Command::SetVersion,
            filter: FilterOverride::default(),
            options: BuildOptions::edit(edit),
        };
        self.generate(session, request).await
    }

    /// Runs one of the standalone scripts (update-pages, markdown-gen).
    pub async fn run_script(&self, session: &Session, command: Command) -> Result<(), BuildError> {
        let script = match command {
            Command::UpdatePages => &self.paths.update_pages,
            Command::MarkdownGen => &self.paths.markdown_gen,
            other => {
                return Err(BuildError::MissingScript(format!(
                    "no script for {}",
                    other.id()
                )));
            }
        };
        if !script.exists() {
            return Err(BuildError::MissingScript(script.display().to_string()));
        }

        let guard = session.begin(command)?;
        let filter = session.filter();
        self.sink.clear();

        let result = self
            .runner
            .run(script, &Args::new(), self.sink)
            .await
            .map_err(BuildError::step(Step::Script));
        if let Err(e) = &result {
            error!(command = command.id(), error = %e, "script failed");
        }

        guard.finish(&filter, &result);
        result
    }

    /// Resolves the page for `filter` and opens it when it exists.
    pub fn preview(&self, filter: &SelectionFilter) -> Result<Option<PathBuf>, BuildError> {
        let config = DocsConfig::load(&self.paths.conf)?;
        let resolver = ArtifactResolver::new(self.paths.out_dir(), &config);
        let page = resolver.resolve_artifact(filter)?;

        if !page.is_file() {
            debug!(page = %page.display(), "no generated page to preview");
            return Ok(None);
        }
        self.preview.open(&page).map_err(BuildError::Preview)?;
        info!(page = %page.display(), "preview opened");
        Ok(Some(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::StatusEvent;
    use dsdocs_process::{MemorySink, ProcessError};
    use dsdocs_selection::{VariantKind, parse_variant_input};
    use std::fs;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records invocations; fails any script whose file name is in `failing`.
    struct MockRunner {
        calls: Mutex<Vec<(String, String)>>,
        failing: Vec<&'static str>,
    }

    impl MockRunner {
        fn new() -> Self {
            Self::failing(&[])
        }

        fn failing(scripts: &[&'static str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failing: scripts.to_vec(),
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl StepRunner for MockRunner {
        fn run<'a>(
            &'a self,
            script: &'a Path,
            args: &'a Args,
            sink: &'a dyn OutputSink,
        ) -> Pin<Box<dyn Future<Output = Result<(), ProcessError>> + Send + 'a>> {
            let name = script.file_name().unwrap().to_string_lossy().into_owned();
            self.calls
                .lock()
                .unwrap()
                .push((name.clone(), args.to_string()));
            let fail = self.failing.contains(&name.as_str());

            Box::pin(async move {
                sink.append_line(&format!("ran {name}"));
                if fail {
                    Err(ProcessError::Exit {
                        code: Some(1),
                        signal: None,
                    })
                } else {
                    Ok(())
                }
            })
        }
    }

    #[derive(Default)]
    struct MockPreview {
        opened: Mutex<Vec<PathBuf>>,
    }

    impl PreviewLauncher for MockPreview {
        fn open(&self, page: &Path) -> std::io::Result<()> {
            self.opened.lock().unwrap().push(page.to_path_buf());
            Ok(())
        }
    }

    fn workspace() -> (TempDir, ProjectPaths) {
        let dir = TempDir::new().unwrap();
        let paths = ProjectPaths::new(dir.path());
        fs::create_dir_all(dir.path().join("files")).unwrap();
        fs::write(
            &paths.conf,
            r#"{"langs": {"en": "English"}, "vers": ["v257"], "scopes": {"app": "Reference"}}"#,
        )
        .unwrap();
        let app = dir.path().join("out/docs/v257/app");
        fs::create_dir_all(&app).unwrap();
        fs::write(app.join("Alert.htm"), b"").unwrap();
        (dir, paths)
    }

    #[tokio::test]
    async fn generate_runs_parser_then_generator_and_previews() {
        let (dir, paths) = workspace();
        let runner = MockRunner::new();
        let sink = MemorySink::new();
        let preview = MockPreview::default();
        let orch = BuildOrchestrator::new(&paths, &runner, &sink, &preview);
        let session = Session::new(SelectionFilter::new("en", "*", "app", "Alert"));

        let report = orch
            .generate(&session, BuildRequest::for_command(Command::Generate))
            .await
            .unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                ("jsdoc-parser.js".to_string(), "-p=app.Alert".to_string()),
                ("generate.js".to_string(), r#"-c "en.app.Alert""#.to_string()),
            ]
        );
        let page = dir.path().join("out/docs/v257/app/Alert.htm");
        assert_eq!(report.previewed, Some(page.clone()));
        assert_eq!(*preview.opened.lock().unwrap(), vec![page]);
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn parser_failure_skips_generator() {
        let (_dir, paths) = workspace();
        let runner = MockRunner::failing(&["jsdoc-parser.js"]);
        let sink = MemorySink::new();
        let preview = MockPreview::default();
        let orch = BuildOrchestrator::new(&paths, &runner, &sink, &preview);
        let mut session = Session::default();
        let mut events = session.take_events().unwrap();

        let err = orch
            .generate(&session, BuildRequest::for_command(Command::Update))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BuildError::Step {
                step: Step::Parser,
                ..
            }
        ));
        assert_eq!(err.exit_code(), Some(1));
        assert_eq!(runner.calls().len(), 1);
        assert!(preview.opened.lock().unwrap().is_empty());
        assert!(!session.is_running());

        assert!(matches!(events.recv().await.unwrap(), StatusEvent::Busy { .. }));
        match events.recv().await.unwrap() {
            StatusEvent::Failed { code, summary, .. } => {
                assert_eq!(code, Some(1));
                assert!(summary.starts_with("language: *"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn generator_failure_skips_preview() {
        let (_dir, paths) = workspace();
        let runner = MockRunner::failing(&["generate.js"]);
        let sink = MemorySink::new();
        let preview = MockPreview::default();
        let orch = BuildOrchestrator::new(&paths, &runner, &sink, &preview);
        let session = Session::new(SelectionFilter::new("en", "*", "app", "Alert"));

        let err = orch
            .generate(&session, BuildRequest::for_command(Command::Generate))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BuildError::Step {
                step: Step::Generator,
                ..
            }
        ));
        assert_eq!(runner.calls().len(), 2);
        assert!(preview.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn clean_skips_parser_and_preview() {
        let (_dir, paths) = workspace();
        let runner = MockRunner::new();
        let sink = MemorySink::new();
        let preview = MockPreview::default();
        let orch = BuildOrchestrator::new(&paths, &runner, &sink, &preview);
        let session = Session::new(SelectionFilter::new("en", "*", "app", "*"));

        let report = orch
            .generate(&session, BuildRequest::for_command(Command::Clean))
            .await
            .unwrap();

        assert_eq!(
            runner.calls(),
            vec![("generate.js".to_string(), r#"-C "en.app""#.to_string())]
        );
        assert_eq!(report.previewed, None);
    }

    #[tokio::test]
    async fn override_applies_to_one_run_only() {
        let (_dir, paths) = workspace();
        let runner = MockRunner::new();
        let sink = MemorySink::new();
        let preview = MockPreview::default();
        let orch = BuildOrchestrator::new(&paths, &runner, &sink, &preview);
        let session = Session::new(SelectionFilter::new("en", "*", "*", "*"));

        let request = BuildRequest::for_command(Command::GenerateFile)
            .with_filter(SelectionFilter::new("de", "*", "ui", "Button"));
        let report = orch.generate(&session, request).await.unwrap();

        assert_eq!(report.filter, SelectionFilter::new("de", "*", "ui", "Button"));
        assert_eq!(session.filter(), SelectionFilter::new("en", "*", "*", "*"));
        assert_eq!(runner.calls()[1].1, r#""de.ui.Button""#);
    }

    #[tokio::test]
    async fn busy_session_rejects_new_build() {
        let (_dir, paths) = workspace();
        let runner = MockRunner::new();
        let sink = MemorySink::new();
        let preview = MockPreview::default();
        let orch = BuildOrchestrator::new(&paths, &runner, &sink, &preview);
        let session = Session::default();

        let _guard = session.begin(Command::Generate).unwrap();
        let err = orch
            .generate(&session, BuildRequest::for_command(Command::Clean))
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::AlreadyRunning));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn variant_edits_skip_generation() {
        let (_dir, paths) = workspace();
        let runner = MockRunner::new();
        let sink = MemorySink::new();
        let preview = MockPreview::default();
        let orch = BuildOrchestrator::new(&paths, &runner, &sink, &preview);
        let session = Session::default();

        let input = parse_variant_input(VariantKind::Language, "de (Deutsch)").unwrap();
        orch.add_variant(&session, &input).await.unwrap();
        orch.set_version(&session, "v256").await.unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                ("generate.js".to_string(), r#"-n -al="de=Deutsch" """#.to_string()),
                ("generate.js".to_string(), r#"-n -sv="v256" """#.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn scripts_run_without_arguments() {
        let (_dir, paths) = workspace();
        fs::write(&paths.update_pages, b"").unwrap();
        let runner = MockRunner::new();
        let sink = MemorySink::new();
        let preview = MockPreview::default();
        let orch = BuildOrchestrator::new(&paths, &runner, &sink, &preview);
        let session = Session::default();

        orch.run_script(&session, Command::UpdatePages).await.unwrap();
        assert_eq!(
            runner.calls(),
            vec![("updatePages.js".to_string(), String::new())]
        );

        let err = orch
            .run_script(&session, Command::MarkdownGen)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingScript(_)));
    }

    #[tokio::test]
    async fn preview_of_missing_page_is_skipped() {
        let (_dir, paths) = workspace();
        let runner = MockRunner::new();
        let sink = MemorySink::new();
        let preview = MockPreview::default();
        let orch = BuildOrchestrator::new(&paths, &runner, &sink, &preview);

        let page = orch.preview(&SelectionFilter::any()).unwrap();
        assert_eq!(page, None);
        assert!(preview.opened.lock().unwrap().is_empty());
    }
}
