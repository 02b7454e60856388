//! One test session: the active page, its element registry, the
//! session-wide state commands mutate, and the per-line pipeline.

use crate::commands::macros::MAX_MACRO_DEPTH;
use crate::commands::{CommandError, CommandResult, CommandTable, Handler, MacroDefinition};
use crate::config::{SessionConfig, TimingConfig, UiScriptConfig};
use crate::dispatcher::DispatchContext;
use crate::driver::{Driver, DriverError};
use crate::pages::{probe, PageCatalog, PageLoadError};
use crate::wait::Poller;
use async_recursion::async_recursion;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::{debug, info, warn};
use uiscript_common::error::{PipelineError, RegistryError};
use uiscript_common::{DynamicRegistry, PageDescriptor, StaticRegistry};
use uiscript_parser::{process, Bindings, Invocation, PipelineContext};

pub const DEFAULT_PROMPT: &str = "> ";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("'{command}' failed: {source}")]
    Command {
        command: String,
        #[source]
        source: CommandError,
    },

    #[error("Could not read the current page: {0}")]
    Driver(#[from] DriverError),
}

/// Failures while assembling a session from configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Failed to load pages: {0}")]
    Pages(#[from] PageLoadError),

    #[error("Failed to register commands: {0}")]
    Registry(#[from] RegistryError),
}

/// The one line source shared by the REPL and `pause`, so neither can
/// buffer input the other should have seen.
pub enum InputSource {
    /// Opened on first read.
    Stdin(Option<Lines<BufReader<Stdin>>>),
    /// Lines consumed in order; exhausted input reads as EOF.
    Scripted(VecDeque<String>),
}

impl InputSource {
    pub fn stdin() -> Self {
        InputSource::Stdin(None)
    }

    /// Next input line, or `None` at end of input.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        match self {
            InputSource::Stdin(lines) => {
                lines
                    .get_or_insert_with(|| BufReader::new(tokio::io::stdin()).lines())
                    .next_line()
                    .await
            }
            InputSource::Scripted(replies) => Ok(replies.pop_front()),
        }
    }

    pub async fn wait_for_enter(&mut self, message: &str) -> std::io::Result<()> {
        if matches!(self, InputSource::Stdin(_)) {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(message.as_bytes()).await?;
            stdout.flush().await?;
        }
        self.next_line().await?;
        Ok(())
    }
}

/// Appends dispatched command lines to a saved session file.
pub struct Recorder {
    path: PathBuf,
    file: tokio::fs::File,
}

impl Recorder {
    /// Fails with `AlreadyExists` rather than touching an existing file.
    pub async fn create(path: &Path) -> std::io::Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&mut self, line: &str) -> std::io::Result<()> {
        self.file.write_all(line.as_bytes()).await?;
        self.file.write_all(b"\n").await?;
        self.file.flush().await
    }

    pub async fn finish(mut self) -> std::io::Result<()> {
        self.file.flush().await
    }
}

/// Session-wide values commands read and change.
pub struct SessionState {
    pub session_args: Bindings,
    pub temp_vars: Bindings,
    pub timing: TimingConfig,
    /// Dispatch failures are logged and skipped while set (`try_start`).
    pub best_effort: bool,
    pub quit_requested: bool,
    pub prompt: String,
    pub saved_sessions_dir: PathBuf,
    pub recorder: Option<Recorder>,
    pub input: InputSource,
}

impl SessionState {
    pub fn new(config: &SessionConfig, timing: TimingConfig) -> Self {
        Self {
            session_args: config.bindings(),
            temp_vars: Bindings::new(),
            timing,
            best_effort: false,
            quit_requested: false,
            prompt: DEFAULT_PROMPT.to_string(),
            saved_sessions_dir: config.saved_sessions_dir.clone(),
            recorder: None,
            input: InputSource::stdin(),
        }
    }

    /// Prompt shown by the REPL, starred while recording.
    pub fn display_prompt(&self) -> String {
        if self.recorder.is_some() {
            format!("*{}", self.prompt)
        } else {
            self.prompt.clone()
        }
    }
}

/// What one input line produced.
#[derive(Debug, Default)]
pub struct LineOutcome {
    pub outputs: Vec<String>,
    pub dispatched: usize,
    /// Failures swallowed in best-effort mode.
    pub ignored: Vec<SessionError>,
    pub quit: bool,
}

pub struct Session {
    table: Arc<CommandTable>,
    catalog: Arc<PageCatalog>,
    page: Arc<PageDescriptor>,
    elements: DynamicRegistry,
    pub state: SessionState,
}

fn unknown_page() -> Arc<PageDescriptor> {
    Arc::new(PageDescriptor::new("", ""))
}

/// Poll until the page's wait element is ready, warning on timeout.
async fn await_ready(driver: &mut dyn Driver, page: &PageDescriptor, timing: &TimingConfig) {
    if page.wait.is_none() {
        return;
    }
    let mut poller = Poller::new(timing.page_load_timeout(), timing.poll_interval());
    loop {
        if probe::page_ready(driver, page).await {
            return;
        }
        if !poller.next().await {
            warn!(
                "Page '{}' not ready after {}s",
                page.name, timing.page_load_timeout_secs
            );
            return;
        }
    }
}

impl Session {
    pub fn new(table: Arc<CommandTable>, catalog: Arc<PageCatalog>, state: SessionState) -> Self {
        Self {
            table,
            catalog,
            page: unknown_page(),
            elements: DynamicRegistry::empty(),
            state,
        }
    }

    /// Built-in commands plus configured macros, and every page found
    /// under the configured page paths.
    pub async fn from_config(config: &UiScriptConfig) -> Result<Self, SetupError> {
        let table = CommandTable::builtin()?.with_macros(&config.macros)?;
        let catalog = PageCatalog::load(&config.pages.paths).await?;
        info!(
            "Loaded {} commands and {} pages",
            table.registry().len(),
            catalog.len()
        );
        Ok(Self::new(
            Arc::new(table),
            Arc::new(catalog),
            SessionState::new(&config.session, config.timing.clone()),
        ))
    }

    /// Active page, or `None` while the URL matches no descriptor.
    pub fn page(&self) -> Option<&PageDescriptor> {
        (!self.page.name.is_empty()).then_some(self.page.as_ref())
    }

    pub fn elements(&self) -> &DynamicRegistry {
        &self.elements
    }

    pub fn commands(&self) -> &StaticRegistry {
        self.table.registry()
    }

    /// Forget per-run state: temporary variables, best-effort mode, a
    /// pending quit and any open recording.
    pub async fn reset(&mut self) {
        self.state.temp_vars.clear();
        self.state.best_effort = false;
        self.state.quit_requested = false;
        if let Some(recorder) = self.state.recorder.take() {
            if let Err(e) = recorder.finish().await {
                warn!("Failed to close saved session file: {}", e);
            }
        }
    }

    /// Re-identify the active page from the browser's URL and rebuild the
    /// element registry. The new registry replaces the old one only once
    /// complete.
    pub async fn refresh(&mut self, driver: &mut dyn Driver) -> Result<(), DriverError> {
        driver.release_elements().await;
        let url = driver.current_url().await?;
        let page = match self.catalog.identify(&url) {
            Some(page) => page,
            None => {
                if self.page.name.is_empty() {
                    debug!("No page descriptor matches {}", url);
                } else {
                    warn!("Left page '{}': no page descriptor matches {}", self.page.name, url);
                }
                unknown_page()
            }
        };

        if page.name != self.page.name && !page.name.is_empty() {
            info!(page = %page.name, url = %url, "Page changed");
            await_ready(driver, &page, &self.state.timing).await;
        }

        let elements = probe::build_registry(driver, &page).await;
        debug!("{} elements available on '{}'", elements.len(), page.name);
        self.page = page;
        self.elements = elements;
        Ok(())
    }

    /// Run `line` through the whole pipeline against the current
    /// registries, without dispatching anything.
    pub fn parse(&self, line: &str) -> Result<Vec<Invocation>, PipelineError> {
        let ctx = PipelineContext::new(
            self.table.registry(),
            &self.elements,
            &self.state.session_args,
            &self.state.temp_vars,
        );
        process(line, &ctx)
    }

    /// Refresh, parse and dispatch one line.
    ///
    /// Nothing runs unless the whole line validates. Once dispatch starts,
    /// the first failing command ends the line unless best-effort mode is
    /// on, in which case the failure is logged and the line continues.
    pub async fn execute_line(
        &mut self,
        driver: &mut dyn Driver,
        line: &str,
    ) -> Result<LineOutcome, SessionError> {
        self.refresh(driver).await?;
        let invocations = self.parse(line)?;

        let mut outcome = LineOutcome::default();
        for invocation in &invocations {
            match self.dispatch(driver, invocation, 0).await {
                Ok(output) => {
                    outcome.dispatched += 1;
                    outcome.outputs.extend(output);
                    self.record(invocation).await;
                }
                Err(source) => {
                    let error = SessionError::Command {
                        command: invocation.name().to_string(),
                        source,
                    };
                    if !self.state.best_effort {
                        return Err(error);
                    }
                    warn!("Ignoring failure: {}", error);
                    outcome.ignored.push(error);
                }
            }
            if self.state.quit_requested {
                outcome.quit = true;
                break;
            }
        }
        Ok(outcome)
    }

    async fn record(&mut self, invocation: &Invocation) {
        if matches!(invocation.name(), "save" | "end_save") {
            return;
        }
        if let Some(recorder) = self.state.recorder.as_mut() {
            if let Err(e) = recorder.record(&invocation.to_line()).await {
                warn!("Failed to record to {}: {}", recorder.path().display(), e);
            }
        }
    }

    #[async_recursion]
    async fn dispatch(
        &mut self,
        driver: &mut dyn Driver,
        invocation: &Invocation,
        depth: usize,
    ) -> CommandResult {
        let table = Arc::clone(&self.table);
        if let Some(Handler::Macro(definition)) = table.handler(invocation.name()) {
            return self
                .run_macro(driver, Arc::clone(definition), invocation, depth)
                .await;
        }

        DispatchContext {
            driver,
            table: &table,
            page: &self.page,
            elements: &self.elements,
            state: &mut self.state,
        }
        .dispatch(invocation)
        .await
    }

    /// Expand a macro and run each body line as if it had been typed,
    /// refreshing the page before every line.
    async fn run_macro(
        &mut self,
        driver: &mut dyn Driver,
        definition: Arc<MacroDefinition>,
        invocation: &Invocation,
        depth: usize,
    ) -> CommandResult {
        if depth >= MAX_MACRO_DEPTH {
            return Err(CommandError::MacroDepth(definition.name.clone()));
        }
        let values: Vec<String> = invocation.args.iter().map(|t| t.text_value()).collect();

        let mut outputs = Vec::new();
        for line in definition.expand(&values) {
            debug!("macro {}: {}", definition.name, line);
            self.refresh(driver).await?;
            let inner = self.parse(&line).map_err(|source| CommandError::MacroLine {
                name: definition.name.clone(),
                line: line.clone(),
                source,
            })?;
            for step in &inner {
                outputs.extend(self.dispatch(driver, step, depth + 1).await?);
                if self.state.quit_requested {
                    break;
                }
            }
            if self.state.quit_requested {
                break;
            }
        }
        Ok((!outputs.is_empty()).then(|| outputs.join("\n")))
    }
}
