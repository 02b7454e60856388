use crate::driver::Driver;
use crate::session::{InputSource, LineOutcome, Session};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Clone, Copy)]
pub struct OutputHandlers {
    pub out: fn(&str),
    pub err: fn(&str),
}

pub enum FileErrorMode {
    Plain,
    WithLine,
}

pub struct FileOptions {
    pub stop_on_error: bool,
    pub error_mode: FileErrorMode,
}

pub struct ReplOptions<'a> {
    pub banner_lines: &'a [&'a str],
    pub exit_commands: &'a [&'a str],
    pub handle_ctrl_c: bool,
    pub ctrl_c_message: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct LineFailure {
    pub line: usize,
    pub text: String,
    pub error: String,
}

/// Result of running one script file.
#[derive(Debug, Clone)]
pub struct ScriptReport {
    pub path: PathBuf,
    pub lines_run: usize,
    pub failures: Vec<LineFailure>,
    /// Set when a failure ended the file before its last line.
    pub stopped: bool,
}

impl ScriptReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn status(&self) -> &'static str {
        if self.passed() { "PASS" } else { "FAIL" }
    }
}

impl fmt::Display for ScriptReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status(), self.path.display())?;
        if let Some(first) = self.failures.first() {
            write!(f, " (line {}: {})", first.line, first.error)?;
        }
        Ok(())
    }
}

fn show_outcome(outcome: &LineOutcome, output: OutputHandlers) {
    for text in &outcome.outputs {
        (output.out)(text);
    }
    for ignored in &outcome.ignored {
        (output.err)(&format!("Ignored: {}", ignored));
    }
}

/// Run every line of `path` in order. Blank lines and `#` comments are
/// skipped; line numbers in the report are 1-based.
pub async fn run_file(
    driver: &mut dyn Driver,
    session: &mut Session,
    output: OutputHandlers,
    path: &Path,
    options: FileOptions,
) -> Result<ScriptReport, io::Error> {
    let content = tokio::fs::read_to_string(path).await?;
    let mut report = ScriptReport {
        path: path.to_path_buf(),
        lines_run: 0,
        failures: Vec::new(),
        stopped: false,
    };

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let number = index + 1;
        report.lines_run += 1;

        match session.execute_line(driver, trimmed).await {
            Ok(outcome) => {
                show_outcome(&outcome, output);
                if outcome.quit {
                    info!("Script ended by quit at line {}", number);
                    break;
                }
            }
            Err(err) => {
                match options.error_mode {
                    FileErrorMode::Plain => (output.err)(&format!("Error: {}", err)),
                    FileErrorMode::WithLine => (output.err)(&format!(
                        "Error at line {} '{}': {}",
                        number, trimmed, err
                    )),
                }
                report.failures.push(LineFailure {
                    line: number,
                    text: trimmed.to_string(),
                    error: err.to_string(),
                });
                if options.stop_on_error {
                    report.stopped = true;
                    break;
                }
            }
        }
    }
    Ok(report)
}

/// Possible outcomes from reading a single REPL line.
enum ReadLineResult {
    /// A non-empty input line to process.
    Input(String),
    /// Empty line or no input yet -- skip and re-prompt.
    Skip,
    /// EOF or exit command -- terminate the loop.
    Exit,
    /// I/O error while reading.
    Error(io::Error),
}

async fn read_line(
    input: &mut InputSource,
    exit_commands: &[&str],
    handle_ctrl_c: bool,
    ctrl_c_message: Option<&str>,
    output: OutputHandlers,
) -> ReadLineResult {
    if handle_ctrl_c {
        tokio::select! {
            line = input.next_line() => {
                classify_line(line, exit_commands)
            }
            _ = tokio::signal::ctrl_c() => {
                if let Some(message) = ctrl_c_message {
                    (output.out)(message);
                }
                ReadLineResult::Exit
            }
        }
    } else {
        classify_line(input.next_line().await, exit_commands)
    }
}

fn classify_line(
    result: Result<Option<String>, io::Error>,
    exit_commands: &[&str],
) -> ReadLineResult {
    match result {
        Ok(Some(input)) => {
            let trimmed = input.trim().to_string();
            if trimmed.is_empty() {
                ReadLineResult::Skip
            } else if exit_commands
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&trimmed))
            {
                ReadLineResult::Exit
            } else {
                ReadLineResult::Input(trimmed)
            }
        }
        Ok(None) => ReadLineResult::Exit,
        Err(e) => ReadLineResult::Error(e),
    }
}

/// Interactive loop. Errors are shown and never end the loop.
pub async fn run_repl(
    driver: &mut dyn Driver,
    session: &mut Session,
    output: OutputHandlers,
    options: ReplOptions<'_>,
) -> Result<(), io::Error> {
    for line in options.banner_lines {
        (output.out)(line);
    }

    let mut stdout = io::stdout();

    loop {
        print!("{}", session.state.display_prompt());
        stdout.flush()?;

        match read_line(
            &mut session.state.input,
            options.exit_commands,
            options.handle_ctrl_c,
            options.ctrl_c_message,
            output,
        )
        .await
        {
            ReadLineResult::Input(line) => match session.execute_line(driver, &line).await {
                Ok(outcome) => {
                    show_outcome(&outcome, output);
                    if outcome.quit {
                        break;
                    }
                }
                Err(err) => (output.err)(&format!("Error: {}", err)),
            },
            ReadLineResult::Skip => continue,
            ReadLineResult::Exit => break,
            ReadLineResult::Error(e) => return Err(e),
        }
    }
    Ok(())
}
