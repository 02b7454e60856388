use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uiscript_engine::cli::{self, FileErrorMode, FileOptions, OutputHandlers, ReplOptions};
use uiscript_engine::config::{ConfigLoader, UiScriptConfig};
use uiscript_engine::{Driver, Session};
use uiscript_webdriver::WebDriverBackend;

#[derive(Parser, Debug)]
#[command(name = "uiscript", version, about = "Scripted browser UI testing")]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    #[command(flatten)]
    options: SharedOptions,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Read commands from the terminal
    Interactive,
    /// Run script files, each in a fresh session
    Run {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(ClapArgs, Debug, Default)]
struct SharedOptions {
    /// Configuration file (default: ./uiscript.yaml, then ~/.uiscript/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// URL of the WebDriver server
    #[arg(long, global = true)]
    webdriver_url: Option<String>,

    /// Browser to request from the WebDriver server
    #[arg(long, global = true)]
    browser: Option<String>,

    #[arg(long, global = true)]
    headless: bool,

    /// Page to open before the first command
    #[arg(long, global = true)]
    start_url: Option<String>,

    /// Session argument, bound in order as arg_0, arg_1, ...
    #[arg(long = "arg", global = true)]
    args: Vec<String>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

impl SharedOptions {
    fn apply(&self, config: &mut UiScriptConfig) {
        if let Some(url) = &self.webdriver_url {
            config.driver.webdriver_url = url.clone();
        }
        if let Some(browser) = &self.browser {
            config.driver.browser = browser.clone();
        }
        if self.headless {
            config.driver.headless = true;
        }
        if let Some(url) = &self.start_url {
            config.session.start_url = Some(url.clone());
        }
        if !self.args.is_empty() {
            config.session.args = self.args.clone();
        }
    }
}

async fn load_config(options: &SharedOptions) -> anyhow::Result<UiScriptConfig> {
    let mut config = match &options.config {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    options.apply(&mut config);
    Ok(config)
}

async fn open_start_page(driver: &mut dyn Driver, config: &UiScriptConfig) -> anyhow::Result<()> {
    if let Some(url) = &config.session.start_url {
        driver
            .navigate(url)
            .await
            .with_context(|| format!("opening start page {}", url))?;
    }
    Ok(())
}

fn output() -> OutputHandlers {
    OutputHandlers {
        out: |msg| println!("{}", msg),
        err: |msg| eprintln!("{}", msg),
    }
}

async fn run(
    mode: Mode,
    config: &UiScriptConfig,
    driver: &mut dyn Driver,
    session: &mut Session,
) -> anyhow::Result<bool> {
    match mode {
        Mode::Interactive => {
            open_start_page(driver, config).await?;
            let repl_options = ReplOptions {
                banner_lines: &[
                    "Browser ready. Type 'help' for commands, 'exit' or 'quit' to close.",
                ],
                exit_commands: &["exit", "quit"],
                handle_ctrl_c: true,
                ctrl_c_message: Some("\nShutdown signal received."),
            };
            cli::run_repl(driver, session, output(), repl_options).await?;
            Ok(true)
        }
        Mode::Run { files } => {
            let mut all_passed = true;
            for path in &files {
                session.reset().await;
                open_start_page(driver, config).await?;
                info!("Running {}", path.display());

                let report = cli::run_file(
                    driver,
                    session,
                    output(),
                    path,
                    FileOptions {
                        stop_on_error: config.session.stop_on_error,
                        error_mode: FileErrorMode::WithLine,
                    },
                )
                .await
                .with_context(|| format!("reading {}", path.display()))?;

                println!("{}", report);
                all_passed &= report.passed();
            }
            session.reset().await;
            Ok(all_passed)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // stdout carries command output only
    let filter = if args.options.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args.options).await?;
    let mut session = Session::from_config(&config).await?;

    let mut driver = WebDriverBackend::new(config.driver.clone());
    driver
        .launch()
        .await
        .context("Failed to launch browser")?;

    let result = run(args.mode, &config, &mut driver, &mut session).await;

    if let Err(e) = driver.close().await {
        error!("Failed to close browser: {}", e);
    }

    if result? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
