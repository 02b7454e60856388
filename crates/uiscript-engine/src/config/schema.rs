use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use uiscript_parser::Bindings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiScriptConfig {
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub pages: PagesConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub macros: BTreeMap<String, MacroConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_browser")]
    pub browser: String,
    #[serde(default)]
    pub headless: bool,
    #[serde(default)]
    pub implicit_wait_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            browser: default_browser(),
            headless: false,
            implicit_wait_ms: 0,
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_browser() -> String {
    "firefox".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesConfig {
    #[serde(default = "default_page_paths")]
    pub paths: Vec<PathBuf>,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            paths: default_page_paths(),
        }
    }
}

fn default_page_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("./pages")]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_click_settle_ms")]
    pub click_settle_ms: u64,
    #[serde(default = "default_submit_settle_ms")]
    pub submit_settle_ms: u64,
    #[serde(default = "default_highlight_ms")]
    pub highlight_ms: u64,
    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            click_settle_ms: default_click_settle_ms(),
            submit_settle_ms: default_submit_settle_ms(),
            highlight_ms: default_highlight_ms(),
            page_load_timeout_secs: default_page_load_timeout_secs(),
        }
    }
}

impl TimingConfig {
    /// No settling or highlighting delays; polls every 10ms.
    pub fn immediate() -> Self {
        Self {
            poll_interval_ms: 10,
            click_settle_ms: 0,
            submit_settle_ms: 0,
            highlight_ms: 0,
            page_load_timeout_secs: 0,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn submit_settle(&self) -> Duration {
        Duration::from_millis(self.submit_settle_ms)
    }

    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_click_settle_ms() -> u64 {
    3000
}

fn default_submit_settle_ms() -> u64 {
    2000
}

fn default_highlight_ms() -> u64 {
    500
}

fn default_page_load_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub start_url: Option<String>,
    /// Positional session arguments, bound as `arg_0`, `arg_1`, ...
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    #[serde(default = "default_saved_sessions_dir")]
    pub saved_sessions_dir: PathBuf,
    #[serde(default = "default_stop_on_error")]
    pub stop_on_error: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_url: None,
            args: Vec::new(),
            vars: BTreeMap::new(),
            saved_sessions_dir: default_saved_sessions_dir(),
            stop_on_error: default_stop_on_error(),
        }
    }
}

impl SessionConfig {
    pub fn bindings(&self) -> Bindings {
        let mut bindings: Bindings = self
            .args
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("arg_{}", i), v.clone()))
            .collect();
        for (name, value) in &self.vars {
            bindings.insert(name.clone(), value.clone());
        }
        bindings
    }
}

fn default_saved_sessions_dir() -> PathBuf {
    PathBuf::from("./saved_sessions")
}

fn default_stop_on_error() -> bool {
    true
}

/// A named sequence of lines run as one command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MacroConfig {
    #[serde(default)]
    pub params: Vec<String>,
    pub body: Vec<String>,
    #[serde(default)]
    pub summary: String,
}
