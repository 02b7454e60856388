use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};
use tracing::debug;
use uiscript_engine::DriverError;

/// Session capabilities for `browser`. Unknown browser names only set
/// `browserName` and leave the options to the WebDriver server.
pub fn capabilities(browser: &str, headless: bool) -> Map<String, Value> {
    let browser = browser.trim().to_lowercase();
    let mut caps = Map::new();

    match browser.as_str() {
        "firefox" => {
            let args: Vec<&str> = if headless { vec!["--headless"] } else { vec![] };
            caps.insert("browserName".into(), json!("firefox"));
            caps.insert("moz:firefoxOptions".into(), json!({ "args": args }));
        }
        "chrome" | "chromium" => {
            let mut args = vec!["--no-sandbox"];
            if headless {
                args.push("--headless=new");
                args.push("--disable-gpu");
                args.push("--disable-dev-shm-usage");
            }
            caps.insert("browserName".into(), json!("chrome"));
            caps.insert("goog:chromeOptions".into(), json!({ "args": args }));
        }
        "edge" | "msedge" => {
            let args: Vec<&str> = if headless { vec!["--headless=new"] } else { vec![] };
            caps.insert("browserName".into(), json!("MicrosoftEdge"));
            caps.insert("ms:edgeOptions".into(), json!({ "args": args }));
        }
        other => {
            caps.insert("browserName".into(), json!(other));
        }
    }

    caps
}

pub struct WebDriverClient {
    pub client: Client,
}

impl WebDriverClient {
    pub async fn connect(url: &str, capabilities: Map<String, Value>) -> Result<Self, DriverError> {
        debug!("Connecting to WebDriver at {}", url);
        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(url)
            .await
            .map_err(|e| {
                DriverError::Other(format!("Failed to connect to WebDriver at {}: {}", url, e))
            })?;

        Ok(Self { client })
    }

    pub async fn close(self) -> Result<(), DriverError> {
        self.client
            .close()
            .await
            .map_err(|e| DriverError::Other(format!("Failed to close session: {}", e)))
    }
}
