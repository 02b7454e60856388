/// Failures reported by a browser driver.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    #[error("Element not found: {locator}")]
    ElementNotFound { locator: String },

    #[error("Element is stale (removed from DOM): {locator}")]
    ElementStale { locator: String },

    #[error("Element is not interactable: {reason}")]
    ElementNotInteractable { reason: String },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Frame switch failed: {0}")]
    Frame(String),

    #[error("Script execution error: {0}")]
    Script(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Driver not ready")]
    NotReady,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Other: {0}")]
    Other(String),
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::Serialization(err.to_string())
    }
}

impl DriverError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::ElementNotFound { .. })
    }
}
