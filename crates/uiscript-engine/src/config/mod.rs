pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigLoader};
pub use schema::{
    DriverConfig, MacroConfig, PagesConfig, SessionConfig, TimingConfig, UiScriptConfig,
};
