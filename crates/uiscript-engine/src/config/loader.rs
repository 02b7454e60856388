use super::schema::UiScriptConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./uiscript.yaml
    /// 2. ~/.uiscript/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<UiScriptConfig, ConfigError> {
        let local_config = PathBuf::from("./uiscript.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".uiscript").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(UiScriptConfig::default())
    }

    /// Load `path`. Page directories and the saved-session directory are
    /// resolved against the file's own directory, and a leading `~/` against
    /// the home directory, so a config file works from any working directory.
    pub async fn load_from(path: &Path) -> Result<UiScriptConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let mut config: UiScriptConfig = serde_yaml::from_str(&content)?;

        let base = path.parent().unwrap_or(Path::new(""));
        for dir in &mut config.pages.paths {
            *dir = resolve(base, dir);
        }
        config.session.saved_sessions_dir = resolve(base, &config.session.saved_sessions_dir);
        Ok(config)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let relative = path.strip_prefix(".").unwrap_or(path);
    base.join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_to_config_dir() {
        let base = Path::new("/srv/qa");
        assert_eq!(resolve(base, Path::new("./pages")), PathBuf::from("/srv/qa/pages"));
        assert_eq!(resolve(base, Path::new("shared/pages")), PathBuf::from("/srv/qa/shared/pages"));
        assert_eq!(resolve(base, Path::new("/opt/pages")), PathBuf::from("/opt/pages"));
        assert_eq!(resolve(Path::new(""), Path::new("./pages")), PathBuf::from("pages"));
    }

    #[test]
    fn test_resolve_home_prefix() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                resolve(Path::new("/srv/qa"), Path::new("~/pages")),
                home.join("pages")
            );
        }
    }
}
