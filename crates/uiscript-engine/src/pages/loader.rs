use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use uiscript_common::PageDescriptor;

#[derive(Debug, Error)]
pub enum PageLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("Glob iteration error: {0}")]
    Glob(#[from] glob::GlobError),
    #[error("Invalid url_pattern for page '{page}': {source}")]
    Regex { page: String, source: regex::Error },
    #[error("Page '{0}' is defined more than once")]
    Duplicate(String),
}

pub struct PageLoader;

impl PageLoader {
    pub async fn load_file(path: &Path) -> Result<PageDescriptor, PageLoadError> {
        let content = tokio::fs::read_to_string(path).await?;
        serde_yaml::from_str(&content).map_err(|source| PageLoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load every `*.yaml` / `*.yml` file directly under `dir`, in path
    /// order. A missing directory yields no pages.
    pub async fn load_dir(dir: &Path) -> Result<Vec<PageDescriptor>, PageLoadError> {
        if !dir.is_dir() {
            warn!("Page directory {:?} does not exist", dir);
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for ext in ["yaml", "yml"] {
            let pattern = dir.join(format!("*.{}", ext));
            let pattern_str = pattern.to_str().ok_or(PageLoadError::Pattern(glob::PatternError {
                pos: 0,
                msg: "Invalid UTF-8 path",
            }))?;
            for entry in glob::glob(pattern_str)? {
                let path = entry?;
                if path.is_file() {
                    files.push(path);
                }
            }
        }
        files.sort();

        let mut pages = Vec::with_capacity(files.len());
        for path in files {
            debug!("Loading page descriptor {:?}", path);
            pages.push(Self::load_file(&path).await?);
        }
        Ok(pages)
    }
}
