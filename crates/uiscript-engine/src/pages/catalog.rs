use super::loader::{PageLoadError, PageLoader};
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;
use uiscript_common::PageDescriptor;

struct CatalogEntry {
    page: Arc<PageDescriptor>,
    pattern: Option<Regex>,
}

/// All known page descriptors, matched against the browser's current URL.
#[derive(Default)]
pub struct PageCatalog {
    entries: Vec<CatalogEntry>,
}

impl PageCatalog {
    pub fn new(pages: Vec<PageDescriptor>) -> Result<Self, PageLoadError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(pages.len());
        for page in pages {
            if !seen.insert(page.name.to_lowercase()) {
                return Err(PageLoadError::Duplicate(page.name));
            }
            let pattern = page
                .url_pattern
                .as_deref()
                .map(Regex::new)
                .transpose()
                .map_err(|source| PageLoadError::Regex {
                    page: page.name.clone(),
                    source,
                })?;
            entries.push(CatalogEntry {
                page: Arc::new(page),
                pattern,
            });
        }
        Ok(Self { entries })
    }

    pub async fn load(paths: &[PathBuf]) -> Result<Self, PageLoadError> {
        let mut pages = Vec::new();
        for path in paths {
            pages.extend(PageLoader::load_dir(path).await?);
        }
        Self::new(pages)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the page for `url`. Rules are tried in order, each against
    /// every page, so a stricter rule on a later page beats a looser rule
    /// on an earlier one:
    ///
    /// 1. `url_pattern` regex
    /// 2. exact id
    /// 3. id equals the URL without its query
    /// 4. id equals the URL without its fragment
    /// 5. id equals the last path segment
    /// 6. id is a trailing suffix of the path
    pub fn identify(&self, url: &str) -> Option<Arc<PageDescriptor>> {
        let parsed = Url::parse(url).ok();

        let by_pattern = |e: &CatalogEntry| e.pattern.as_ref().is_some_and(|p| p.is_match(url));
        let exact = |e: &CatalogEntry| e.page.id == url;
        let without_query = |e: &CatalogEntry| {
            parsed.as_ref().is_some_and(|u| {
                let mut u = u.clone();
                u.set_query(None);
                e.page.id == u.as_str()
            })
        };
        let without_fragment = |e: &CatalogEntry| {
            parsed.as_ref().is_some_and(|u| {
                let mut u = u.clone();
                u.set_fragment(None);
                e.page.id == u.as_str()
            })
        };
        let last_segment = |e: &CatalogEntry| {
            let id = e.page.id.trim_matches('/');
            !id.is_empty()
                && parsed
                    .as_ref()
                    .and_then(|u| u.path_segments())
                    .and_then(|s| s.filter(|seg| !seg.is_empty()).last())
                    .is_some_and(|seg| seg == id)
        };
        let path_suffix = |e: &CatalogEntry| {
            let id = e.page.id.trim_end_matches('/');
            id.starts_with('/')
                && id.len() > 1
                && parsed
                    .as_ref()
                    .is_some_and(|u| u.path().trim_end_matches('/').ends_with(id))
        };

        let rules: [&dyn Fn(&CatalogEntry) -> bool; 6] = [
            &by_pattern,
            &exact,
            &without_query,
            &without_fragment,
            &last_segment,
            &path_suffix,
        ];
        rules.iter().find_map(|rule| {
            self.entries
                .iter()
                .find(|e| rule(e))
                .map(|e| Arc::clone(&e.page))
        })
    }
}
