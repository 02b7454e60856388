use crate::descriptor::{CommandCategory, CommandDescriptor};
use crate::error::RegistryError;
use crate::page::{ElementSpec, PageDescriptor};
use crate::token::TokenKind;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A named element the current page exposes as a bare word.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementEntry {
    pub name: String,
    pub spec: ElementSpec,
}

/// What a bare word resolves to.
#[derive(Debug, Clone)]
pub enum Resolved {
    Command(Arc<CommandDescriptor>),
    Element(TokenKind, Arc<ElementEntry>),
    Keyword,
}

/// Commands known for the whole session, keyed per category by
/// lowercase name.
#[derive(Debug, Default, Clone)]
pub struct StaticRegistry {
    tables: HashMap<CommandCategory, HashMap<String, Arc<CommandDescriptor>>>,
    keywords: BTreeSet<String>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Names must be unique across all categories.
    pub fn register(
        &mut self,
        descriptor: CommandDescriptor,
    ) -> Result<Arc<CommandDescriptor>, RegistryError> {
        if self.lookup(&descriptor.name).is_some() {
            return Err(RegistryError::Duplicate(descriptor.name));
        }
        for keyword in descriptor.keywords() {
            self.keywords.insert(keyword.to_string());
        }
        let descriptor = Arc::new(descriptor);
        self.tables
            .entry(descriptor.category)
            .or_default()
            .insert(descriptor.name.clone(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Case-insensitive lookup across categories.
    pub fn lookup(&self, name: &str) -> Option<&Arc<CommandDescriptor>> {
        let key = name.to_lowercase();
        CommandCategory::ALL
            .iter()
            .find_map(|c| self.tables.get(c).and_then(|t| t.get(&key)))
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(&word.to_lowercase())
    }

    /// Descriptors of one category, sorted by name.
    pub fn list(&self, category: CommandCategory) -> Vec<&Arc<CommandDescriptor>> {
        let mut list: Vec<_> = self
            .tables
            .get(&category)
            .map(|t| t.values().collect())
            .unwrap_or_default();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables
            .values()
            .flat_map(|t| t.keys().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Elements reachable on the active page. Rebuilt from scratch on every
/// page or overlay change and swapped in whole.
#[derive(Debug, Default, Clone)]
pub struct DynamicRegistry {
    page: Option<String>,
    page_elements: HashMap<String, Arc<ElementEntry>>,
    windowed: HashMap<String, Arc<ElementEntry>>,
}

impl DynamicRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Page elements plus all declared windows of `page`. Probe results
    /// are added separately with [`DynamicRegistry::add_windowed`].
    pub fn for_page(page: &PageDescriptor) -> Self {
        let mut registry = Self {
            page: Some(page.name.clone()),
            ..Self::default()
        };
        for (name, spec) in page.static_elements() {
            registry
                .page_elements
                .insert(name.to_lowercase(), Self::entry(name, spec));
        }
        registry
    }

    pub fn add_windowed(&mut self, name: &str, spec: &ElementSpec) {
        self.windowed
            .insert(name.to_lowercase(), Self::entry(name, spec));
    }

    fn entry(name: &str, spec: &ElementSpec) -> Arc<ElementEntry> {
        Arc::new(ElementEntry {
            name: name.to_string(),
            spec: spec.clone(),
        })
    }

    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }

    pub fn lookup(&self, name: &str) -> Option<(TokenKind, &Arc<ElementEntry>)> {
        let key = name.to_lowercase();
        if let Some(entry) = self.page_elements.get(&key) {
            return Some((TokenKind::PageElement, entry));
        }
        self.windowed
            .get(&key)
            .map(|entry| (TokenKind::WindowedElement, entry))
    }

    pub fn page_elements(&self) -> Vec<&str> {
        Self::sorted_names(&self.page_elements)
    }

    pub fn windowed_elements(&self) -> Vec<&str> {
        Self::sorted_names(&self.windowed)
    }

    fn sorted_names(table: &HashMap<String, Arc<ElementEntry>>) -> Vec<&str> {
        let mut names: Vec<_> = table.values().map(|e| e.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.page_elements
            .values()
            .chain(self.windowed.values())
            .map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.page_elements.len() + self.windowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve a bare word: commands first, then page and windowed elements,
/// then argument keywords.
pub fn resolve(static_: &StaticRegistry, dynamic: &DynamicRegistry, word: &str) -> Option<Resolved> {
    if let Some(descriptor) = static_.lookup(word) {
        return Some(Resolved::Command(Arc::clone(descriptor)));
    }
    if let Some((kind, entry)) = dynamic.lookup(word) {
        return Some(Resolved::Element(kind, Arc::clone(entry)));
    }
    static_.is_keyword(word).then_some(Resolved::Keyword)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ParamKind;
    use crate::locator::Locator;

    fn registry() -> StaticRegistry {
        let mut r = StaticRegistry::new();
        r.register(
            CommandDescriptor::new("click", CommandCategory::Portal)
                .required("element", ParamKind::Element),
        )
        .unwrap();
        r.register(
            CommandDescriptor::new("help", CommandCategory::General).keyword(
                "topic",
                &["all", "page"],
                "all",
            ),
        )
        .unwrap();
        r
    }

    fn page(name: &str, elements: &[&str]) -> PageDescriptor {
        let mut p = PageDescriptor::new(name, name);
        for e in elements {
            p.elements.insert(
                e.to_string(),
                ElementSpec::Locator(Locator::parse(&format!("//*[@id='{}']", e))),
            );
        }
        p
    }

    #[test]
    fn test_lookup_case_insensitive() {
        let r = registry();
        let lower = r.lookup("click").unwrap();
        let mixed = r.lookup("Click").unwrap();
        assert!(Arc::ptr_eq(lower, mixed));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut r = registry();
        let err = r
            .register(CommandDescriptor::new("CLICK", CommandCategory::Assertion))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(name) if name == "click"));
    }

    #[test]
    fn test_dynamic_for_page_replaces() {
        let a = DynamicRegistry::for_page(&page("a", &["only-on-a", "shared"]));
        assert!(a.lookup("ONLY-ON-A").is_some());

        let b = DynamicRegistry::for_page(&page("b", &["shared"]));
        assert!(b.lookup("only-on-a").is_none());
        assert!(b.lookup("shared").is_some());
        assert_eq!(b.page(), Some("b"));
    }

    #[test]
    fn test_resolve_order() {
        let r = registry();
        let mut d = DynamicRegistry::for_page(&page("p", &["search-bar"]));
        d.add_windowed("menu-copy", &ElementSpec::Locator(Locator::parse("//li")));

        assert!(matches!(resolve(&r, &d, "CLICK"), Some(Resolved::Command(_))));
        assert!(matches!(
            resolve(&r, &d, "search-bar"),
            Some(Resolved::Element(TokenKind::PageElement, _))
        ));
        assert!(matches!(
            resolve(&r, &d, "menu-copy"),
            Some(Resolved::Element(TokenKind::WindowedElement, _))
        ));
        assert!(matches!(resolve(&r, &d, "page"), Some(Resolved::Keyword)));
        assert!(resolve(&r, &d, "nothing").is_none());
    }
}
