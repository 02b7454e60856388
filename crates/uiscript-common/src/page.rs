use crate::locator::Locator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared kind of an element, consulted by item-selection commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    #[default]
    Plain,
    /// Native `<select>` or a widget whose items open on click.
    Dropdown,
    /// Always-visible list of clickable items.
    List,
    /// Items appear in an overlay after clicking the element.
    Menu,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementSpec {
    Locator(Locator),
    Detailed {
        locator: Locator,
        #[serde(default)]
        kind: ElementKind,
        #[serde(default)]
        items: Option<Locator>,
    },
}

impl ElementSpec {
    pub fn locator(&self) -> &Locator {
        match self {
            ElementSpec::Locator(l) => l,
            ElementSpec::Detailed { locator, .. } => locator,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            ElementSpec::Locator(_) => ElementKind::Plain,
            ElementSpec::Detailed { kind, .. } => *kind,
        }
    }

    pub fn items(&self) -> Option<&Locator> {
        match self {
            ElementSpec::Locator(_) => None,
            ElementSpec::Detailed { items, .. } => items.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitMethod {
    #[default]
    Visible,
    Clickable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitSpec {
    pub element: Locator,
    #[serde(default)]
    pub method: WaitMethod,
}

/// Elements that only exist once `marker` is present, e.g. an open menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeDescriptor {
    pub marker: Locator,
    #[serde(default)]
    pub elements: BTreeMap<String, ElementSpec>,
    /// Extra element sets keyed by the marker's visible text.
    #[serde(default)]
    pub by_text: BTreeMap<String, BTreeMap<String, ElementSpec>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDescriptor {
    pub name: String,
    /// URL (or trailing path) identifying the page.
    pub id: String,
    #[serde(default)]
    pub url_pattern: Option<String>,
    #[serde(default)]
    pub wait: Option<WaitSpec>,
    #[serde(default)]
    pub elements: BTreeMap<String, ElementSpec>,
    /// Frame id to the names of the elements that live inside it.
    #[serde(default)]
    pub frames: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub windows: BTreeMap<String, BTreeMap<String, ElementSpec>>,
    #[serde(default)]
    pub probes: Vec<ProbeDescriptor>,
}

impl PageDescriptor {
    pub fn new(name: &str, id: &str) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
            url_pattern: None,
            wait: None,
            elements: BTreeMap::new(),
            frames: BTreeMap::new(),
            windows: BTreeMap::new(),
            probes: Vec::new(),
        }
    }

    /// Frame that must be active to reach `element`. Names compare
    /// case-insensitively.
    pub fn frame_of(&self, element: &str) -> Option<&str> {
        self.frames.iter().find_map(|(frame, members)| {
            members
                .iter()
                .any(|m| m.eq_ignore_ascii_case(element))
                .then_some(frame.as_str())
        })
    }

    /// Page elements plus every window's elements, as the page exposes
    /// them before any probing.
    pub fn static_elements(&self) -> impl Iterator<Item = (&String, &ElementSpec)> {
        self.elements
            .iter()
            .chain(self.windows.values().flat_map(|w| w.iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
name: search-home
id: "https://www.example.com/"
wait: { element: "//input[@id='q']", method: clickable }
elements:
  search-bar: "//input[@id='q']"
  category: { locator: "css=select#cat", kind: dropdown, items: ".//option" }
frames:
  results-frame: [Result-Link]
windows:
  settings-dialog:
    ok-button: "//button[.='OK']"
probes:
  - marker: "//div[@class='menu open']"
    elements: { menu-copy: "//li[.='Copy']" }
"#;

    #[test]
    fn test_deserialize_page() {
        let page: PageDescriptor = serde_yaml::from_str(PAGE).unwrap();
        assert_eq!(page.name, "search-home");
        assert_eq!(page.wait.as_ref().unwrap().method, WaitMethod::Clickable);
        let category = &page.elements["category"];
        assert_eq!(category.kind(), ElementKind::Dropdown);
        assert_eq!(category.locator(), &Locator::Css("select#cat".into()));
        assert_eq!(category.items(), Some(&Locator::XPath(".//option".into())));
        assert_eq!(page.elements["search-bar"].kind(), ElementKind::Plain);
        assert_eq!(page.probes.len(), 1);
    }

    #[test]
    fn test_frame_of_is_case_insensitive() {
        let page: PageDescriptor = serde_yaml::from_str(PAGE).unwrap();
        assert_eq!(page.frame_of("result-link"), Some("results-frame"));
        assert_eq!(page.frame_of("search-bar"), None);
    }

    #[test]
    fn test_static_elements_include_windows() {
        let page: PageDescriptor = serde_yaml::from_str(PAGE).unwrap();
        let names: Vec<_> = page.static_elements().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["category", "search-bar", "ok-button"]);
    }
}
