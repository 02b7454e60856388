use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// How an element is located in the document.
///
/// Page files write locators as plain strings. XPath is the default
/// strategy; `css=` and `id=` prefixes select the others.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    XPath(String),
    Css(String),
    Id(String),
}

impl Locator {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(css) = raw.strip_prefix("css=") {
            Locator::Css(css.to_string())
        } else if let Some(id) = raw.strip_prefix("id=") {
            Locator::Id(id.to_string())
        } else if let Some(xpath) = raw.strip_prefix("xpath=") {
            Locator::XPath(xpath.to_string())
        } else {
            Locator::XPath(raw.to_string())
        }
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            Locator::XPath(_) => "xpath",
            Locator::Css(_) => "css",
            Locator::Id(_) => "id",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Locator::XPath(v) | Locator::Css(v) | Locator::Id(v) => v,
        }
    }

    /// Builds a locator for descendants of `self` matching `relative`.
    ///
    /// Only XPath parents can be chained; a relative XPath (`./...` or
    /// `.//...`) is appended to the parent path, anything else is
    /// returned unchanged.
    pub fn descend(&self, relative: &Locator) -> Locator {
        match (self, relative) {
            (Locator::XPath(parent), Locator::XPath(child)) if child.starts_with('.') => {
                Locator::XPath(format!("{}{}", parent, &child[1..]))
            }
            _ => relative.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::XPath(v) => write!(f, "{}", v),
            Locator::Css(v) => write!(f, "css={}", v),
            Locator::Id(v) => write!(f, "id={}", v),
        }
    }
}

impl From<&str> for Locator {
    fn from(raw: &str) -> Self {
        Locator::parse(raw)
    }
}

impl Serialize for Locator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Locator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Locator::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strategies() {
        assert_eq!(
            Locator::parse("//input[@id='q']"),
            Locator::XPath("//input[@id='q']".into())
        );
        assert_eq!(Locator::parse("css=#q"), Locator::Css("#q".into()));
        assert_eq!(Locator::parse("id=q"), Locator::Id("q".into()));
        assert_eq!(Locator::parse("xpath=//a"), Locator::XPath("//a".into()));
    }

    #[test]
    fn test_display_round_trips() {
        for raw in ["//div", "css=.menu > li", "id=search"] {
            assert_eq!(Locator::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn test_descend_relative_xpath() {
        let parent = Locator::parse("//select[@id='cat']");
        let items = parent.descend(&Locator::parse(".//option"));
        assert_eq!(items, Locator::XPath("//select[@id='cat']//option".into()));

        let absolute = parent.descend(&Locator::parse("css=li.item"));
        assert_eq!(absolute, Locator::Css("li.item".into()));
    }
}
