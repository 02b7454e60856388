use crate::descriptor::{CommandCategory, CommandDescriptor, ParamKind};
use crate::registry::ElementEntry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Integer(i64),
    Text(String),
}

impl TokenValue {
    pub fn as_text(&self) -> String {
        match self {
            TokenValue::Integer(n) => n.to_string(),
            TokenValue::Text(s) => s.clone(),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TokenValue::Integer(n) => Some(*n),
            TokenValue::Text(_) => None,
        }
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Integer(n) => write!(f, "{}", n),
            TokenValue::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<i64> for TokenValue {
    fn from(n: i64) -> Self {
        TokenValue::Integer(n)
    }
}

impl From<i32> for TokenValue {
    fn from(n: i32) -> Self {
        TokenValue::Integer(n as i64)
    }
}

impl From<&str> for TokenValue {
    fn from(s: &str) -> Self {
        TokenValue::Text(s.to_string())
    }
}

impl From<String> for TokenValue {
    fn from(s: String) -> Self {
        TokenValue::Text(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Text,
    Integer,
    PageElement,
    WindowedElement,
    SessionArgument,
    TempVariable,
    Keyword,
    Command(CommandCategory),
}

impl TokenKind {
    pub fn is_command(&self) -> bool {
        matches!(self, TokenKind::Command(_))
    }

    /// Parameter type families this token may fill. Keywords fit only the
    /// parameters that declare them; see [`ParamSpec::accepts`].
    ///
    /// [`ParamSpec::accepts`]: crate::descriptor::ParamSpec::accepts
    pub fn fits(&self, kind: ParamKind) -> bool {
        match kind {
            ParamKind::Text => matches!(
                self,
                TokenKind::Text | TokenKind::SessionArgument | TokenKind::TempVariable
            ),
            ParamKind::Integer => matches!(self, TokenKind::Integer),
            ParamKind::Element => {
                matches!(self, TokenKind::PageElement | TokenKind::WindowedElement)
            }
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Text => f.write_str("text"),
            TokenKind::Integer => f.write_str("integer"),
            TokenKind::PageElement => f.write_str("page element"),
            TokenKind::WindowedElement => f.write_str("windowed element"),
            TokenKind::SessionArgument => f.write_str("session argument"),
            TokenKind::TempVariable => f.write_str("temporary variable"),
            TokenKind::Keyword => f.write_str("keyword"),
            TokenKind::Command(c) => write!(f, "{} command", c),
        }
    }
}

/// A classified unit of one input line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    /// Fragment as typed, or the parameter name for synthesized defaults.
    pub lexeme: String,
    pub command: Option<Arc<CommandDescriptor>>,
    pub element: Option<Arc<ElementEntry>>,
    pub synthetic: bool,
}

impl Token {
    fn plain(kind: TokenKind, value: TokenValue, lexeme: &str) -> Self {
        Self {
            kind,
            value,
            lexeme: lexeme.to_string(),
            command: None,
            element: None,
            synthetic: false,
        }
    }

    pub fn text(lexeme: &str, value: &str) -> Self {
        Self::plain(TokenKind::Text, TokenValue::Text(value.to_string()), lexeme)
    }

    pub fn integer(n: i64) -> Self {
        Self::plain(TokenKind::Integer, TokenValue::Integer(n), &n.to_string())
    }

    pub fn session_argument(name: &str, value: &str) -> Self {
        Self::plain(
            TokenKind::SessionArgument,
            TokenValue::Text(value.to_string()),
            name,
        )
    }

    pub fn temp_variable(name: &str, value: &str) -> Self {
        Self::plain(
            TokenKind::TempVariable,
            TokenValue::Text(value.to_string()),
            name,
        )
    }

    pub fn keyword(lexeme: &str) -> Self {
        Self::plain(
            TokenKind::Keyword,
            TokenValue::Text(lexeme.to_lowercase()),
            lexeme,
        )
    }

    pub fn command(lexeme: &str, descriptor: Arc<CommandDescriptor>) -> Self {
        Self {
            kind: TokenKind::Command(descriptor.category),
            value: TokenValue::Text(descriptor.name.clone()),
            lexeme: lexeme.to_string(),
            command: Some(descriptor),
            element: None,
            synthetic: false,
        }
    }

    pub fn element(lexeme: &str, kind: TokenKind, entry: Arc<ElementEntry>) -> Self {
        Self {
            kind,
            value: TokenValue::Text(entry.name.clone()),
            lexeme: lexeme.to_string(),
            command: None,
            element: Some(entry),
            synthetic: false,
        }
    }

    pub fn is_command(&self) -> bool {
        self.kind.is_command()
    }

    pub fn text_value(&self) -> String {
        self.value.as_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatibility_table() {
        for kind in [
            TokenKind::Text,
            TokenKind::SessionArgument,
            TokenKind::TempVariable,
        ] {
            assert!(kind.fits(ParamKind::Text));
            assert!(!kind.fits(ParamKind::Integer));
            assert!(!kind.fits(ParamKind::Element));
        }
        assert!(TokenKind::Integer.fits(ParamKind::Integer));
        assert!(!TokenKind::Integer.fits(ParamKind::Text));
        assert!(TokenKind::PageElement.fits(ParamKind::Element));
        assert!(TokenKind::WindowedElement.fits(ParamKind::Element));
        assert!(!TokenKind::Command(CommandCategory::Portal).fits(ParamKind::Text));
        assert!(!TokenKind::Keyword.fits(ParamKind::Text));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(TokenValue::from(5).to_string(), "5");
        assert_eq!(TokenValue::from("a b").to_string(), "\"a b\"");
    }
}
