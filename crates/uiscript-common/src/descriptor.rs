use crate::token::{Token, TokenKind, TokenValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category a command is registered under. Each category is dispatched
/// with its own set of collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandCategory {
    Assertion,
    General,
    Portal,
    Macro,
}

impl CommandCategory {
    pub const ALL: [CommandCategory; 4] = [
        CommandCategory::Assertion,
        CommandCategory::General,
        CommandCategory::Portal,
        CommandCategory::Macro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandCategory::Assertion => "assertion",
            CommandCategory::General => "general",
            CommandCategory::Portal => "portal",
            CommandCategory::Macro => "macro",
        }
    }
}

impl fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type family of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Text,
    Integer,
    Element,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamKind::Text => "text",
            ParamKind::Integer => "integer",
            ParamKind::Element => "element",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    /// Bare words accepted for this parameter without quoting.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl ParamSpec {
    /// Whether `token` may fill this parameter. A keyword is accepted only
    /// by a parameter that lists it.
    pub fn accepts(&self, token: &Token) -> bool {
        match token.kind {
            TokenKind::Keyword => {
                let word = token.text_value().to_lowercase();
                self.keywords.iter().any(|k| *k == word)
            }
            kind => kind.fits(self.kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionalParam {
    #[serde(flatten)]
    pub spec: ParamSpec,
    pub default: TokenValue,
}

/// Registered shape of one executable command.
///
/// Built once at registration and never mutated afterwards; the registry
/// hands out shared references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub name: String,
    pub category: CommandCategory,
    pub required: Vec<ParamSpec>,
    pub optional: Vec<OptionalParam>,
    /// Kind of the trailing variadic arguments, if any.
    pub variadic: Option<ParamKind>,
    #[serde(default)]
    pub summary: String,
}

impl CommandDescriptor {
    /// Names are stored lowercase; lookup is case-insensitive.
    pub fn new(name: &str, category: CommandCategory) -> Self {
        Self {
            name: name.to_lowercase(),
            category,
            required: Vec::new(),
            optional: Vec::new(),
            variadic: None,
            summary: String::new(),
        }
    }

    pub fn required(mut self, name: &str, kind: ParamKind) -> Self {
        self.required.push(ParamSpec {
            name: name.to_string(),
            kind,
            keywords: Vec::new(),
        });
        self
    }

    pub fn optional(mut self, name: &str, kind: ParamKind, default: impl Into<TokenValue>) -> Self {
        self.optional.push(OptionalParam {
            spec: ParamSpec {
                name: name.to_string(),
                kind,
                keywords: Vec::new(),
            },
            default: default.into(),
        });
        self
    }

    /// Optional text parameter that also accepts the given bare keywords.
    pub fn keyword(mut self, name: &str, keywords: &[&str], default: &str) -> Self {
        self.optional.push(OptionalParam {
            spec: ParamSpec {
                name: name.to_string(),
                kind: ParamKind::Text,
                keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            },
            default: TokenValue::Text(default.to_string()),
        });
        self
    }

    pub fn variadic(mut self, kind: ParamKind) -> Self {
        self.variadic = Some(kind);
        self
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    /// Number of argument tokens a complete invocation consumes,
    /// not counting a variadic tail.
    pub fn arity(&self) -> usize {
        self.required.len() + self.optional.len()
    }

    pub fn params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.required
            .iter()
            .chain(self.optional.iter().map(|o| &o.spec))
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.params()
            .flat_map(|p| p.keywords.iter().map(String::as_str))
    }

    /// One-line usage string, e.g. `fill <element> <text> [seconds=5]`.
    pub fn usage(&self) -> String {
        let mut parts = vec![self.name.clone()];
        for p in &self.required {
            parts.push(format!("<{}:{}>", p.name, p.kind));
        }
        for o in &self.optional {
            parts.push(format!("[{}={}]", o.spec.name, o.default));
        }
        if let Some(kind) = self.variadic {
            parts.push(format!("[{}...]", kind));
        }
        parts.join(" ")
    }
}
