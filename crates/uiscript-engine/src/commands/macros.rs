use crate::config::MacroConfig;
use std::collections::HashMap;
use uiscript_common::{CommandCategory, CommandDescriptor, ParamKind};

/// Deepest allowed chain of macros expanding other macros.
pub const MAX_MACRO_DEPTH: usize = 8;

/// A named sequence of command lines with `{param}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroDefinition {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<String>,
    pub summary: String,
}

impl MacroDefinition {
    pub fn from_config(name: &str, config: &MacroConfig) -> Self {
        Self {
            name: name.to_lowercase(),
            params: config.params.clone(),
            body: config.body.clone(),
            summary: config.summary.clone(),
        }
    }

    /// Every parameter is a required text argument.
    pub fn descriptor(&self) -> CommandDescriptor {
        self.params.iter().fold(
            CommandDescriptor::new(&self.name, CommandCategory::Macro).summary(&self.summary),
            |d, p| d.required(p, ParamKind::Text),
        )
    }

    /// Body lines with each `{param}` replaced by its quoted value.
    /// Substituted values are never scanned again.
    pub fn expand(&self, values: &[String]) -> Vec<String> {
        let bound: HashMap<&str, &str> = self
            .params
            .iter()
            .map(String::as_str)
            .zip(values.iter().map(String::as_str))
            .collect();
        self.body.iter().map(|line| substitute(line, &bound)).collect()
    }
}

fn substitute(line: &str, bound: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after
            .find('}')
            .and_then(|close| bound.get(&after[..close]).map(|v| (*v, close)));
        match value {
            Some((value, close)) => {
                out.push('"');
                out.push_str(value);
                out.push('"');
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
