use crate::descriptor::ParamKind;
use crate::token::TokenKind;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("Illegal character in '{fragment}': use double quotes for literal text")]
    IllegalCharacter { fragment: String },

    #[error("Unterminated literal: {literal}")]
    UnterminatedLiteral { literal: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unrecognized {
    pub fragment: String,
    pub suggestion: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("Unrecognized command(s): {}", render_unrecognized(.0))]
    UnrecognizedCommand(Vec<Unrecognized>),
}

impl ClassifyError {
    pub fn fragments(&self) -> Vec<&str> {
        match self {
            ClassifyError::UnrecognizedCommand(list) => {
                list.iter().map(|u| u.fragment.as_str()).collect()
            }
        }
    }
}

fn render_unrecognized(list: &[Unrecognized]) -> String {
    list.iter()
        .map(|u| match &u.suggestion {
            Some(s) => format!("'{}' (did you mean '{}'?)", u.fragment, s),
            None => format!("'{}'", u.fragment),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// One argument whose token category does not fit the declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentMismatch {
    /// 1-based argument position.
    pub position: usize,
    pub parameter: String,
    pub expected: ParamKind,
    pub found: TokenKind,
    pub lexeme: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Expected a command at position {position}, found {found} '{lexeme}'")]
    InvalidSequence {
        position: usize,
        found: TokenKind,
        lexeme: String,
    },

    #[error(
        "Missing argument '{parameter}' for '{command}': expected {expected} argument(s), found {found}"
    )]
    MissingArgument {
        command: String,
        parameter: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid arguments for '{command}': {}", render_mismatches(.mismatches))]
    InvalidArgumentType {
        command: String,
        mismatches: Vec<ArgumentMismatch>,
    },
}

fn render_mismatches(list: &[ArgumentMismatch]) -> String {
    list.iter()
        .map(|m| {
            format!(
                "#{} {} expects {}, found {} '{}'",
                m.position, m.parameter, m.expected, m.found, m.lexeme
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("I beg your pardon?")]
    Empty,

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Command '{0}' is already registered")]
    Duplicate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_message_lists_all() {
        let err = ClassifyError::UnrecognizedCommand(vec![
            Unrecognized {
                fragment: "foo".into(),
                suggestion: None,
            },
            Unrecognized {
                fragment: "clik".into(),
                suggestion: Some("click".into()),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Unrecognized command(s): 'foo', 'clik' (did you mean 'click'?)"
        );
        assert_eq!(err.fragments(), vec!["foo", "clik"]);
    }

    #[test]
    fn test_mismatch_message() {
        let err = ValidationError::InvalidArgumentType {
            command: "sleep".into(),
            mismatches: vec![ArgumentMismatch {
                position: 1,
                parameter: "seconds".into(),
                expected: ParamKind::Integer,
                found: TokenKind::Text,
                lexeme: "\"ten\"".into(),
            }],
        };
        assert_eq!(
            err.to_string(),
            "Invalid arguments for 'sleep': #1 seconds expects integer, found text '\"ten\"'"
        );
    }
}
