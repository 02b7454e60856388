use std::sync::Arc;
use uiscript_common::error::{ArgumentMismatch, ValidationError};
use uiscript_common::{CommandCategory, CommandDescriptor, Token, TokenKind};

/// A command token together with the exact argument tokens it consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub descriptor: Arc<CommandDescriptor>,
    pub command: Token,
    pub args: Vec<Token>,
}

impl Invocation {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn category(&self) -> CommandCategory {
        self.descriptor.category
    }

    pub fn arg(&self, index: usize) -> Option<&Token> {
        self.args.get(index)
    }

    /// First argument that refers to a page or windowed element.
    pub fn first_element(&self) -> Option<&Token> {
        self.args
            .iter()
            .find(|t| matches!(t.kind, TokenKind::PageElement | TokenKind::WindowedElement))
    }

    /// The invocation as the user would retype it, defaults included.
    pub fn to_line(&self) -> String {
        std::iter::once(self.command.lexeme.clone())
            .chain(self.args.iter().map(|t| match t.kind {
                TokenKind::Text if t.synthetic => t.value.to_string(),
                TokenKind::Text => t.lexeme.clone(),
                TokenKind::Integer => t.value.to_string(),
                _ if t.synthetic => t.value.to_string(),
                _ => t.lexeme.clone(),
            }))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Group a flat token stream into invocations.
///
/// Each command greedily takes as many following tokens as it declares
/// parameters, plus any non-command tokens for a variadic tail. Type
/// mismatches within one invocation are collected together.
pub fn validate(tokens: Vec<Token>) -> Result<Vec<Invocation>, ValidationError> {
    let mut stream = tokens.into_iter().enumerate().peekable();
    let mut invocations = Vec::new();

    while let Some((index, command)) = stream.next() {
        let Some(descriptor) = command.command.clone().filter(|_| command.is_command()) else {
            return Err(ValidationError::InvalidSequence {
                position: index + 1,
                found: command.kind,
                lexeme: command.lexeme,
            });
        };

        let mut args = Vec::with_capacity(descriptor.arity());
        for param in descriptor.params() {
            match stream.next() {
                Some((_, token)) => args.push(token),
                None => {
                    return Err(ValidationError::MissingArgument {
                        command: descriptor.name.clone(),
                        parameter: param.name.clone(),
                        expected: descriptor.arity(),
                        found: args.len(),
                    })
                }
            }
        }

        let mut mismatches: Vec<ArgumentMismatch> = descriptor
            .params()
            .zip(&args)
            .enumerate()
            .filter(|(_, (param, token))| !param.accepts(token))
            .map(|(i, (param, token))| ArgumentMismatch {
                position: i + 1,
                parameter: param.name.clone(),
                expected: param.kind,
                found: token.kind,
                lexeme: token.lexeme.clone(),
            })
            .collect();

        if let Some(kind) = descriptor.variadic {
            while let Some((_, token)) = stream.next_if(|(_, t)| !t.is_command()) {
                if !token.kind.fits(kind) {
                    mismatches.push(ArgumentMismatch {
                        position: args.len() + 1,
                        parameter: format!("{}...", kind),
                        expected: kind,
                        found: token.kind,
                        lexeme: token.lexeme.clone(),
                    });
                }
                args.push(token);
            }
        }

        if !mismatches.is_empty() {
            return Err(ValidationError::InvalidArgumentType {
                command: descriptor.name.clone(),
                mismatches,
            });
        }

        invocations.push(Invocation {
            descriptor,
            command,
            args,
        });
    }

    Ok(invocations)
}
