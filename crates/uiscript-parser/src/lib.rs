pub mod classifier;
pub mod context;
pub mod defaults;
pub mod lexer;
pub mod validator;

pub use classifier::classify;
pub use context::{Bindings, PipelineContext};
pub use defaults::fill_defaults;
pub use lexer::{lex, Fragment};
pub use validator::{validate, Invocation};

use uiscript_common::error::PipelineError;

/// Run one input line through lexing, classification, default synthesis
/// and validation.
///
/// Nothing is dispatched here: either every invocation on the line is
/// returned or the first stage error is. A comment-only line yields no
/// invocations.
pub fn process(line: &str, ctx: &PipelineContext) -> Result<Vec<Invocation>, PipelineError> {
    if line.trim().is_empty() {
        return Err(PipelineError::Empty);
    }
    let fragments = lex(line)?;
    let tokens = classify(&fragments, ctx)?;
    let tokens = fill_defaults(tokens, ctx);
    Ok(validate(tokens)?)
}
