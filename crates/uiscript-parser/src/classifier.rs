use crate::context::PipelineContext;
use crate::lexer::Fragment;
use uiscript_common::error::{ClassifyError, Unrecognized};
use uiscript_common::registry::{self, Resolved};
use uiscript_common::Token;

const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Turn lexed fragments into typed tokens.
///
/// Every fragment is tried before failing so that all unknown words are
/// reported at once. A comment ends the line.
pub fn classify(fragments: &[Fragment], ctx: &PipelineContext) -> Result<Vec<Token>, ClassifyError> {
    let mut tokens = Vec::with_capacity(fragments.len());
    let mut unrecognized = Vec::new();

    for fragment in fragments {
        match fragment {
            Fragment::Comment(_) => break,
            Fragment::Quoted(text) => tokens.push(Token::text(&format!("\"{}\"", text), text)),
            Fragment::Integer(n) => tokens.push(Token::integer(*n)),
            Fragment::Word(word) => match classify_word(word, ctx) {
                Some(token) => tokens.push(token),
                None => unrecognized.push(Unrecognized {
                    fragment: word.clone(),
                    suggestion: suggest(word, ctx),
                }),
            },
        }
    }

    if unrecognized.is_empty() {
        Ok(tokens)
    } else {
        Err(ClassifyError::UnrecognizedCommand(unrecognized))
    }
}

fn classify_word(word: &str, ctx: &PipelineContext) -> Option<Token> {
    if let Some(value) = ctx.session_args.get(word) {
        return Some(Token::session_argument(word, value));
    }
    if let Some(value) = ctx.temp_vars.get(word) {
        return Some(Token::temp_variable(word, value));
    }
    match registry::resolve(ctx.static_registry, ctx.dynamic_registry, word)? {
        Resolved::Command(descriptor) => Some(Token::command(word, descriptor)),
        Resolved::Element(kind, entry) => Some(Token::element(word, kind, entry)),
        Resolved::Keyword => Some(Token::keyword(word)),
    }
}

fn suggest(word: &str, ctx: &PipelineContext) -> Option<String> {
    let lowered = word.to_lowercase();
    ctx.static_registry
        .names()
        .chain(ctx.dynamic_registry.names())
        .map(|name| (name, strsim::jaro_winkler(&lowered, &name.to_lowercase())))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name.to_string())
}
