use crate::context::PipelineContext;
use uiscript_common::{OptionalParam, ParamKind, Token, TokenKind};

/// Insert default-valued tokens for omitted optional arguments.
///
/// The tokens between a command and the next command (or the end of the
/// line) are that command's observed arguments. When at least every
/// required argument is present but some optional ones are not, the
/// missing defaults are appended after the observed arguments in declared
/// order. Calls short of required arguments are left untouched.
pub fn fill_defaults(tokens: Vec<Token>, ctx: &PipelineContext) -> Vec<Token> {
    let boundaries: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_command())
        .map(|(i, _)| i)
        .collect();

    let mut out = Vec::with_capacity(tokens.len());
    let mut pending: Option<&[OptionalParam]> = None;
    let mut next_boundary = boundaries.iter().peekable();

    for (i, token) in tokens.iter().enumerate() {
        if next_boundary.peek() == Some(&&i) {
            next_boundary.next();
            if let Some(missing) = pending.take() {
                out.extend(missing.iter().map(|p| synthesize(p, ctx)));
            }
            let end = next_boundary.peek().map_or(tokens.len(), |&&j| j);
            pending = token
                .command
                .as_deref()
                .and_then(|d| missing_optionals(d, end - i - 1));
        }
        out.push(token.clone());
    }
    if let Some(missing) = pending {
        out.extend(missing.iter().map(|p| synthesize(p, ctx)));
    }
    out
}

fn missing_optionals(
    descriptor: &uiscript_common::CommandDescriptor,
    observed: usize,
) -> Option<&[OptionalParam]> {
    let required = descriptor.required.len();
    if observed < required || observed >= descriptor.arity() {
        return None;
    }
    Some(&descriptor.optional[observed - required..])
}

fn synthesize(param: &OptionalParam, ctx: &PipelineContext) -> Token {
    let mut token = match param.spec.kind {
        ParamKind::Text => Token::text(&param.spec.name, &param.default.as_text()),
        ParamKind::Integer => match param.default.as_integer() {
            Some(n) => Token::integer(n),
            None => Token::text(&param.spec.name, &param.default.as_text()),
        },
        ParamKind::Element => {
            let name = param.default.as_text();
            match ctx.dynamic_registry.lookup(&name) {
                Some((kind, entry)) => Token::element(&param.spec.name, kind, entry.clone()),
                None => {
                    let mut t = Token::text(&param.spec.name, &name);
                    t.kind = TokenKind::PageElement;
                    t
                }
            }
        }
    };
    token.lexeme = param.spec.name.clone();
    token.synthetic = true;
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::context::Bindings;
    use crate::lexer::lex;
    use uiscript_common::{
        CommandCategory, CommandDescriptor, DynamicRegistry, ElementSpec, Locator,
        PageDescriptor, StaticRegistry, TokenValue,
    };

    struct Fixture {
        static_registry: StaticRegistry,
        dynamic_registry: DynamicRegistry,
        empty: Bindings,
    }

    impl Fixture {
        fn new() -> Self {
            let mut static_registry = StaticRegistry::new();
            static_registry
                .register(
                    CommandDescriptor::new("assert_text", CommandCategory::Assertion)
                        .required("element", ParamKind::Element)
                        .required("text", ParamKind::Text)
                        .optional("seconds", ParamKind::Integer, 5),
                )
                .unwrap();
            static_registry
                .register(
                    CommandDescriptor::new("fill_unique", CommandCategory::Portal)
                        .required("element", ParamKind::Element)
                        .optional("prefix", ParamKind::Text, "")
                        .optional("variable", ParamKind::Text, ""),
                )
                .unwrap();
            static_registry
                .register(CommandDescriptor::new("back", CommandCategory::Portal))
                .unwrap();
            let mut page = PageDescriptor::new("home", "/");
            page.elements
                .insert("title".into(), ElementSpec::Locator(Locator::parse("//h1")));
            Self {
                static_registry,
                dynamic_registry: DynamicRegistry::for_page(&page),
                empty: Bindings::new(),
            }
        }

        fn run(&self, line: &str) -> Vec<Token> {
            let ctx = PipelineContext::new(
                &self.static_registry,
                &self.dynamic_registry,
                &self.empty,
                &self.empty,
            );
            let tokens = classify(&lex(line).unwrap(), &ctx).unwrap();
            fill_defaults(tokens, &ctx)
        }

        fn rerun(&self, tokens: Vec<Token>) -> Vec<Token> {
            let ctx = PipelineContext::new(
                &self.static_registry,
                &self.dynamic_registry,
                &self.empty,
                &self.empty,
            );
            fill_defaults(tokens, &ctx)
        }
    }

    #[test]
    fn test_appends_missing_default() {
        let f = Fixture::new();
        let tokens = f.run(r#"assert_text title "Welcome""#);
        assert_eq!(tokens.len(), 4);
        assert!(tokens[3].synthetic);
        assert_eq!(tokens[3].kind, TokenKind::Integer);
        assert_eq!(tokens[3].value, TokenValue::Integer(5));
        assert_eq!(tokens[3].lexeme, "seconds");
    }

    #[test]
    fn test_partial_optionals_keep_order() {
        let f = Fixture::new();
        let tokens = f.run(r#"fill_unique title "ORD-""#);
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[2].value, TokenValue::Text("ORD-".into()));
        assert!(!tokens[2].synthetic);
        assert_eq!(tokens[3].lexeme, "variable");
        assert!(tokens[3].synthetic);
    }

    #[test]
    fn test_defaults_inserted_before_next_command() {
        let f = Fixture::new();
        let tokens = f.run("fill_unique title back");
        let lexemes: Vec<_> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(
            lexemes,
            vec!["fill_unique", "title", "prefix", "variable", "back"]
        );
    }

    #[test]
    fn test_complete_call_is_unchanged() {
        let f = Fixture::new();
        let full = f.run(r#"assert_text title "Welcome" 10"#);
        assert!(full.iter().all(|t| !t.synthetic));
        assert_eq!(f.rerun(full.clone()), full);
    }

    #[test]
    fn test_idempotent_after_fill() {
        let f = Fixture::new();
        let once = f.run("fill_unique title");
        let twice = f.rerun(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_required_left_alone() {
        let f = Fixture::new();
        let tokens = f.run("assert_text title");
        assert_eq!(tokens.len(), 2);
    }
}
