use uiscript_common::error::{LexError, PipelineError, ValidationError};
use uiscript_common::{
    CommandCategory, CommandDescriptor, DynamicRegistry, ElementSpec, Locator, PageDescriptor,
    ParamKind, StaticRegistry, TokenKind,
};
use uiscript_parser::{process, Bindings, PipelineContext};

fn static_registry() -> StaticRegistry {
    let mut r = StaticRegistry::new();
    for d in [
        CommandDescriptor::new("click", CommandCategory::Portal)
            .required("element", ParamKind::Element),
        CommandDescriptor::new("fill", CommandCategory::Portal)
            .required("element", ParamKind::Element)
            .required("text", ParamKind::Text),
        CommandDescriptor::new("assert_visible", CommandCategory::Assertion)
            .required("element", ParamKind::Element)
            .optional("seconds", ParamKind::Integer, 5),
        CommandDescriptor::new("help", CommandCategory::General).keyword(
            "topic",
            &["all", "page", "portal"],
            "all",
        ),
    ] {
        r.register(d).unwrap();
    }
    r
}

fn page(name: &str, elements: &[&str]) -> PageDescriptor {
    let mut p = PageDescriptor::new(name, &format!("https://example.com/{}", name));
    for e in elements {
        p.elements.insert(
            e.to_string(),
            ElementSpec::Locator(Locator::parse(&format!("//*[@id='{}']", e))),
        );
    }
    p
}

struct Session {
    static_registry: StaticRegistry,
    dynamic_registry: DynamicRegistry,
    args: Bindings,
    temps: Bindings,
}

impl Session {
    fn on(page: &PageDescriptor) -> Self {
        Self {
            static_registry: static_registry(),
            dynamic_registry: DynamicRegistry::for_page(page),
            args: Bindings::from([("arg_0".to_string(), "alice".to_string())]),
            temps: Bindings::new(),
        }
    }

    fn process(&self, line: &str) -> Result<Vec<uiscript_parser::Invocation>, PipelineError> {
        let ctx = PipelineContext::new(
            &self.static_registry,
            &self.dynamic_registry,
            &self.args,
            &self.temps,
        );
        process(line, &ctx)
    }
}

#[test]
fn test_process_fill_with_session_argument() {
    let s = Session::on(&page("login", &["username"]));
    let invocations = s.process("fill username arg_0").unwrap();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].args[1].kind, TokenKind::SessionArgument);
    assert_eq!(invocations[0].args[1].text_value(), "alice");
}

#[test]
fn test_process_case_insensitive_commands_and_elements() {
    let s = Session::on(&page("home", &["search-button"]));
    let a = s.process("click search-button").unwrap();
    let b = s.process("CLICK Search-Button").unwrap();
    assert!(std::sync::Arc::ptr_eq(&a[0].descriptor, &b[0].descriptor));
    assert_eq!(
        a[0].args[0].element.as_ref().unwrap().name,
        b[0].args[0].element.as_ref().unwrap().name
    );
}

#[test]
fn test_process_help_keyword() {
    let s = Session::on(&page("home", &[]));
    let invocations = s.process("help portal").unwrap();
    assert_eq!(invocations[0].args[0].kind, TokenKind::Keyword);
    let invocations = s.process("help").unwrap();
    assert_eq!(invocations[0].args[0].text_value(), "all");
    assert!(invocations[0].args[0].synthetic);
}

#[test]
fn test_process_blank_and_comment_lines() {
    let s = Session::on(&page("home", &[]));
    assert_eq!(s.process("   ").unwrap_err(), PipelineError::Empty);
    assert!(s.process("# nothing to do").unwrap().is_empty());
}

#[test]
fn test_process_stage_errors() {
    let s = Session::on(&page("home", &["search-bar"]));
    assert!(matches!(
        s.process("fill search-bar 'x'"),
        Err(PipelineError::Lex(LexError::IllegalCharacter { .. }))
    ));
    assert!(matches!(
        s.process("fill search-bar \"x"),
        Err(PipelineError::Lex(LexError::UnterminatedLiteral { .. }))
    ));
    assert!(matches!(
        s.process("click nowhere"),
        Err(PipelineError::Classify(_))
    ));
    assert!(matches!(
        s.process("click"),
        Err(PipelineError::Validation(ValidationError::MissingArgument { .. }))
    ));
}

#[test]
fn test_validation_failure_rejects_whole_line() {
    let s = Session::on(&page("home", &["search-bar"]));
    let err = s
        .process("assert_visible search-bar fill search-bar")
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Validation(ValidationError::MissingArgument { ref command, .. }) if command == "fill"
    ));
}

#[test]
fn test_elements_do_not_leak_between_pages() {
    let mut s = Session::on(&page("a", &["only-on-a", "shared"]));
    assert!(s.process("click only-on-a").is_ok());

    s.dynamic_registry = DynamicRegistry::for_page(&page("b", &["shared"]));
    assert!(s.process("click shared").is_ok());
    let err = s.process("click only-on-a").unwrap_err();
    let PipelineError::Classify(classify) = err else {
        panic!("expected classification error");
    };
    assert_eq!(classify.fragments(), vec!["only-on-a"]);
}
