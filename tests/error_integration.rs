//! Integration tests for error reporting
//!
//! Compile errors must point at the template line the author wrote; render
//! errors must say what failed.

use ejs::{
    CompileError, CompileOptions, Compiler, Error, HelperSet, RenderError, RenderOptions, Renderer,
    Value,
};
use serde_json::json;

fn compile_err(source: &str) -> Error {
    Compiler::new(source, '<').unwrap().compile().unwrap_err()
}

fn render_err(source: &str, data: serde_json::Value) -> RenderError {
    Renderer::new(Compiler::new(source, '<').unwrap().compile().unwrap())
        .render(&Value::from(data), &HelperSet::new())
        .unwrap_err()
}

// ============================================================================
// Compile Error Lines
// ============================================================================

#[test]
fn test_error_line_without_absorption() {
    let err = compile_err("a\nb\n<%= ) %>");
    assert!(matches!(err, Error::Compile(CompileError { line: 3, .. })));
}

#[test]
fn test_error_line_after_absorbed_lines() {
    let err = compile_err("Hello\n<% if x { %>\n<%= 1 + %>\n<% } %>");
    assert_eq!(err.line(), Some(3));
}

#[test]
fn test_error_line_after_many_absorbed_lines() {
    let source = "<% let a = 1 %>\n<% let b = 2 %>\n<% let c = 3 %>\ntext\n<%= a + * b %>";
    assert_eq!(compile_err(source).line(), Some(5));
}

#[test]
fn test_unclosed_block_points_into_template() {
    let err = compile_err("<% if x { %>\nhello");
    assert_eq!(err.line(), Some(2));
}

#[test]
fn test_error_hidden_by_absorption_maps_to_tag_line() {
    // Absorbing the break puts `}` behind the line comment; the
    // unpreprocessed source compiles, so the preprocessed line is mapped back
    let source = "intro\n<% if a { // c %>\n<% } %>\nz\n";
    assert!(Compiler::new(source, '<')
        .unwrap()
        .with_options(CompileOptions::new().with_trim_code_lines(false))
        .compile()
        .is_ok());
    assert_eq!(compile_err(source).line(), Some(2));
}

#[test]
fn test_error_at_end_of_input_lands_on_content() {
    let err = compile_err("<% if a { // c %>\n<% } %>\nz\n");
    assert_eq!(err.line(), Some(1));
}

#[test]
fn test_error_line_is_clamped_to_source() {
    let err = compile_err("<% while (true) { %>");
    assert_eq!(err.line(), Some(1));
}

#[test]
fn test_break_outside_loop_is_compile_error() {
    let err = compile_err("ok\n<% break %>");
    assert_eq!(err.line(), Some(2));
}

#[test]
fn test_deep_nesting_is_compile_error() {
    let depth = 10_000;
    let source = format!("<%= {}1{} %>", "(".repeat(depth), ")".repeat(depth));
    let err = compile_err(&source);
    assert!(matches!(err, Error::Compile(_)), "{:?}", err);
    assert_eq!(err.line(), Some(1));
}

#[test]
fn test_nesting_within_limit_renders() {
    let source = format!("<%= {}1{} %>", "(".repeat(100), ")".repeat(100));
    let template = Compiler::new(source, '<').unwrap().compile().unwrap();
    assert_eq!(template.render(&Value::Nil, &HelperSet::new()).unwrap(), "1");
}

#[test]
fn test_compile_error_display() {
    let err = compile_err("<%= ) %>");
    let text = err.to_string();
    assert!(text.starts_with("Compile error at line 1: "), "{}", text);
}

// ============================================================================
// Render Errors
// ============================================================================

#[test]
fn test_undefined_variable() {
    let err = render_err("<%= nope %>", json!({}));
    assert_eq!(err, RenderError::Undefined("nope".into()));
    assert_eq!(err.to_string(), "'nope' is not defined");
}

#[test]
fn test_division_by_zero() {
    assert_eq!(render_err("<%= 1 / 0 %>", json!({})), RenderError::DivisionByZero);
    assert_eq!(render_err("<%= n % 0 %>", json!({ "n": 4 })), RenderError::DivisionByZero);
}

#[test]
fn test_calling_data_is_not_callable() {
    let err = render_err("<%= title() %>", json!({ "title": "x" }));
    assert_eq!(err, RenderError::NotCallable("title".into()));
}

#[test]
fn test_function_helper_used_as_value() {
    let err = render_err("<%= view %>", json!({}));
    assert!(matches!(err, RenderError::TypeMismatch { .. }));
}

#[test]
fn test_unknown_method() {
    let err = render_err("<%= n.shout() %>", json!({ "n": "x" }));
    assert_eq!(
        err,
        RenderError::UnknownMethod {
            type_name: "string",
            method: "shout".into()
        }
    );
}

#[test]
fn test_assigning_into_data_is_rejected() {
    let err = render_err("<% user.name = \"x\" %>", json!({ "user": { "name": "a" } }));
    assert_eq!(err, RenderError::InvalidAssignment("user".into()));
}

#[test]
fn test_loop_limit() {
    let template = Compiler::new("<% while (true) { } %>", '<')
        .unwrap()
        .compile()
        .unwrap();
    let err = Renderer::new(template)
        .with_options(RenderOptions::new().with_max_loop_iterations(100))
        .render(&Value::Nil, &HelperSet::new())
        .unwrap_err();
    assert_eq!(err, RenderError::LoopLimitExceeded(100));
}

#[test]
fn test_custom_helper_error() {
    let extra = HelperSet::new().with_fn("fail", |_, _| Err(RenderError::Custom("boom".into())));
    let template = Compiler::new("<%= fail() %>", '<').unwrap().compile().unwrap();
    let err = Renderer::new(template).render(&Value::Nil, &extra).unwrap_err();
    assert_eq!(err.to_string(), "boom");
}

// ============================================================================
// Nested Views
// ============================================================================

#[test]
fn test_recursive_view_hits_depth_limit() {
    let template = Compiler::new("<%= view(tpl) %>", '<').unwrap().compile().unwrap();
    let data = Value::from(json!({ "tpl": "<%= view(tpl) %>" }));
    let err = Renderer::new(template)
        .with_options(RenderOptions::new().with_max_depth(8))
        .render(&data, &HelperSet::new())
        .unwrap_err();
    assert_eq!(err, RenderError::DepthExceeded(8));
}

#[test]
fn test_nested_render_error_is_wrapped() {
    let err = render_err("<%= view(inner) %>", json!({ "inner": "<%= missing %>" }));
    match err {
        RenderError::Template(inner) => {
            assert_eq!(*inner, Error::Render(RenderError::Undefined("missing".into())));
        }
        other => panic!("expected a nested template error, got {:?}", other),
    }
}

#[test]
fn test_nested_compile_error_keeps_its_line() {
    let err = render_err("<%= view(inner) %>", json!({ "inner": "a\n<%= ) %>" }));
    match err {
        RenderError::Template(inner) => assert_eq!(inner.line(), Some(2)),
        other => panic!("expected a nested template error, got {:?}", other),
    }
}

#[test]
fn test_view_rejects_bad_arguments() {
    let err = render_err("<%= view(42) %>", json!({}));
    assert!(matches!(err, RenderError::InvalidArgument { .. }));
}
