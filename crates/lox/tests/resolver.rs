//! Resolver-level tests: the static checks spec.md §4.G assigns to this
//! pass, independent of whether the program would otherwise run.

use lox::diagnostics::CollectingSink;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::Scanner;

fn resolve_errors(source: &str) -> Vec<String> {
    let mut sink = CollectingSink::default();
    let tokens = Scanner::new(source).scan_tokens(&mut sink);
    let statements = Parser::new(tokens, &mut sink).parse();
    assert!(!sink.had_error(), "fixture should parse cleanly: {:?}", sink.syntax);
    Resolver::new(&mut sink).resolve(&statements);
    sink.resolve.into_iter().map(|d| d.message).collect()
}

#[test]
fn return_at_top_level_is_an_error() {
    let errors = resolve_errors("return 1;");
    assert_eq!(errors, vec!["Can't return from top-level code."]);
}

#[test]
fn returning_a_value_from_an_initializer_is_an_error() {
    let errors = resolve_errors("class C { init() { return 1; } }");
    assert_eq!(errors, vec!["Can't return a value from an initializer."]);
}

#[test]
fn bare_return_from_an_initializer_is_fine() {
    let errors = resolve_errors("class C { init() { return; } }");
    assert!(errors.is_empty());
}

#[test]
fn this_outside_a_class_is_an_error() {
    let errors = resolve_errors("print(this);");
    assert_eq!(errors, vec!["Can't use 'this' outside of a class."]);
}

#[test]
fn super_without_a_superclass_is_an_error() {
    let errors = resolve_errors("class C { m() { super.m(); } }");
    assert_eq!(errors, vec!["Can't use 'super' in a class with no superclass."]);
}

#[test]
fn super_outside_a_class_is_an_error() {
    let errors = resolve_errors("super.m();");
    assert_eq!(errors, vec!["Can't use 'super' outside of a class."]);
}

#[test]
fn class_inheriting_from_itself_is_an_error() {
    let errors = resolve_errors("class C < C {}");
    assert_eq!(errors, vec!["A class can't inherit from itself."]);
}

#[test]
fn shadowing_a_local_in_the_same_scope_is_an_error() {
    let errors = resolve_errors("{ var a = 1; var a = 2; }");
    assert_eq!(errors, vec!["Already a variable with this name in this scope."]);
}

#[test]
fn reading_a_local_in_its_own_initializer_is_an_error() {
    let errors = resolve_errors("{ var a = a; }");
    assert_eq!(errors, vec!["Can't read local variable in its own initializer."]);
}

#[test]
fn break_and_continue_outside_a_loop_are_errors() {
    let errors = resolve_errors("break;");
    assert_eq!(errors, vec!["Can't use 'break' outside of a loop."]);
    let errors = resolve_errors("continue;");
    assert_eq!(errors, vec!["Can't use 'continue' outside of a loop."]);
}

#[test]
fn break_and_continue_inside_a_function_declared_within_a_loop_are_still_errors() {
    // `loop_depth` must not leak across a function boundary: the function
    // body is not itself inside a loop, even though its declaration is.
    let errors = resolve_errors("for (;;) { fun f() { break; } }");
    assert_eq!(errors, vec!["Can't use 'break' outside of a loop."]);
    let errors = resolve_errors("for (;;) { fun f() { continue; } }");
    assert_eq!(errors, vec!["Can't use 'continue' outside of a loop."]);
}

#[test]
fn well_formed_class_hierarchy_resolves_cleanly() {
    let errors = resolve_errors(
        "class A { greet() { print(\"A\"); } }\n\
         class B < A { greet() { super.greet(); print(\"B\"); } }\n\
         B().greet();",
    );
    assert!(errors.is_empty(), "unexpected resolve errors: {errors:?}");
}
