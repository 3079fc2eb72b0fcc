//! End-to-end scan→parse→resolve→interpret tests, including the six literal
//! scenarios from spec.md §8.

use lox::{CollectStringPrint, CollectingSink, Runtime};

/// Runs `source` against a fresh [`Runtime`] and returns everything it
/// printed. Panics if any stage reported a diagnostic.
fn run_ok(source: &str) -> String {
    let mut runtime = Runtime::new();
    let mut sink = CollectingSink::default();
    let mut print = CollectStringPrint::default();
    lox::run(source, &mut runtime, &mut sink, &mut print);
    assert!(!sink.had_error(), "unexpected syntax/resolve errors: {:?}", sink.syntax.iter().chain(&sink.resolve));
    assert!(!sink.had_runtime_error(), "unexpected runtime error: {:?}", sink.runtime);
    print.output
}

/// Runs `source` expecting exactly one runtime error, and returns its
/// message.
fn run_runtime_error(source: &str) -> String {
    let mut runtime = Runtime::new();
    let mut sink = CollectingSink::default();
    let mut print = CollectStringPrint::default();
    lox::run(source, &mut runtime, &mut sink, &mut print);
    assert!(!sink.had_error(), "unexpected syntax/resolve errors: {:?}", sink.syntax.iter().chain(&sink.resolve));
    assert_eq!(sink.runtime.len(), 1, "expected exactly one runtime error, got {:?}", sink.runtime);
    sink.runtime[0].message.clone()
}

#[test]
fn closure_counter_remembers_state_between_calls() {
    let output = run_ok(
        "fun makeCounter(){ var i=0; fun c(){ i=i+1; return i; } return c; }\n\
         var c = makeCounter(); print(c()); print(c()); print(c());",
    );
    assert_eq!(output, "1\n2\n3\n");
}

#[test]
fn inheritance_and_super_dispatch_to_the_right_method() {
    let output = run_ok(
        "class A { greet(){ print(\"A\"); } }\n\
         class B < A { greet(){ super.greet(); print(\"B\"); } }\n\
         B().greet();",
    );
    assert_eq!(output, "A\nB\n");
}

#[test]
fn initializer_always_yields_the_receiver() {
    let output = run_ok("class P { init(x){ this.x = x; return; } } var p = P(7); print(p.x);");
    assert_eq!(output, "7\n");
}

#[test]
fn calling_with_too_few_arguments_is_a_runtime_error() {
    let message = run_runtime_error("fun f(a,b){ return a+b; } f(1);");
    assert_eq!(message, "Expected 2 arguments but got 1.");
}

#[test]
fn list_append_get_set_length_and_cycle_safe_tostring() {
    let output = run_ok(
        "var l = List(); l.append(1); l.append(\"x\"); l.append(l); print(l.toString());",
    );
    assert_eq!(output, "[1, x, [...]]\n");
}

#[test]
fn list_get_out_of_range_yields_nil_and_set_reports_success_as_a_bool() {
    let output = run_ok(
        "var l = List(); l.append(1);\n\
         print(l.get(5));\n\
         print(l.set(0, 9));\n\
         print(l.set(5, 9));\n\
         print(l.length());",
    );
    assert_eq!(output, "nil\ntrue\nfalse\n1\n");
}

#[test]
fn gc_reclaims_closures_after_top_level_statements() {
    let mut runtime = Runtime::new();
    let mut sink = CollectingSink::default();
    let mut print = CollectStringPrint::default();

    // Declaring `make` itself grows the heap permanently (it's a live
    // global), so the baseline is measured after that, not before.
    let declare_make = "fun make(){ var big = List(); for (var i=0;i<50;i=i+1) big.append(i); fun closure(){ return big; } return closure; }";
    lox::run(declare_make, &mut runtime, &mut sink, &mut print);
    assert!(!sink.had_error() && !sink.had_runtime_error());
    let baseline = runtime.heap.live_count();

    let drive_loop = "for (var i=0;i<20;i=i+1) { var f = make(); }";
    lox::run(drive_loop, &mut runtime, &mut sink, &mut print);
    assert!(!sink.had_error() && !sink.had_runtime_error());

    assert_eq!(runtime.heap.live_count(), baseline);
}

#[test]
fn and_or_return_operand_values_not_forced_booleans() {
    let output = run_ok("print(1 or 2); print(nil or \"x\"); print(false and 1); print(1 and 2);");
    assert_eq!(output, "1\nx\nfalse\n2\n");
}

#[test]
fn operand_type_errors_match_verbatim_messages() {
    assert_eq!(run_runtime_error("print(-\"x\");"), "Operand must be a number.");
    assert_eq!(run_runtime_error("print(1 - \"x\");"), "Operands must be numbers.");
    assert_eq!(run_runtime_error("print(1 + \"x\");"), "Operands must be two numbers or two strings.");
    assert_eq!(run_runtime_error("print(1());"), "Can only call functions and classes.");
    assert_eq!(run_runtime_error("print(\"x\".y);"), "Only instances have properties.");
    assert_eq!(run_runtime_error("\"x\".y = 1;"), "Only instances have fields.");
    assert_eq!(run_runtime_error("var x = y;"), "Undefined variable 'y'.");
}

#[test]
fn undefined_property_access_on_an_instance_is_reported() {
    let message = run_runtime_error("class C {} C().nope;");
    assert_eq!(message, "Undefined property 'nope'.");
}

#[test]
fn superclass_must_evaluate_to_a_class() {
    let mut runtime = Runtime::new();
    let mut sink = CollectingSink::default();
    let mut print = CollectStringPrint::default();
    lox::run("var NotAClass = 1; class C < NotAClass {}", &mut runtime, &mut sink, &mut print);
    assert_eq!(sink.runtime.len(), 1);
    assert_eq!(sink.runtime[0].message, "Superclass must be a class.");
}

#[test]
fn number_formatting_drops_trailing_zeros_but_not_integral_decimals() {
    let output = run_ok("print(1); print(1.5); print(-0); print(10 / 4);");
    assert_eq!(output, "1\n1.5\n-0\n2.5\n");
}

#[test]
fn instance_defined_equals_method_overrides_identity_comparison() {
    let output = run_ok(
        "class Point { init(x){ this.x = x; } equals(other){ return this.x == other.x; } }\n\
         print(Point(1) == Point(1));\n\
         print(Point(1) == Point(2));",
    );
    assert_eq!(output, "true\nfalse\n");
}

#[test]
fn for_loop_break_and_continue_affect_only_the_innermost_loop() {
    let output = run_ok(
        "for (var i = 0; i < 5; i = i + 1) {\n\
           if (i == 1) continue;\n\
           if (i == 3) break;\n\
           print(i);\n\
         }",
    );
    assert_eq!(output, "0\n2\n");
}
