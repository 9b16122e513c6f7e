// End-to-end evaluation of source text with captured output.

use lox::diagnostics::Diagnostics;
use lox::evaluator::Evaluator;
use lox::runner::{self, EXIT_DATA_ERROR, EXIT_SOFTWARE};

fn run_with(evaluator: &mut Evaluator<Vec<u8>>, source: &str) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    runner::run(source, evaluator, &mut diagnostics);
    diagnostics
}

fn run(source: &str) -> (String, Diagnostics) {
    let mut evaluator = Evaluator::with_output(Vec::new());
    let diagnostics = run_with(&mut evaluator, source);
    let output = String::from_utf8(evaluator.into_output()).expect("output is utf-8");
    (output, diagnostics)
}

fn output_of(source: &str) -> String {
    let (output, diagnostics) = run(source);
    assert!(
        diagnostics.is_empty(),
        "unexpected errors for {:?}: {:?}",
        source,
        diagnostics.errors()
    );
    output
}

fn runtime_error_of(source: &str) -> String {
    let (_, diagnostics) = run(source);
    assert!(diagnostics.had_runtime_error(), "expected a runtime error for {:?}", source);
    assert!(!diagnostics.had_error());
    diagnostics.errors()[0].to_string()
}

#[test]
fn arithmetic_follows_ieee_doubles() {
    let cases = [
        ("print 6 / 2;", "3\n"),
        ("print 1 + 2;", "3\n"),
        ("print 7 - 10;", "-3\n"),
        ("print 2.5 * 2;", "5\n"),
        ("print 1 / 4;", "0.25\n"),
        ("print 0.1 + 0.2;", "0.30000000000000004\n"),
        ("print (1 + 2) * 3 - -4 / 2;", "11\n"),
    ];

    for (source, expected) in cases {
        assert_eq!(output_of(source), expected, "source: {}", source);
    }
}

#[test]
fn division_by_zero_is_not_an_error() {
    assert_eq!(output_of("print 1 / 0;"), "Infinity\n");
    assert_eq!(output_of("print -1 / 0;"), "-Infinity\n");
    assert_eq!(output_of("print 0 / 0;"), "NaN\n");
}

#[test]
fn number_formatting() {
    assert_eq!(
        output_of("print 3.0; print 1.5; print -0.5; print 100;"),
        "3\n1.5\n-0.5\n100\n"
    );
}

#[test]
fn value_formatting() {
    assert_eq!(
        output_of("print nil; print true; print false; print \"text\";"),
        "nil\ntrue\nfalse\ntext\n"
    );
}

#[test]
fn string_concatenation() {
    assert_eq!(output_of("print \"foo\" + \"bar\";"), "foobar\n");
    assert_eq!(output_of("print \"\" + \"\";"), "\n");
}

#[test]
fn mixed_addition_is_a_runtime_error() {
    assert_eq!(
        runtime_error_of("print \"a\" + 1;"),
        "[line 1] Error: Operands must be two numbers or two strings."
    );
    assert_eq!(
        runtime_error_of("print nil + nil;"),
        "[line 1] Error: Operands must be two numbers or two strings."
    );
}

#[test]
fn numeric_operators_reject_other_types() {
    for source in [
        "print \"a\" - 1;",
        "print true * 2;",
        "print 4 / nil;",
        "print 1 < \"2\";",
        "print \"a\" >= \"b\";",
    ] {
        assert_eq!(
            runtime_error_of(source),
            "[line 1] Error: Operands must be numbers.",
            "source: {}",
            source
        );
    }
    assert_eq!(
        runtime_error_of("print -\"a\";"),
        "[line 1] Error: Operand must be a number."
    );
}

#[test]
fn comparisons() {
    assert_eq!(
        output_of("print 1 < 2; print 2 <= 2; print 3 > 4; print 4 >= 5;"),
        "true\ntrue\nfalse\nfalse\n"
    );
}

#[test]
fn equality_never_coerces() {
    assert_eq!(
        output_of(
            "print nil == nil; print nil == false; print 1 == 1; print \"a\" == \"a\"; \
             print 1 == \"1\"; print true != false; print 0 == false;"
        ),
        "true\nfalse\ntrue\ntrue\nfalse\ntrue\nfalse\n"
    );
}

#[test]
fn truthiness() {
    assert_eq!(
        output_of("print !nil; print !false; print !0; print !\"\"; print !!true;"),
        "true\ntrue\nfalse\nfalse\ntrue\n"
    );
}

#[test]
fn logical_operators_short_circuit_and_return_operands() {
    assert_eq!(
        output_of("print nil or \"yes\"; print 1 and 2; print false and undefined; print 1 or undefined;"),
        "yes\n2\nfalse\n1\n"
    );
}

#[test]
fn block_shadowing_leaves_outer_binding() {
    assert_eq!(
        output_of("var x = 1; { var x = 2; print x; } print x;"),
        "2\n1\n"
    );
}

#[test]
fn assignment_in_block_updates_enclosing_binding() {
    assert_eq!(output_of("var a = 1; { a = 2; } print a;"), "2\n");
    assert_eq!(output_of("var a = 1; { var b = a = 3; print b; } print a;"), "3\n3\n");
}

#[test]
fn var_without_initializer_is_nil() {
    assert_eq!(output_of("var a; print a;"), "nil\n");
}

#[test]
fn redeclaration_overwrites_in_same_scope() {
    assert_eq!(output_of("var a = 1; var a = \"two\"; print a;"), "two\n");
}

#[test]
fn block_locals_do_not_leak() {
    assert_eq!(
        runtime_error_of("{ var inner = 1; } print inner;"),
        "[line 1] Error: Undefined variable 'inner'."
    );
}

#[test]
fn undefined_variable() {
    let (output, diagnostics) = run("print x;");

    assert_eq!(output, "");
    assert_eq!(
        diagnostics.errors()[0].to_string(),
        "[line 1] Error: Undefined variable 'x'."
    );
    assert_eq!(runner::exit_code(&diagnostics), EXIT_SOFTWARE);
}

#[test]
fn assignment_does_not_declare() {
    let mut evaluator = Evaluator::with_output(Vec::new());

    let diagnostics = run_with(&mut evaluator, "y = 1;");
    assert!(diagnostics.had_runtime_error());
    assert!(evaluator.environment().get("y").is_none());
}

#[test]
fn evaluation_stops_at_first_runtime_error() {
    let (output, diagnostics) = run("print 1;\nprint x;\nprint 3;");

    assert_eq!(output, "1\n");
    assert_eq!(diagnostics.errors().len(), 1);
    assert_eq!(diagnostics.errors()[0].line(), 2);
}

#[test]
fn runtime_error_reports_expression_line() {
    assert_eq!(
        runtime_error_of("var a = 1;\n\nprint a + nil;"),
        "[line 3] Error: Operands must be two numbers or two strings."
    );
}

#[test]
fn syntax_errors_prevent_evaluation() {
    let (output, diagnostics) = run("print 1;\nprint 2 +;\nprint 3;");

    assert_eq!(output, "");
    assert!(diagnostics.had_error());
    assert!(!diagnostics.had_runtime_error());
    assert_eq!(diagnostics.errors().len(), 1);
    assert_eq!(runner::exit_code(&diagnostics), EXIT_DATA_ERROR);
}

#[test]
fn lexical_errors_prevent_evaluation() {
    let (output, diagnostics) = run("print 1; @");

    assert_eq!(output, "");
    assert_eq!(runner::exit_code(&diagnostics), EXIT_DATA_ERROR);
}

#[test]
fn clean_run_exits_zero() {
    let (_, diagnostics) = run("print 1;");
    assert_eq!(runner::exit_code(&diagnostics), 0);
}

#[test]
fn if_else() {
    assert_eq!(
        output_of("if (1 < 2) print \"then\"; else print \"else\"; if (nil) print 1; else print 2;"),
        "then\n2\n"
    );
}

#[test]
fn while_loop() {
    assert_eq!(
        output_of("var i = 0; while (i < 3) { print i; i = i + 1; }"),
        "0\n1\n2\n"
    );
}

#[test]
fn for_loop_and_scope_of_its_variable() {
    assert_eq!(
        output_of("for (var i = 0; i < 3; i = i + 1) print i;"),
        "0\n1\n2\n"
    );
    assert_eq!(
        runtime_error_of("for (var i = 0; i < 1; i = i + 1) {} print i;"),
        "[line 1] Error: Undefined variable 'i'."
    );
}

#[test]
fn fibonacci() {
    let source = "
        var a = 0;
        var b = 1;
        for (var n = 0; n < 10; n = n + 1) {
            print a;
            var next = a + b;
            a = b;
            b = next;
        }
    ";
    assert_eq!(output_of(source), "0\n1\n1\n2\n3\n5\n8\n13\n21\n34\n");
}

#[test]
fn runtime_error_inside_block_restores_scope() {
    let mut evaluator = Evaluator::with_output(Vec::new());

    let diagnostics = run_with(&mut evaluator, "var g = 1; { var inner = 1; { print missing; } }");
    assert!(diagnostics.had_runtime_error());
    assert_eq!(evaluator.environment().depth(), 1);

    let diagnostics = run_with(&mut evaluator, "print g; print inner;");
    assert_eq!(
        diagnostics.errors()[0].to_string(),
        "[line 1] Error: Undefined variable 'inner'."
    );
    assert_eq!(String::from_utf8_lossy(evaluator.output()), "1\n");
}
