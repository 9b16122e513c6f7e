// Process-level behaviour of the `lox` binary: exit codes and output streams.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn lox() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_lox"));
    command.env_remove("LOX_LOG");
    command
}

fn script(name: &str, source: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("lox-cli-{}-{}.lox", std::process::id(), name));
    fs::write(&path, source).expect("write temp script");
    path
}

fn run_script(name: &str, source: &str) -> Output {
    let path = script(name, source);
    let output = lox().arg(&path).output().expect("run lox");
    let _ = fs::remove_file(&path);
    output
}

#[test]
fn successful_script_exits_zero() {
    let output = run_script("ok", "var x = 1; { var x = 2; print x; } print x;");

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "2\n1\n");
    assert!(output.stderr.is_empty());
}

#[test]
fn syntax_error_exits_65() {
    let output = run_script("syntax", "print 1 +;\nprint 2;\n");

    assert_eq!(output.status.code(), Some(65));
    assert!(output.stdout.is_empty());
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "[line 1] Error at ';': Expected expression\n"
    );
}

#[test]
fn every_syntax_error_is_reported() {
    let output = run_script("many", "var = 1;\nprint 1 +;\nprint (2;\n");

    assert_eq!(output.status.code(), Some(65));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.lines().count(), 3);
    assert!(stderr.contains("[line 3] Error at ';': Expected ')' after expression"));
}

#[test]
fn lexical_error_exits_65() {
    let output = run_script("lex", "print \"open;");

    assert_eq!(output.status.code(), Some(65));
    assert!(String::from_utf8_lossy(&output.stderr).contains("[line 1] Error: Unterminated string."));
}

#[test]
fn runtime_error_exits_70() {
    let output = run_script("runtime", "print 1;\nprint x;\nprint 3;\n");

    assert_eq!(output.status.code(), Some(70));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1\n");
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "[line 2] Error: Undefined variable 'x'.\n"
    );
}

#[test]
fn too_many_arguments_prints_usage_and_exits_64() {
    let output = lox().args(["one.lox", "two.lox"]).output().expect("run lox");

    assert_eq!(output.status.code(), Some(64));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Usage: lox [script]\n");
}

#[test]
fn missing_script_exits_66() {
    let output = lox()
        .arg("/definitely/not/a/real/path.lox")
        .output()
        .expect("run lox");

    assert_eq!(output.status.code(), Some(66));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error reading file"));
}

#[test]
fn pretty_errors_still_exit_65() {
    let path = script("pretty", "var a = 1 +;");
    let output = lox()
        .arg("--pretty-errors")
        .arg(&path)
        .output()
        .expect("run lox");
    let _ = fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(65));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Expected expression"));
}

#[test]
fn repl_reads_stdin_until_end_of_input() {
    let mut child = lox()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn lox");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(b"var a = 20;\nprint a + 22;\nprint b;\n")
        .expect("write stdin");

    let output = child.wait_with_output().expect("wait for lox");

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "lox> lox> 42\nlox> lox> "
    );
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "[line 1] Error: Undefined variable 'b'.\n"
    );
}

fn run_bytes(name: &str, source: &[u8], flags: &[&str]) -> Output {
    let path = std::env::temp_dir().join(format!("lox-cli-{}-{}.lox", std::process::id(), name));
    fs::write(&path, source).expect("write temp script");
    let output = lox().args(flags).arg(&path).output().expect("run lox");
    let _ = fs::remove_file(&path);
    output
}

#[test]
fn invalid_utf8_in_script_is_a_lexical_error() {
    let output = run_bytes("utf8", b"print 1;\n\xffprint 2;\n", &[]);

    assert_eq!(output.status.code(), Some(65));
    assert!(output.stdout.is_empty());
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "[line 2] Error: Unexpected character.\n"
    );
}

#[test]
fn tokens_flag_prints_one_token_per_line() {
    let output = run_bytes("tokens", b"var a = \"hi\";\n// note\nprint a >= 2.5;", &["--tokens"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "VAR var null\n\
         IDENTIFIER a null\n\
         EQUAL = null\n\
         STRING \"hi\" hi\n\
         SEMICOLON ; null\n\
         PRINT print null\n\
         IDENTIFIER a null\n\
         GREATER_EQUAL >= null\n\
         NUMBER 2.5 2.5\n\
         SEMICOLON ; null\n\
         EOF  null\n"
    );
    assert!(output.stderr.is_empty());
}

#[test]
fn tokens_flag_exits_with_lexer_status() {
    // Syntax errors are not checked in token mode
    let output = run_bytes("tokens-lex", b"print @ +;", &["--tokens"]);

    assert_eq!(output.status.code(), Some(65));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "PRINT print null\nPLUS + null\nSEMICOLON ; null\nEOF  null\n"
    );
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "[line 1] Error: Unexpected character.\n"
    );

    let output = run_bytes("tokens-syntax", b"print +;", &["--tokens"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn deeply_nested_script_is_a_syntax_error() {
    let levels = 50_000;
    let source = format!("print {}1{};", "(".repeat(levels), ")".repeat(levels));
    let output = run_bytes("deep", source.as_bytes(), &[]);

    assert_eq!(output.status.code(), Some(65));
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "[line 1] Error at '(': Nesting is too deep\n"
    );
}
