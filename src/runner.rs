use crate::diagnostics::{Diagnostics, ErrorStyle};
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;
use log::{debug, info};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Exit status for a bad command line.
pub const EXIT_USAGE: i32 = 64;
/// Exit status when a lexical or syntax error was reported.
pub const EXIT_DATA_ERROR: i32 = 65;
/// Exit status when the script could not be read.
pub const EXIT_NO_INPUT: i32 = 66;
/// Exit status when evaluation hit a runtime error.
pub const EXIT_SOFTWARE: i32 = 70;
/// Exit status when output could not be written.
pub const EXIT_IO_ERROR: i32 = 74;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunConfig {
    pub error_style: ErrorStyle,
    /// Print the scanned tokens instead of running the program.
    pub dump_tokens: bool,
}

/// Runs one execution unit: scan, parse, and evaluate if both were clean.
/// Every error ends up in `diagnostics`.
pub fn run<W: Write>(source: &str, evaluator: &mut Evaluator<W>, diagnostics: &mut Diagnostics) {
    let mut lexer = Lexer::new(source.to_string());
    let tokens = lexer.scan_tokens(diagnostics);

    let mut parser = Parser::new(tokens);
    let program = parser.parse(diagnostics);

    if diagnostics.had_error() {
        debug!("skipping evaluation after {} errors", diagnostics.errors().len());
        return;
    }

    if let Err(error) = evaluator.evaluate_program(&program) {
        diagnostics.report(error);
    }
}

/// Scans `source` and writes one token per line to `out`, ending with EOF.
pub fn dump_tokens<W: Write>(
    source: &str,
    out: &mut W,
    diagnostics: &mut Diagnostics,
) -> io::Result<()> {
    let mut lexer = Lexer::new(source.to_string());
    for token in lexer.scan_tokens(diagnostics) {
        writeln!(out, "{}", token)?;
    }
    out.flush()
}

/// Process exit status for a finished execution unit.
pub fn exit_code(diagnostics: &Diagnostics) -> i32 {
    if diagnostics.had_error() {
        EXIT_DATA_ERROR
    } else if diagnostics.had_runtime_error() {
        EXIT_SOFTWARE
    } else {
        0
    }
}

/// Decodes script bytes, replacing invalid UTF-8 with U+FFFD so the lexer
/// reports it like any other unexpected character.
pub fn decode_source(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(source) => source,
        Err(e) => {
            debug!("input is not valid UTF-8: {}", e.utf8_error());
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

pub fn run_file(path: &Path, config: &RunConfig) -> i32 {
    let source = match fs::read(path) {
        Ok(bytes) => decode_source(bytes),
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            return EXIT_NO_INPUT;
        }
    };

    info!("running {}", path.display());
    let filename = path.to_string_lossy();
    let mut diagnostics = Diagnostics::new();

    if config.dump_tokens {
        if let Err(e) = dump_tokens(&source, &mut io::stdout().lock(), &mut diagnostics) {
            eprintln!("Error writing tokens: {}", e);
            return EXIT_IO_ERROR;
        }
    } else {
        let mut evaluator = Evaluator::new();
        run(&source, &mut evaluator, &mut diagnostics);
    }
    diagnostics.emit(&source, Some(&filename), config.error_style);

    exit_code(&diagnostics)
}
