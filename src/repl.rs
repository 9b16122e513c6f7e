use crate::ast::{Expr, Stmt};
use crate::diagnostics::Diagnostics;
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::runner::{decode_source, dump_tokens, RunConfig};
use log::debug;
use std::io::{self, BufRead, Write};

pub const PROMPT: &str = "lox> ";

/// Interactive prompt on stdin/stdout.
pub fn start(config: &RunConfig) -> io::Result<()> {
    let stdin = io::stdin();
    run_session(stdin.lock(), io::stdout(), config)?;
    Ok(())
}

/// Reads lines from `input` until it is exhausted, running each as its own
/// execution unit against one persistent set of globals. Prompts and program
/// output go to `output`, which is handed back at the end.
pub fn run_session<R: BufRead, W: Write>(
    mut input: R,
    output: W,
    config: &RunConfig,
) -> io::Result<W> {
    let mut evaluator = Evaluator::with_output(output);
    let mut buffer = Vec::new();

    loop {
        write!(evaluator.output_mut(), "{}", PROMPT)?;
        evaluator.output_mut().flush()?;

        if input.read_until(b'\n', &mut buffer)? == 0 {
            debug!("end of input, leaving REPL");
            break;
        }

        let line = decode_source(std::mem::take(&mut buffer));
        let source = line.trim_end_matches(['\n', '\r']);
        if source.trim().is_empty() {
            continue;
        }

        let diagnostics = if config.dump_tokens {
            let mut diagnostics = Diagnostics::new();
            dump_tokens(source, evaluator.output_mut(), &mut diagnostics)?;
            diagnostics
        } else {
            run_line(source, &mut evaluator)
        };
        diagnostics.emit(source, None, config.error_style);
    }

    Ok(evaluator.into_output())
}

/// Runs one REPL line. A line holding a single non-assignment expression
/// echoes its value; the trailing ';' may be left off.
pub fn run_line<W: Write>(source: &str, evaluator: &mut Evaluator<W>) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    let mut lexer = Lexer::new(source.to_string());
    let tokens = lexer.scan_tokens(&mut diagnostics);

    let mut parser = Parser::for_repl(tokens);
    let program = parser.parse(&mut diagnostics);

    if diagnostics.had_error() {
        return diagnostics;
    }

    if let [Stmt::Expression { expr, span }] = program.statements.as_slice() {
        if !matches!(expr, Expr::Assign { .. }) {
            let result = evaluator
                .evaluate_expression(expr)
                .and_then(|value| evaluator.write_value(&value, span));
            if let Err(error) = result {
                diagnostics.report(error);
            }
            return diagnostics;
        }
    }

    if let Err(error) = evaluator.evaluate_program(&program) {
        diagnostics.report(error);
    }
    diagnostics
}
