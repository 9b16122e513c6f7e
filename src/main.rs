use clap::{Arg, ArgAction, Command};
use lox::diagnostics::ErrorStyle;
use lox::repl;
use lox::runner::{self, RunConfig, EXIT_USAGE};
use std::path::Path;
use std::process;

fn main() {
    let matches = Command::new("lox")
        .about("A tree-walking interpreter for the Lox language")
        .arg(
            Arg::new("script")
                .help("The script file to execute; starts a REPL when omitted")
                .value_name("SCRIPT")
                .num_args(0..)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("pretty-errors")
                .long("pretty-errors")
                .help("Render errors with annotated source excerpts")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("Print the scanned tokens, one per line, instead of running")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log interpreter internals (overridden by LOX_LOG)")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let default_filter = if matches.get_flag("verbose") {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("LOX_LOG", default_filter))
        .init();

    let config = RunConfig {
        error_style: if matches.get_flag("pretty-errors") {
            ErrorStyle::Pretty
        } else {
            ErrorStyle::Plain
        },
        dump_tokens: matches.get_flag("tokens"),
    };

    let scripts: Vec<&String> = matches
        .get_many::<String>("script")
        .map(|values| values.collect())
        .unwrap_or_default();

    match scripts.as_slice() {
        [] => {
            if let Err(e) = repl::start(&config) {
                eprintln!("Error reading input: {}", e);
                process::exit(1);
            }
        }
        [script] => process::exit(runner::run_file(Path::new(script.as_str()), &config)),
        _ => {
            println!("Usage: lox [script]");
            process::exit(EXIT_USAGE);
        }
    }
}
