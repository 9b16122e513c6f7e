// Lox Language Interpreter Library
//
// Lexer, recursive-descent parser and tree-walking evaluator for a small
// dynamically typed statement language, plus the file runner and REPL.

// Public modules
pub mod ast;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, Program, Stmt};
pub use diagnostics::{Diagnostics, ErrorStyle};
pub use environment::Environment;
pub use error::{ErrorKind, ErrorLocation, LoxError, Span};
pub use evaluator::Evaluator;
pub use lexer::{Lexer, Literal, Token, TokenType};
pub use parser::Parser;
pub use value::Value;

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::{run, run_file, RunConfig};
