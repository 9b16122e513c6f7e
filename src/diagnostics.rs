use crate::error::{ErrorKind, LoxError};
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use log::warn;

/// How recorded errors are written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorStyle {
    /// `[line <n>] Error<where>: <message>`, one line per error.
    #[default]
    Plain,
    /// Annotated source excerpt with help notes.
    Pretty,
}

/// Errors collected over one execution unit (a script, or one REPL line).
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<LoxError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: LoxError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = LoxError>) {
        self.errors.extend(errors);
    }

    /// True when a lexical or syntax error was recorded.
    pub fn had_error(&self) -> bool {
        self.errors.iter().any(|e| !e.is_runtime())
    }

    pub fn had_runtime_error(&self) -> bool {
        self.errors.iter().any(LoxError::is_runtime)
    }

    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn emit(&self, source: &str, filename: Option<&str>, style: ErrorStyle) {
        for error in &self.errors {
            match style {
                ErrorStyle::Plain => eprintln!("{}", error),
                ErrorStyle::Pretty => render_pretty(error, source, filename),
            }
        }
    }
}

fn render_pretty(error: &LoxError, source: &str, filename: Option<&str>) {
    let filename = filename.unwrap_or("<repl>");

    let color = match error.kind {
        ErrorKind::Lex => Color::Red,
        ErrorKind::Parse => Color::Yellow,
        ErrorKind::Runtime => Color::Magenta,
    };

    let kind_str = match error.kind {
        ErrorKind::Lex => "Lexical Error",
        ErrorKind::Parse => "Syntax Error",
        ErrorKind::Runtime => "Runtime Error",
    };

    // ariadne counts characters, spans count bytes
    let start = char_offset(source, error.span.start);
    let end = char_offset(source, error.span.end).max(start);

    let mut report_builder = Report::build(ReportKind::Error, filename, start)
        .with_message(format!(
            "{} [line {}]{}: {}",
            kind_str.fg(color),
            error.span.line,
            error.location,
            error.message
        ))
        .with_label(
            Label::new((filename, start..end))
                .with_message(&error.message)
                .with_color(color),
        );

    if let Some(ref help_text) = error.help {
        report_builder =
            report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
    }

    if let Err(io_error) = report_builder
        .finish()
        .eprint((filename, Source::from(source)))
    {
        warn!("failed to render diagnostic: {}", io_error);
        eprintln!("{}", error);
    }
}

fn char_offset(source: &str, byte_offset: usize) -> usize {
    let byte_offset = byte_offset.min(source.len());
    source
        .char_indices()
        .take_while(|(i, _)| *i < byte_offset)
        .count()
}
