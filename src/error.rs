use std::fmt;
use thiserror::Error;

/// Byte range into the source plus the line it starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize) -> Self {
        Self { start, end, line }
    }

    pub fn single(pos: usize, line: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
            line,
        }
    }

    /// Smallest span covering both `self` and `other`, keeping the first line.
    pub fn to(&self, other: &Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Parse,
    Runtime,
}

/// The `<where>` part of a diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    Unspecified,
    AtEnd,
    AtLexeme(String),
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorLocation::Unspecified => Ok(()),
            ErrorLocation::AtEnd => write!(f, " at end"),
            ErrorLocation::AtLexeme(lexeme) => write!(f, " at '{}'", lexeme),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("[line {}] Error{}: {}", .span.line, .location, .message)]
pub struct LoxError {
    pub kind: ErrorKind,
    pub span: Span,
    pub location: ErrorLocation,
    pub message: String,
    pub help: Option<String>,
}

impl LoxError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            location: ErrorLocation::Unspecified,
            message,
            help: None,
        }
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Lex, span, message)
    }

    pub fn parse_error(span: Span, location: ErrorLocation, message: String) -> Self {
        Self {
            location,
            ..Self::new(ErrorKind::Parse, span, message)
        }
    }

    pub fn runtime_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Runtime, span, message)
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    pub fn is_runtime(&self) -> bool {
        self.kind == ErrorKind::Runtime
    }
}
