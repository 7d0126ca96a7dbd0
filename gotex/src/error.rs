//! Parse-time diagnostics and the top-level error type returned by the
//! compiler's public API.

use std::fmt;

use crate::position::Position;

/// Severity of a [`ParseError`]. Only `Error` and above affect the process
/// exit code; `Fatal` additionally aborts PDF generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal error",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnmatchedBrace,
    UnmatchedEnvironment,
    MissingArgument,
    UnexpectedToken,
    UnmatchedMath,
    UnexpectedEof,
    EmptyEnvironment,
}

/// A single recorded parse diagnostic.
///
/// Parsing never aborts: every error is pushed onto the parser's error list
/// and parsing continues in the best-guess state described in `spec.md` §7.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub position: Position,
    pub severity: Severity,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        position: Position,
        severity: Severity,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            position,
            severity,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.message, self.position)
    }
}

impl std::error::Error for ParseError {}

/// Top-level error type for the library's public conversion entry points.
///
/// This wraps failures from the stages the core parser cannot itself
/// produce: font loading, PDF writing, and I/O. Parse errors are reported
/// separately via the returned error list rather than through this type,
/// since they are recoverable and compilation continues past them.
#[derive(Debug)]
pub enum GotexError {
    Io(std::io::Error),
    FontLoad(String),
    PdfWrite(String),
    Fatal(ParseError),
}

impl fmt::Display for GotexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GotexError::Io(e) => write!(f, "I/O error: {e}"),
            GotexError::FontLoad(msg) => write!(f, "font loading failed: {msg}"),
            GotexError::PdfWrite(msg) => write!(f, "PDF writing failed: {msg}"),
            GotexError::Fatal(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for GotexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GotexError::Io(e) => Some(e),
            GotexError::Fatal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GotexError {
    fn from(e: std::io::Error) -> Self {
        GotexError::Io(e)
    }
}
