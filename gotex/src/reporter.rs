//! Renders [`ParseError`]s to the terminal: a colored severity tag, a
//! `file:line:column` locator, the offending source line, and a caret
//! pointing at the column. Directly modeled on this project's ancestor's
//! own diagnostic printer.

use colored::Colorize;

use crate::error::{ParseError, Severity};

/// Print every error in `errors` to stderr, in order.
pub fn report_errors(errors: &[ParseError], source: &str, filename: &str) {
    let lines: Vec<&str> = source.lines().collect();
    for err in errors {
        eprintln!("{}", format_error(err, &lines, filename));
    }
}

/// Render a single error the way [`report_errors`] prints it, without
/// writing anywhere, for embedding elsewhere (tests, alternate frontends).
pub fn format_error(err: &ParseError, lines: &[&str], filename: &str) -> String {
    let tag = match err.severity {
        Severity::Warning => "warning".yellow().bold(),
        Severity::Error => "error".red().bold(),
        Severity::Fatal => "fatal error".red().bold(),
    };
    let header = format!("{tag}: {}", err.message);
    let locator = format!(
        "  --> {filename}:{}:{}",
        err.position.line, err.position.column
    )
    .blue();

    let line_no = err.position.line as usize;
    let source_line = lines.get(line_no.saturating_sub(1)).copied().unwrap_or("");
    let gutter = format!("{line_no} | ");
    let pad_width = gutter.chars().count() + err.position.column.saturating_sub(1) as usize;
    let caret_line = format!("{}{}", " ".repeat(pad_width), "^".red().bold());

    format!("{header}\n{locator}\n{gutter}{source_line}\n{caret_line}")
}

/// The exit code (per `spec.md` §6) an invocation should use given the
/// errors collected during parsing: non-zero iff anything reached `Error`
/// or `Fatal` severity.
pub fn exit_code_for(errors: &[ParseError]) -> i32 {
    if errors.iter().any(|e| !e.is_warning()) {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;
    use crate::position::Position;

    #[test]
    fn formats_header_locator_and_caret() {
        let err = ParseError::new(
            ParseErrorKind::UnmatchedBrace,
            "unmatched `}`",
            Position::new(2, 5),
            Severity::Error,
        );
        let lines = vec!["first line", "second } line"];
        let rendered = format_error(&err, &lines, "doc.tex");
        assert!(rendered.contains("unmatched `}`"));
        assert!(rendered.contains("doc.tex:2:5"));
        assert!(rendered.contains("second } line"));
        assert!(rendered.contains('^'));
    }

    #[test]
    fn exit_code_ignores_warnings_only() {
        let warning = ParseError::new(
            ParseErrorKind::MissingArgument,
            "missing",
            Position::start(),
            Severity::Warning,
        );
        assert_eq!(exit_code_for(&[warning.clone()]), 0);
        let error = ParseError::new(
            ParseErrorKind::UnmatchedBrace,
            "unmatched",
            Position::start(),
            Severity::Error,
        );
        assert_eq!(exit_code_for(&[warning, error]), 1);
    }
}
