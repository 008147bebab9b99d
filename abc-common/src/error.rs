//! Error handling for the ABC compiler
//!
//! This module defines the common error type, diagnostics and the
//! diagnostic sink (`ErrorReporter`) used throughout the compiler.

use crate::source_loc::SourceSpan;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use thiserror::Error;

/// Main compiler error type that encompasses all phases of compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("{span}: error: {message}")]
    SemanticError {
        span: SourceSpan,
        message: String,
    },

    #[error("code generation error: {message}")]
    CodegenError {
        span: Option<SourceSpan>,
        message: String,
    },

    #[error("configuration error: {message}")]
    ConfigError { message: String },
}

impl CompilerError {
    /// Create a semantic error
    pub fn semantic_error(message: String, span: SourceSpan) -> Self {
        CompilerError::SemanticError { span, message }
    }

    /// Create a codegen error
    pub fn codegen_error(message: String, span: Option<SourceSpan>) -> Self {
        CompilerError::CodegenError { span, message }
    }

    /// The bare message, without location prefix
    pub fn message(&self) -> &str {
        match self {
            CompilerError::SemanticError { message, .. }
            | CompilerError::CodegenError { message, .. }
            | CompilerError::ConfigError { message } => message,
        }
    }

    pub fn span(&self) -> Option<&SourceSpan> {
        match self {
            CompilerError::SemanticError { span, .. } => Some(span),
            CompilerError::CodegenError { span, .. } => span.as_ref(),
            CompilerError::ConfigError { .. } => None,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with location and severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: SourceSpan,
}

impl Diagnostic {
    pub fn error(message: String, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
        }
    }

    pub fn warning(message: String, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            span,
        }
    }

    pub fn note(message: String, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Note,
            message,
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.is_dummy() {
            write!(f, "{}: {}", self.severity, self.message)
        } else {
            write!(f, "{}: {}: {}", self.span, self.severity, self.message)
        }
    }
}

/// Render the source lines covered by `span` with a caret underline.
///
/// Columns are 1-based and the end column is inclusive. Lines outside the
/// source text are skipped, so a dummy span renders as an empty string.
pub fn render_location(source: &str, span: &SourceSpan) -> String {
    let mut out = String::new();
    if span.is_dummy() {
        return out;
    }
    let first = span.start.line as usize;
    let last = span.end.line.max(span.start.line) as usize;
    let width = last.to_string().len();

    for (idx, text) in source.lines().enumerate() {
        let line_no = idx + 1;
        if line_no < first || line_no > last {
            continue;
        }
        let from = if line_no == first { span.start.column as usize } else { 1 };
        let to = if line_no == last {
            span.end.column as usize
        } else {
            text.chars().count()
        };
        let from = from.max(1);
        let to = to.max(from);

        let _ = writeln!(out, "{line_no:>width$} | {text}");
        let _ = writeln!(
            out,
            "{:>width$} | {}{}",
            "",
            " ".repeat(from - 1),
            "^".repeat(to - from + 1)
        );
    }
    out
}

/// Collecting diagnostic sink
///
/// Every semantic rule reports through a reporter; whether an error ends
/// the process is decided by the caller (see `ErrorReporter::fatal`).
#[derive(Debug, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
    source: Option<String>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the source text used for caret excerpts
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    /// Record an already built diagnostic
    pub fn report(&mut self, diagnostic: Diagnostic) -> &mut Diagnostic {
        match diagnostic.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            Severity::Note => {}
        }
        self.diagnostics.push(diagnostic);
        let last = self.diagnostics.len() - 1;
        &mut self.diagnostics[last]
    }

    /// Report an error diagnostic
    pub fn error(&mut self, message: String, span: SourceSpan) -> &mut Diagnostic {
        self.report(Diagnostic::error(message, span))
    }

    /// Report a warning diagnostic
    pub fn warning(&mut self, message: String, span: SourceSpan) -> &mut Diagnostic {
        self.report(Diagnostic::warning(message, span))
    }

    /// Report a note diagnostic
    pub fn note(&mut self, message: String, span: SourceSpan) -> &mut Diagnostic {
        self.report(Diagnostic::note(message, span))
    }

    /// Check if any errors have been reported
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Get the number of errors
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Get the number of warnings
    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// Get all diagnostics
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Iterate over the warnings only
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Render a diagnostic followed by its source excerpt, if the source is known
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut text = match &self.source {
            Some(source) => render_location(source, &diagnostic.span),
            None => String::new(),
        };
        text.push_str(&diagnostic.to_string());
        text
    }

    /// Print all diagnostics to stderr
    pub fn print_diagnostics(&self) {
        for diagnostic in &self.diagnostics {
            eprintln!("{}", self.render(diagnostic));
        }
    }

    /// Print the diagnostics and their tally, then terminate the process
    pub fn fatal(&self) -> ! {
        self.print_diagnostics();
        eprintln!("{}", self.summary());
        std::process::exit(1)
    }

    /// Create a summary string
    pub fn summary(&self) -> String {
        match (self.error_count, self.warning_count) {
            (0, 0) => "No errors or warnings".to_string(),
            (0, w) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (e, 0) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (e, w) => format!(
                "{} error{} and {} warning{}",
                e,
                if e == 1 { "" } else { "s" },
                w,
                if w == 1 { "" } else { "s" }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_loc::SourceLocation;

    fn span() -> SourceSpan {
        SourceSpan::new(
            SourceLocation::new("test.abc", 1, 1),
            SourceLocation::new("test.abc", 1, 5),
        )
    }

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::error("Test error".to_string(), span());
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "Test error");
        assert_eq!(diag.span, span());
        assert_eq!(diag.to_string(), "test.abc:1:1-5: error: Test error");
    }

    #[test]
    fn test_error_reporter() {
        let mut reporter = ErrorReporter::new();

        assert!(!reporter.has_errors());
        assert_eq!(reporter.error_count(), 0);

        reporter.error("Test error".to_string(), span());
        assert!(reporter.has_errors());
        assert_eq!(reporter.error_count(), 1);

        reporter.warning("careful".to_string(), span());
        assert_eq!(reporter.warnings().count(), 1);
    }

    #[test]
    fn test_notes_are_not_counted() {
        let mut reporter = ErrorReporter::new();
        reporter.error("redeclaration of 'x'".to_string(), span());
        reporter.note("previous declaration of 'x' is here".to_string(), SourceSpan::on_line(1, 1, 1));

        assert_eq!(reporter.error_count(), 1);
        assert_eq!(reporter.warning_count(), 0);
        assert_eq!(reporter.diagnostics().len(), 2);
        assert_eq!(reporter.diagnostics()[1].severity, Severity::Note);
        assert_eq!(reporter.summary(), "1 error");
    }

    #[test]
    fn test_summary() {
        let mut reporter = ErrorReporter::new();
        assert_eq!(reporter.summary(), "No errors or warnings");

        reporter.error("Error 1".to_string(), span());
        assert_eq!(reporter.summary(), "1 error");

        reporter.error("Error 2".to_string(), span());
        assert_eq!(reporter.summary(), "2 errors");

        reporter.warning("Warning 1".to_string(), span());
        assert_eq!(reporter.summary(), "2 errors and 1 warning");
    }

    #[test]
    fn test_render_location_underlines_span() {
        let source = "x: i32 = 1;\nx = y + 2;\n";
        let span = SourceSpan::on_line(2, 5, 9);
        let text = render_location(source, &span);
        assert_eq!(text, "2 | x = y + 2;\n  |     ^^^^^\n");
    }

    #[test]
    fn test_render_with_source() {
        let mut reporter = ErrorReporter::new();
        reporter.set_source("a = b;");
        let diag = Diagnostic::error("boom".to_string(), SourceSpan::on_line(1, 1, 1));
        let text = reporter.render(&diag);
        assert!(text.starts_with("1 | a = b;\n  | ^\n"));
        assert!(text.ends_with("<input>:1:1: error: boom"));
    }

    #[test]
    fn test_compiler_error_message() {
        let err = CompilerError::semantic_error("dereferencing nullptr".to_string(), span());
        assert_eq!(err.message(), "dereferencing nullptr");
        assert_eq!(err.to_string(), "test.abc:1:1-5: error: dereferencing nullptr");
    }
}
