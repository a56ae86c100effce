//! Diagnostic infrastructure for error reporting
//!
//! Two renderings of a [`CheckError`]: a codespan-based [`Diagnostic`] for
//! terminals and tools, and [`render_caret`], the plain numbered excerpt
//! with a caret under the offending column.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, LabelStyle, Severity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream, WriteColor};
use serde::{Deserialize, Serialize};

use super::error::{CheckError, ErrorKind};
use crate::syntax::Span;

/// Error code for a diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        self.0
    }
}

/// A diagnostic message with source code context
pub struct Diagnostic {
    inner: CsDiagnostic<usize>,
    code: Option<ErrorCode>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            inner: CsDiagnostic::new(severity).with_message(message),
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.inner = self.inner.with_code(code.0);
        self.code = Some(code);
        self
    }

    /// Add a primary label (main error location)
    pub fn with_primary_label(mut self, file_id: usize, span: Span, message: impl Into<String>) -> Self {
        let label = Label::primary(file_id, span.start..span.end.max(span.start)).with_message(message);
        self.inner.labels.push(label);
        self
    }

    /// Add a secondary label (related location)
    pub fn with_secondary_label(mut self, file_id: usize, span: Span, message: impl Into<String>) -> Self {
        let label = Label::secondary(file_id, span.start..span.end.max(span.start)).with_message(message);
        self.inner.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.inner.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.inner.notes.push(format!("help: {}", help.into()));
        self
    }

    /// Create diagnostic from a CheckError
    pub fn from_check_error(error: &CheckError, file_id: usize) -> Self {
        let diag = Diagnostic::error(error.message.clone())
            .with_code(error_code(error))
            .with_primary_label(file_id, error.span, label_for(error.kind));

        match error.kind {
            ErrorKind::NonExhaustiveMatch => diag.with_help("add the missing `is` arms or an `other` arm"),
            ErrorKind::DuplicateOrUnreachableCase => diag.with_note("each union element can be matched by one arm only"),
            ErrorKind::UnnarrowableGeneric => diag
                .with_note("generic arguments are erased at runtime")
                .with_help("add a field whose type is exactly the generic parameter"),
            ErrorKind::ShortCircuitOutsideReturnCompatibleFunction => {
                diag.with_help("the residual type must be assignable to the enclosing function's return type")
            }
            ErrorKind::Timeout => diag.with_help("raise `timeout_ms` in the [checker] table of tenecs.toml"),
            _ => diag,
        }
    }

    /// Emit the diagnostic to stderr with colors
    pub fn emit(&self, files: &SimpleFiles<String, String>) -> Result<(), codespan_reporting::files::Error> {
        let mut writer = StandardStream::stderr(ColorChoice::Auto);
        self.emit_to(&mut writer, files)
    }

    pub fn emit_to(
        &self,
        writer: &mut dyn WriteColor,
        files: &SimpleFiles<String, String>,
    ) -> Result<(), codespan_reporting::files::Error> {
        let config = term::Config::default();
        term::emit(writer, &config, files, &self.inner)
    }

    /// Get the underlying codespan diagnostic
    pub fn inner(&self) -> &CsDiagnostic<usize> {
        &self.inner
    }

    /// Convert to JSON representation for editors and scripts
    pub fn to_json(&self, files: &SimpleFiles<String, String>) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&JsonDiagnostic::from_diagnostic(self, files))
    }
}

fn label_for(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::TypeMismatch => "type mismatch",
        ErrorKind::UnresolvedReference => "not found",
        ErrorKind::NotFoundType => "unknown type",
        ErrorKind::DuplicateVariable | ErrorKind::DuplicateDeclaration => "declared again here",
        ErrorKind::NonExhaustiveMatch => "missing cases",
        ErrorKind::DuplicateOrUnreachableCase => "unreachable arm",
        ErrorKind::UnnarrowableGeneric => "cannot be narrowed",
        ErrorKind::ShortCircuitOutsideReturnCompatibleFunction => "short-circuit",
        ErrorKind::Timeout => "check did not finish",
    }
}

/// Get error code for a CheckError
pub fn error_code(error: &CheckError) -> ErrorCode {
    ErrorCode(error.kind.code())
}

/// JSON representation of a diagnostic
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub code: Option<String>,
    pub severity: String,
    pub message: String,
    pub labels: Vec<JsonLabel>,
    pub notes: Vec<String>,
}

/// JSON representation of a diagnostic label
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLabel {
    pub file: String,
    /// 1-indexed
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub message: Option<String>,
    /// `primary` or `secondary`
    pub style: String,
}

impl JsonDiagnostic {
    pub fn from_diagnostic(diag: &Diagnostic, files: &SimpleFiles<String, String>) -> Self {
        let severity = match diag.inner.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
            Severity::Bug => "bug",
        };

        let labels = diag
            .inner
            .labels
            .iter()
            .filter_map(|label| {
                let file = files.get(label.file_id).ok()?;
                let start = file.location((), label.range.start).ok()?;
                let end = file.location((), label.range.end).ok()?;
                Some(JsonLabel {
                    file: file.name().to_string(),
                    start_line: start.line_number,
                    start_column: start.column_number,
                    end_line: end.line_number,
                    end_column: end.column_number,
                    message: Some(label.message.clone()),
                    style: match label.style {
                        LabelStyle::Primary => "primary",
                        LabelStyle::Secondary => "secondary",
                    }
                    .to_string(),
                })
            })
            .collect();

        JsonDiagnostic {
            code: diag.code.as_ref().map(|c| c.0.to_string()),
            severity: severity.to_string(),
            message: diag.inner.message.clone(),
            labels,
            notes: diag.inner.notes.clone(),
        }
    }
}

/// Helper to create a SimpleFiles instance from one source
pub fn create_files(name: impl Into<String>, source: impl Into<String>) -> SimpleFiles<String, String> {
    let mut files = SimpleFiles::new();
    files.add(name.into(), source.into());
    files
}

/// Numbered source excerpt with a caret under the error column
///
/// ```text
/// | 7  | app := Main(
/// | 8  |   main = (runtime: Runtime, other: Runtime) => {
///                 ^ expected 1 params but got 2
/// | 9  |     runtime.console.log("Hello world!")
/// ```
pub fn render_caret(source: &str, error: &CheckError) -> String {
    let lines: Vec<&str> = source.split('\n').collect();
    let line = error.span.line.max(1) as usize;
    let index = line - 1;
    let text = match lines.get(index) {
        Some(text) => *text,
        None => return format!("^ {}", error.message),
    };

    let before = &lines[index.saturating_sub(3)..index];
    let after = &lines[index + 1..(index + 3).min(lines.len())];
    let pad = digits(line + after.len());

    let mut out = Vec::with_capacity(before.len() + after.len() + 2);
    let first = line - before.len();
    for (i, context) in before.iter().enumerate() {
        out.push(numbered(first + i, pad, context));
    }
    out.push(numbered(line, pad, text));
    out.push(format!(
        "{}^ {}",
        " ".repeat(error.span.column as usize + pad + 4),
        error.message
    ));
    for (i, context) in after.iter().enumerate() {
        out.push(numbered(line + 1 + i, pad, context));
    }
    out.join("\n")
}

fn numbered(number: usize, pad: usize, text: &str) -> String {
    format!("| {:<pad$} | {}", number, text, pad = pad)
}

fn digits(mut n: usize) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_at(kind: ErrorKind, line: u32, column: u32, message: &str) -> CheckError {
        CheckError::new(kind, "main.10x", Span::new(0, 0, line, column), message)
    }

    #[test]
    fn test_diagnostic_with_code() {
        let diag = Diagnostic::from_check_error(&error_at(ErrorKind::NonExhaustiveMatch, 1, 1, "missing cases for Int"), 0);
        assert_eq!(diag.code, Some(ErrorCode("E2006")));
        assert_eq!(diag.inner().severity, Severity::Error);
        assert!(diag.inner().notes.iter().any(|n| n.starts_with("help:")));
    }

    #[test]
    fn test_json_output() {
        let source = "package main\n\nx: Int := \"a\"\n";
        let mut error = error_at(ErrorKind::TypeMismatch, 3, 11, "expected type Int but found String");
        error.span.start = 24;
        error.span.end = 27;
        let diag = Diagnostic::from_check_error(&error, 0);
        let files = create_files("main.10x", source);

        let json = diag.to_json(&files).unwrap();
        let parsed: JsonDiagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.code.as_deref(), Some("E2001"));
        assert_eq!(parsed.labels.len(), 1);
        assert_eq!(parsed.labels[0].start_line, 3);
        assert_eq!(parsed.labels[0].style, "primary");
    }

    #[test]
    fn test_emit_to_buffer() {
        let files = create_files("main.10x", "package main\n");
        let diag = Diagnostic::from_check_error(&error_at(ErrorKind::Timeout, 1, 1, "slow"), 0);
        let mut buffer = termcolor::Buffer::no_color();
        diag.emit_to(&mut buffer, &files).unwrap();
        let rendered = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(rendered.contains("E2010"));
        assert!(rendered.contains("slow"));
    }

    #[test]
    fn test_render_single_line() {
        let error = error_at(ErrorKind::TypeMismatch, 1, 9, "package name should start with a lowercase letter");
        let rendered = render_caret("package MyPackage", &error);
        assert_eq!(
            rendered,
            "| 1 | package MyPackage\n              ^ package name should start with a lowercase letter"
        );
    }

    #[test]
    fn test_render_context_lines() {
        let source = "\npackage main\n\nimport tenecs.go.Runtime\nimport tenecs.go.Main\n\napp := Main(\n  main = (runtime: Runtime, other: Runtime) => {\n    runtime.console.log(\"Hello world!\")\n  }\n)\n";
        let error = error_at(ErrorKind::TypeMismatch, 8, 10, "expected 1 params but got 2");
        let rendered = render_caret(source, &error);
        let expected = [
            "| 5  | import tenecs.go.Main",
            "| 6  | ",
            "| 7  | app := Main(",
            "| 8  |   main = (runtime: Runtime, other: Runtime) => {",
            "                ^ expected 1 params but got 2",
            "| 9  |     runtime.console.log(\"Hello world!\")",
            "| 10 |   }",
        ]
        .join("\n");
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_out_of_range() {
        let error = error_at(ErrorKind::TypeMismatch, 40, 1, "oops");
        assert_eq!(render_caret("package main", &error), "^ oops");
    }
}
