//! Shared colored output utilities for CLI commands.
//!
//! Uses `termcolor` for cross-platform colored terminal output.
//! Respects `NO_COLOR` environment variable and `--color` flag.

use crate::commands::files::LoadedFile;
use crate::Format;
use serde::Serialize;
use std::io::Write;
use tenecs_engine::checker::diagnostic::create_files;
use tenecs_engine::{render_caret, CheckError, CheckOutput, Diagnostic, FoundTests, Runnables};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve `ColorChoice` from CLI flag and environment.
///
/// Priority: `NO_COLOR` env > `--color` flag > auto-detect TTY.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Styled output writer for terminal.
pub struct StyledOutput {
    stdout: StandardStream,
    stderr: StandardStream,
}

impl StyledOutput {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stdout: StandardStream::stdout(choice),
            stderr: StandardStream::stderr(choice),
        }
    }

    /// Write a line with a specific color and style.
    pub fn writeln_styled(&mut self, text: &str, color: Option<Color>, bold: bool) {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        let _ = self.stdout.set_color(&spec);
        let _ = writeln!(self.stdout, "{}", text);
        let _ = self.stdout.reset();
    }

    /// Green bold line.
    pub fn success(&mut self, text: &str) {
        self.writeln_styled(text, Some(Color::Green), true);
    }

    /// Red bold line on stderr.
    pub fn failure(&mut self, text: &str) {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(Color::Red)).set_bold(true);
        let _ = self.stderr.set_color(&spec);
        let _ = writeln!(self.stderr, "{}", text);
        let _ = self.stderr.reset();
    }

    /// Cyan line.
    pub fn heading(&mut self, text: &str) {
        self.writeln_styled(text, Some(Color::Cyan), true);
    }

    /// Plain line.
    pub fn line(&mut self, text: &str) {
        let _ = writeln!(self.stdout, "{}", text);
    }

    pub fn stderr(&mut self) -> &mut StandardStream {
        &mut self.stderr
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Print every error in the requested format (JSON goes through [`Summary`])
pub fn report_errors(out: &mut StyledOutput, errors: &[CheckError], loaded: &[LoadedFile], format: Format) {
    for error in errors {
        let source = loaded
            .iter()
            .find(|l| l.file.name == error.file)
            .and_then(|l| l.source.as_deref());
        match (format, source) {
            (Format::Pretty, Some(source)) => {
                let files = create_files(error.file.clone(), source);
                let rendered = Diagnostic::from_check_error(error, 0).emit_to(out.stderr(), &files);
                if rendered.is_err() {
                    plain_error(out, error);
                }
            }
            (Format::Caret, Some(source)) => {
                plain_error(out, error);
                let _ = writeln!(out.stderr(), "{}\n", render_caret(source, error));
            }
            _ => plain_error(out, error),
        }
    }
    let noun = if errors.len() == 1 { "error" } else { "errors" };
    out.failure(&format!("{} {}", errors.len(), noun));
}

fn plain_error(out: &mut StyledOutput, error: &CheckError) {
    let _ = writeln!(
        out.stderr(),
        "{}:{}:{}: error[{}]: {}",
        error.file,
        error.span.line,
        error.span.column,
        error.kind.code(),
        error.message
    );
}

// ============================================================================
// JSON summary
// ============================================================================

#[derive(Serialize)]
pub struct Summary<'a> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<&'a str>,
    pub declarations: Vec<DeclarationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<&'a FoundTests>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runnables: Option<&'a Runnables>,
    pub errors: Vec<ErrorSummary<'a>>,
}

#[derive(Serialize)]
pub struct DeclarationSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub variable_type: String,
}

#[derive(Serialize)]
pub struct ErrorSummary<'a> {
    pub code: &'static str,
    pub kind: String,
    pub message: &'a str,
    pub file: &'a str,
    pub line: u32,
    pub column: u32,
}

impl<'a> Summary<'a> {
    pub fn from_result(result: &'a Result<CheckOutput, Vec<CheckError>>) -> Self {
        match result {
            Ok(output) => Summary {
                ok: true,
                package: Some(&output.program.package),
                declarations: output
                    .program
                    .declarations
                    .iter()
                    .map(|d| DeclarationSummary {
                        name: d.name.clone(),
                        variable_type: d.variable_type().to_string(),
                    })
                    .collect(),
                tests: Some(&output.tests),
                runnables: Some(&output.runnables),
                errors: Vec::new(),
            },
            Err(errors) => Summary {
                ok: false,
                package: None,
                declarations: Vec::new(),
                tests: None,
                runnables: None,
                errors: errors
                    .iter()
                    .map(|e| ErrorSummary {
                        code: e.kind.code(),
                        kind: e.kind.to_string(),
                        message: &e.message,
                        file: &e.file,
                        line: e.span.line,
                        column: e.span.column,
                    })
                    .collect(),
            },
        }
    }

    pub fn print(&self) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}
