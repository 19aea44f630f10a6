//! Diagnostics sink.
//!
//! The checker reports every problem here as a `(position, message, severity)`
//! triple and keeps going. Locations render as `file(line:col)` using the file
//! table registered with [`Diagnostics::add_file`].
//!
//! Candidate evaluation during overload selection runs with the sink
//! suppressed: errors raised then are counted but not recorded.

use std::fmt;

use crate::error::{CheckError, ErrorKind};
use crate::ids::FileId;
use crate::span::Span;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single reported diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Error kind, when the diagnostic came from a [`CheckError`].
    pub kind: Option<ErrorKind>,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Collects diagnostics for one checking session.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    files: Vec<String>,
    items: Vec<Diagnostic>,
    suppress_depth: u32,
    suppressed_errors: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file name and return its id.
    pub fn add_file(&mut self, name: impl Into<String>) -> FileId {
        self.files.push(name.into());
        FileId::new((self.files.len() - 1) as u32)
    }

    /// Name of a registered file, or `<unknown>` if the id was never registered.
    pub fn file_name(&self, file: FileId) -> &str {
        self.files
            .get(file.index() as usize)
            .map(String::as_str)
            .unwrap_or("<unknown>")
    }

    /// Render a span as `file(line:col)`.
    pub fn location(&self, span: Span) -> String {
        format!("{}({}:{})", self.file_name(span.file), span.line, span.col)
    }

    /// Report a checking error.
    pub fn report(&mut self, error: CheckError) {
        if self.suppress_depth > 0 {
            self.suppressed_errors += 1;
            return;
        }
        self.items.push(Diagnostic {
            severity: Severity::Error,
            kind: Some(error.kind()),
            span: error.span(),
            message: error.message().to_string(),
        });
    }

    pub fn warning(&mut self, span: Span, message: impl Into<String>) {
        self.push_plain(Severity::Warning, span, message.into());
    }

    pub fn info(&mut self, span: Span, message: impl Into<String>) {
        self.push_plain(Severity::Info, span, message.into());
    }

    fn push_plain(&mut self, severity: Severity, span: Span, message: String) {
        if self.suppress_depth > 0 {
            return;
        }
        self.items.push(Diagnostic {
            severity,
            kind: None,
            span,
            message,
        });
    }

    /// Start dropping reports until the matching [`Diagnostics::unsuppress`].
    pub fn suppress(&mut self) {
        self.suppress_depth += 1;
    }

    pub fn unsuppress(&mut self) {
        self.suppress_depth = self.suppress_depth.saturating_sub(1);
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress_depth > 0
    }

    /// Number of recorded errors.
    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    /// Recorded plus suppressed errors; grows whenever any error is raised.
    pub fn total_errors(&self) -> usize {
        self.error_count() + self.suppressed_errors
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Iterate over error diagnostics only.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    /// Whether any recorded error message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.items.iter().any(|d| d.message.contains(needle))
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }

    /// Render one diagnostic with its location.
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let prefix = match diagnostic.severity {
            Severity::Error => "",
            Severity::Warning => "Warning: ",
            Severity::Info => "Info: ",
        };
        format!(
            "{} {}{}",
            self.location(diagnostic.span),
            prefix,
            diagnostic.message
        )
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", self.render(diagnostic))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_renders_file_location() {
        let mut diags = Diagnostics::new();
        let file = diags.add_file("main.quill");
        let span = Span::new(3, 7, 1).in_file(file);
        diags.report(CheckError::new(ErrorKind::Name, span, "Undeclared name: x"));

        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.to_string(), "main.quill(3:7) Undeclared name: x");
    }

    #[test]
    fn suppressed_errors_are_counted_not_recorded() {
        let mut diags = Diagnostics::new();
        diags.suppress();
        diags.report(CheckError::new(ErrorKind::TypeMismatch, Span::default(), "nope"));
        diags.unsuppress();

        assert!(diags.is_empty());
        assert_eq!(diags.total_errors(), 1);
        assert!(!diags.is_suppressed());
    }

    #[test]
    fn warnings_are_not_errors() {
        let mut diags = Diagnostics::new();
        diags.add_file("a.quill");
        diags.warning(Span::new(1, 1, 0), "unused");
        assert!(!diags.has_errors());
        assert_eq!(diags.to_string(), "a.quill(1:1) Warning: unused");
    }
}
