//! user facing problems
//!
//! Most operations in this crate do not fail with a single error. They collect [Diagnostic]s into
//! [Diagnostics] so that callers can report every problem at once. A [Diagnostic] can point to
//! the part of the input it is about via a [SourceRange].
//!
//! Use [Diagnostics::err] to turn the collected errors into a regular [std::error::Error].
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Byte range in a named source
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct SourceRange {
    pub filename: String,
    pub start: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(filename: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            filename: filename.into(),
            start: span.start,
            end: span.end,
        }
    }

    /// Smallest range covering both `self` and `other`
    pub fn to(&self, other: &SourceRange) -> SourceRange {
        SourceRange {
            filename: self.filename.clone(),
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filename.is_empty() {
            write!(f, "<input>:{}-{}", self.start, self.end)
        } else {
            write!(f, "{}:{}-{}", self.filename, self.start, self.end)
        }
    }
}

/// Machine readable details that travel with a [Diagnostic]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticExtra {
    /// A call to a function that is not in the function table.
    ///
    /// `namespace` includes the trailing `::` and is empty for unqualified calls.
    FunctionCallUnknown { namespace: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<SourceRange>,
    #[serde(skip)]
    pub extra: Option<DiagnosticExtra>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            subject: None,
            extra: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(summary, detail)
        }
    }

    pub fn with_subject(mut self, subject: impl Into<Option<SourceRange>>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_extra(mut self, extra: DiagnosticExtra) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            f.write_str(&self.summary)
        } else {
            write!(f, "{}: {}", self.summary, self.detail)
        }
    }
}

/// Ordered collection of [Diagnostic]s
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(severity = ?diagnostic.severity, summary = %diagnostic.summary, "diagnostic recorded");
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in other {
            self.push(diagnostic);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Diagnostic> {
        self.0.iter_mut()
    }

    /// Errors only, as a [std::error::Error]. `None` when there are no errors.
    pub fn err(&self) -> Option<DiagnosticsError> {
        let errors: Vec<_> = self.0.iter().filter(|d| d.is_error()).cloned().collect();
        if errors.is_empty() {
            None
        } else {
            Some(DiagnosticsError { errors })
        }
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(value: Diagnostic) -> Self {
        Diagnostics(vec![value])
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<T: IntoIterator<Item = Diagnostic>>(iter: T) -> Self {
        Diagnostics(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", render_errors(.errors))]
pub struct DiagnosticsError {
    pub errors: Vec<Diagnostic>,
}

fn render_errors(errors: &[Diagnostic]) -> String {
    match errors {
        [single] => single.to_string(),
        many => {
            let mut rendered = format!("{} problems:\n", many.len());
            for error in many {
                rendered.push_str(&format!("\n- {error}"));
            }
            rendered
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_error_renders_summary_and_detail() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning("Deprecated", "ignored by err()"));
        assert!(!diags.has_errors());
        assert!(diags.err().is_none());

        diags.push(Diagnostic::error("Invalid address", "A resource name is required."));
        assert!(diags.has_errors());
        assert_eq!(
            diags.err().unwrap().to_string(),
            "Invalid address: A resource name is required."
        );
    }

    #[test]
    fn several_errors_are_counted() {
        let diags: Diagnostics = [
            Diagnostic::error("First", "one"),
            Diagnostic::error("Second", ""),
        ]
        .into_iter()
        .collect();

        insta::assert_snapshot!(diags.err().unwrap(), @r"
        2 problems:

        - First: one
        - Second
        ");
    }

    #[test]
    fn range_union() {
        let a = SourceRange::new("main.tf", 4..9);
        let b = SourceRange::new("main.tf", 12..20);
        assert_eq!(a.to(&b), SourceRange::new("main.tf", 4..20));
        assert_eq!(a.to(&b).to_string(), "main.tf:4-20");
    }
}
