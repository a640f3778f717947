//! Error adapter for converting loader diagnostics to miette diagnostics.
//!
//! This module provides the bridge between the library's error types and
//! miette's rich diagnostic formatting used in the CLI.
//!
//! # Multi-Error Support
//!
//! A [`LoadError`](armature_loader::error::LoadError) may carry several
//! diagnostics, and each one may point into a different document. Every
//! diagnostic is rendered independently against the source of its own file.

use std::{fmt, fs, path::Path};

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, NamedSource, SourceSpan};

use armature::{ArmatureError, Diagnostic, Severity};

/// Adapter for a single loader diagnostic.
///
/// This adapter wraps a single [`Diagnostic`] and implements
/// [`MietteDiagnostic`] to enable rich error formatting in the CLI.
pub struct DiagnosticAdapter<'a> {
    /// The wrapped diagnostic
    diag: &'a Diagnostic,
    /// Source of the document the diagnostic points into
    src: Option<NamedSource<String>>,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create a new diagnostic adapter.
    pub fn new(diag: &'a Diagnostic, src: Option<String>) -> Self {
        let name = diag
            .file()
            .map(|file| file.display().to_string())
            .unwrap_or_default();
        Self {
            diag,
            src: src.map(|src| NamedSource::new(name, src)),
        }
    }

    /// Create an adapter, reading the source from the diagnostic's file.
    pub fn from_file(diag: &'a Diagnostic) -> Self {
        let src = diag.file().and_then(read_source);
        Self::new(diag, src)
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diag.service() {
            Some(service) => write!(f, "{} (service \"{service}\")", self.diag.message()),
            None => write!(f, "{}", self.diag.message()),
        }
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.diag.severity() {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.src
            .as_ref()
            .map(|src| src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() || self.src.is_none() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let span = span_to_miette(label.span());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// Adapter for non-diagnostic [`ArmatureError`] variants.
///
/// This adapter handles errors that don't have rich diagnostic information,
/// such as I/O and configuration errors.
pub struct ErrorAdapter<'a>(pub &'a ArmatureError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            ArmatureError::Io(_) => "armature::io",
            ArmatureError::Load { .. } => return None,
            ArmatureError::Config(_) => "armature::config",
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
///
/// This enum wraps either a single diagnostic or a non-diagnostic error,
/// providing a uniform interface for error rendering.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A rich diagnostic with source location information.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn severity(&self) -> Option<miette::Severity> {
        match self {
            Reportable::Diagnostic(d) => d.severity(),
            Reportable::Error(e) => e.severity(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert an armature [`Span`](armature_loader::Span) to a miette [`SourceSpan`].
fn span_to_miette(span: armature_loader::Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

fn read_source(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

/// Convert an [`ArmatureError`] into a list of reportable errors.
///
/// For [`ArmatureError::Load`], this returns one [`Reportable`] for each
/// diagnostic in the error; the fatal one uses the source carried by the
/// error. For other error variants, this returns a single [`Reportable`].
pub fn to_reportables(err: &ArmatureError) -> Vec<Reportable<'_>> {
    match err {
        ArmatureError::Load {
            err: load_err,
            src,
        } => load_err
            .diagnostics()
            .iter()
            .enumerate()
            .map(|(idx, d)| match src {
                Some(src) if idx == 0 => {
                    Reportable::Diagnostic(DiagnosticAdapter::new(d, Some(src.clone())))
                }
                _ => Reportable::Diagnostic(DiagnosticAdapter::from_file(d)),
            })
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

/// Convert load warnings into reportables.
pub fn warnings_to_reportables(warnings: &[Diagnostic]) -> Vec<Reportable<'_>> {
    warnings
        .iter()
        .map(|d| Reportable::Diagnostic(DiagnosticAdapter::from_file(d)))
        .collect()
}

#[cfg(test)]
mod tests {
    use armature::ErrorCode;
    use armature_loader::{Span, error::LoadError};

    use super::*;

    #[test]
    fn test_single_diagnostic() {
        let diag = Diagnostic::error("test error")
            .with_code(ErrorCode::E100)
            .with_service("app.mailer")
            .with_label(Span::new(0..5), "here")
            .with_help("try this");
        let err = ArmatureError::new_load_error(LoadError::new(vec![diag]), Some("hello".into()));

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        match &reportables[0] {
            Reportable::Diagnostic(d) => {
                assert_eq!(d.to_string(), "test error (service \"app.mailer\")");
                assert!(d.source_code().is_some());
                assert_eq!(d.labels().map(Iterator::count), Some(1));
            }
            Reportable::Error(_) => panic!("Expected Diagnostic"),
        }
    }

    #[test]
    fn test_multiple_diagnostics() {
        let diags = vec![
            Diagnostic::error("first error")
                .with_code(ErrorCode::E101)
                .with_label(Span::new(0..5), "first"),
            Diagnostic::warning("second warning")
                .with_code(ErrorCode::E300)
                .with_label(Span::new(10..15), "second"),
        ];
        let err = ArmatureError::new_load_error(
            LoadError::new(diags),
            Some("source code here...".into()),
        );

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 2);
        assert_eq!(reportables[0].to_string(), "first error");
        assert_eq!(reportables[1].to_string(), "second warning");
        assert_eq!(reportables[1].severity(), Some(miette::Severity::Warning));
        // The second diagnostic names no file, so there is nothing to show.
        assert!(reportables[1].labels().is_none());
    }

    #[test]
    fn test_warning_reads_its_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("services.xml");
        fs::write(&path, "<container/>").expect("write");

        let warnings = vec![
            Diagnostic::warning("deprecated")
                .with_file(&path)
                .with_label(Span::new(0..12), "here"),
        ];
        let reportables = warnings_to_reportables(&warnings);

        assert_eq!(reportables.len(), 1);
        assert!(reportables[0].source_code().is_some());
    }

    #[test]
    fn test_non_load_error() {
        let err = ArmatureError::Config("bad extension".to_string());

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "Configuration error: bad extension");
                assert_eq!(e.code().map(|code| code.to_string()).as_deref(), Some("armature::config"));
            }
            Reportable::Diagnostic(_) => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_primary_flag_on_labels() {
        let diag = Diagnostic::error("error with labels")
            .with_label(Span::new(0..5), "primary")
            .with_secondary_label(Span::new(10..15), "secondary");

        let adapter = DiagnosticAdapter::new(&diag, Some("some source code".to_string()));

        let labels: Vec<_> = adapter.labels().expect("labels").collect();
        assert_eq!(labels.len(), 2);
        assert!(labels[0].primary());
        assert!(!labels[1].primary());
    }
}
