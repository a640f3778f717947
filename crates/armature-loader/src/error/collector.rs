//! Collector for accumulating diagnostics during a load.
//!
//! Deprecations do not abort a load. The [`DiagnosticCollector`] gathers
//! them, logs each one as it arrives, and hands them back once the load
//! completes.

use log::warn;

use crate::error::{Diagnostic, LoadError};

/// A collector for accumulating diagnostics during a load.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    ///
    /// Warnings are logged immediately.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        } else {
            warn!(
                code = diagnostic.code().map(|code| code.as_str()).unwrap_or(""),
                file:? = diagnostic.file();
                "{}", diagnostic.message()
            );
        }
        self.diagnostics.push(diagnostic);
    }

    /// Finish collection.
    ///
    /// - If errors were emitted, returns `Err(LoadError)` with all diagnostics.
    /// - Otherwise returns the collected warnings.
    pub fn finish(self) -> Result<Vec<Diagnostic>, LoadError> {
        if self.has_errors {
            Err(LoadError::new(self.diagnostics))
        } else {
            Ok(self.diagnostics)
        }
    }

    /// Finish with a fatal diagnostic, keeping earlier warnings after it.
    pub fn fail(self, fatal: Diagnostic) -> LoadError {
        let mut diagnostics = Vec::with_capacity(self.diagnostics.len() + 1);
        diagnostics.push(fatal);
        diagnostics.extend(self.diagnostics);
        LoadError::new(diagnostics)
    }
}
