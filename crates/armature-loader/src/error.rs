//! Error and diagnostic system for the Armature loader.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Labeled spans pointing into the offending document
//! - The offending file path and service identifier
//! - Severity levels, so deprecations can be reported without failing a load
//! - Diagnostic collector for accumulating warnings during a load
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with optional error code, source
//! locations, and help text. A failed load returns a [`LoadError`] wrapping
//! the fatal diagnostic.
//!
//! # Example
//!
//! ```
//! # use armature_loader::error::{Diagnostic, ErrorCode};
//! # use armature_loader::Span;
//!
//! let diag = Diagnostic::error("the \"autowire\" attribute cannot be used together with <autowire> tags")
//!     .with_code(ErrorCode::E100)
//!     .with_file("config/services.xml")
//!     .with_service("app.mailer")
//!     .with_label(Span::new(120..180), "conflicting declaration")
//!     .with_help("remove either the attribute or the tags");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod load_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;
pub(crate) use load_error::Result;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use load_error::LoadError;
pub use severity::Severity;
