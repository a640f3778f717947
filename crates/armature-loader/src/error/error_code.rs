//! Error codes for the Armature diagnostic system.
//!
//! Error codes are organized by category:
//! - `E0xx` - Structural errors (unreadable, malformed or invalid documents)
//! - `E1xx` - Configuration conflicts inside service declarations
//! - `E2xx` - Extension errors
//! - `E3xx` - Deprecations, reported as warnings

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Structural Errors (E0xx)
    // =========================================================================
    /// Malformed document.
    ///
    /// The file is not well-formed XML.
    E001,

    /// Schema validation failure.
    ///
    /// The document is well-formed but does not follow the schema of one of
    /// its namespaces.
    E002,

    /// Missing XSD file.
    ///
    /// An extension declares a schema file that does not exist.
    E003,

    /// Resource not found.
    ///
    /// The requested document could not be located or read.
    E004,

    /// Circular import.
    ///
    /// A document imports itself, directly or through other documents.
    E005,

    /// Unsupported resource.
    ///
    /// The resource is not a file this loader can handle.
    E006,

    // =========================================================================
    // Configuration Conflicts (E1xx)
    // =========================================================================
    /// Autowire attribute combined with `<autowire>` tags.
    E100,

    /// Empty tag name.
    E101,

    /// Undefined constant.
    ///
    /// A `type="constant"` argument names a constant the host does not define.
    E102,

    /// Inline definitions nested too deeply.
    E103,

    /// Invalid attribute value.
    ///
    /// An attribute is missing or holds a value that cannot be used here.
    E104,

    // =========================================================================
    // Extension Errors (E2xx)
    // =========================================================================
    /// No extension for namespace.
    ///
    /// A top-level element belongs to a namespace no registered extension claims.
    E200,

    // =========================================================================
    // Deprecations (E3xx)
    // =========================================================================
    /// Unsupported attribute on an alias declaration.
    E300,

    /// Unsupported element inside an alias declaration.
    E301,

    /// Top-level service without identifier.
    E302,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Structural errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            // Configuration conflicts
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            // Extension errors
            ErrorCode::E200 => "E200",
            // Deprecations
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Structural errors
            ErrorCode::E001 => "malformed document",
            ErrorCode::E002 => "schema validation failed",
            ErrorCode::E003 => "missing XSD file",
            ErrorCode::E004 => "resource not found",
            ErrorCode::E005 => "circular import",
            ErrorCode::E006 => "unsupported resource",
            // Configuration conflicts
            ErrorCode::E100 => "conflicting autowire declarations",
            ErrorCode::E101 => "empty tag name",
            ErrorCode::E102 => "undefined constant",
            ErrorCode::E103 => "inline definitions nested too deeply",
            ErrorCode::E104 => "invalid attribute value",
            // Extension errors
            ErrorCode::E200 => "no extension for namespace",
            // Deprecations
            ErrorCode::E300 => "unsupported alias attribute",
            ErrorCode::E301 => "unsupported alias element",
            ErrorCode::E302 => "anonymous top-level service",
        }
    }

    /// Returns `true` for codes that abort a load.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ErrorCode::E300 | ErrorCode::E301 | ErrorCode::E302)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
