//! Error types for Armature operations.
//!
//! This module provides the main error type [`ArmatureError`] which wraps
//! the error conditions of loading a container.

use std::io;

use thiserror::Error;

use armature_loader::error::LoadError;

/// The main error type for Armature operations.
///
/// # Diagnostic Variants
///
/// The `Load` variant carries the loader diagnostics together with the
/// source text of the document the fatal diagnostic points into, when it
/// could be read. This is enough to render source snippets.
#[derive(Debug, Error)]
pub enum ArmatureError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Load { err: LoadError, src: Option<String> },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ArmatureError {
    /// Create a new `Load` error with the associated source code.
    pub fn new_load_error(err: LoadError, src: Option<String>) -> Self {
        Self::Load { err, src }
    }
}
