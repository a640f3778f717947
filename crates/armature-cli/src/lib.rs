//! CLI logic for the Armature container loader.
//!
//! This module contains the core CLI logic: loading configuration, loading
//! the container document and writing the resolved container.

pub mod error_adapter;

mod args;
mod config;
mod report;

pub use args::Args;

use std::fs;

use log::info;

use armature::{ArmatureError, ContainerLoader, Diagnostic};

/// Run the Armature CLI application
///
/// This function loads the input document with everything it imports and
/// writes the resolved parameters, services and aliases to the output file,
/// or to standard output when no output file is given.
///
/// Returns the warnings reported while loading.
///
/// # Errors
///
/// Returns `ArmatureError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Load errors (malformed documents, configuration conflicts, ...)
pub fn run(args: &Args) -> Result<Vec<Diagnostic>, ArmatureError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Loading container"
    );

    // Load configuration
    let loader_config = config::load_config(args.config.as_ref())?;

    // Load the container document
    let loader = ContainerLoader::new(loader_config);
    let loaded = loader.load(&args.input)?;

    let text = report::render(loaded.container());
    match &args.output {
        Some(output) => {
            fs::write(output, text)?;
            info!(output_file = output; "Container written successfully");
        }
        None => print!("{text}"),
    }

    Ok(loaded.warnings().to_vec())
}
