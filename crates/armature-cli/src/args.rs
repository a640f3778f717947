//! Command-line argument definitions for the Armature CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the input document, where the resolved
//! container is written, configuration file selection, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Armature container loader
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input container document
    #[arg(help = "Path to the input XML document")]
    pub input: String,

    /// Path to the output file; the resolved container is printed when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
