// src/cli.rs
//! CLI definitions for legacymod
//!
//! Argument definitions only; the commands live in `commands`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "legacymod")]
#[command(version)]
#[command(about = "Retrofit legacy jars with module descriptors", long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Turn legacy jars into modules
    Transform {
        /// Registry configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for rewritten jars
        #[arg(short, long)]
        output: PathBuf,

        /// Directory for the persistent transform cache
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Name of the view the jars are resolved for
        #[arg(long, default_value = "compileClasspath")]
        view: String,

        /// Jars to transform
        #[arg(required = true)]
        jars: Vec<PathBuf>,
    },

    /// Show the module name and version inferred from archive names
    Infer {
        /// Archive file names
        #[arg(required = true)]
        ids: Vec<String>,

        /// Extension marker
        #[arg(long, default_value = ".jar")]
        extension: String,
    },

    /// Show module information for a jar
    Inspect {
        /// Jar to inspect
        jar: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate a registry configuration file
    CheckConfig {
        /// Registry configuration file (TOML)
        config: PathBuf,
    },
}
