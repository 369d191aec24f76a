//! Command-line argument definitions for the Schemata CLI.

use clap::Parser;

/// Command-line arguments for the Schemata schema diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input schema file (TOML)
    #[arg(help = "Path to the schema file")]
    pub input: String,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Seed for the layout simulation, overriding the configuration
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the computed positions back to the schema file
    #[arg(long)]
    pub persist_positions: bool,
}
