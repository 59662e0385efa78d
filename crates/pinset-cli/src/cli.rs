//! CLI argument definitions for pinset.
//!
//! Uses `clap` derive macros. Each command corresponds to a handler in the
//! [`super::commands`] module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pinset",
    version,
    about = "Compile loose Python requirements into a fully pinned set",
    long_about = "pinset resolves abstract requirements such as `Flask` or \
                  `ipython[notebook]` against a package index into exact, \
                  reproducible `name==version` pins."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve requirements and print one pin per line
    Compile {
        #[command(flatten)]
        resolve: ResolveArgs,
        /// Write the pins to a file instead of stdout
        #[arg(short, long)]
        output_file: Option<PathBuf>,
    },

    /// Resolve requirements and display the dependency tree
    Tree {
        #[command(flatten)]
        resolve: ResolveArgs,
        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,
        /// Show the path from the top-level requirements to a package
        #[arg(long, value_name = "PACKAGE")]
        why: Option<String>,
        /// Show what depends on a package
        #[arg(short, long, value_name = "PACKAGE")]
        invert: Option<String>,
    },
}

/// Inputs shared by every command that runs a resolve.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Top-level requirements, e.g. `Flask` or `ipython[notebook]>=2.0`
    #[arg(required = true, value_name = "REQUIREMENT")]
    pub requirements: Vec<String>,

    /// Package index file (TOML)
    #[arg(long, env = "PINSET_INDEX")]
    pub index: PathBuf,

    /// Constrain a package's version without requiring it
    #[arg(short, long = "constraint", value_name = "REQUIREMENT")]
    pub constraints: Vec<String>,

    /// Allow pre-release versions
    #[arg(long)]
    pub pre: bool,

    /// Keep unsafe packages (pip, setuptools, ...) in the output
    #[arg(long)]
    pub allow_unsafe: bool,

    /// Give up after this many rounds
    #[arg(long, value_name = "N")]
    pub max_rounds: Option<usize>,

    /// Configuration file [default: pinset.toml if present]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Parse CLI arguments from `std::env::args`.
pub fn parse() -> Cli {
    Cli::parse()
}
