//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cgmeta - Metadata documents for database-driven code generation
#[derive(Parser, Debug)]
#[command(name = "cgmeta")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this config file instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a metadata document from a query file and its result rows
    #[command(
        name = "ingest",
        long_about = "Build a metadata document from a query file and its result rows.\n\n\
            Reads '<SQL_DIR>/<NAME>.cssql', decodes the rows (a JSON array of objects) \
            into the record type named by the query file, and writes \
            '<OUT_DIR>/<NAME>.json'.",
        after_help = "\
EXAMPLES:
    # Rows exported by the database tooling
    cgmeta ingest --name betalingstype --rows rows.json

    # Read rows from stdin and override the directories
    sqlexport betalingstype | cgmeta ingest --name betalingstype --rows - \\
        --sql-dir sql --out-dir generated/metadata"
    )]
    Ingest {
        /// Query name (file stem of the .cssql and .json files)
        #[arg(long)]
        name: String,

        /// Directory containing the query file
        #[arg(long, value_name = "DIR")]
        sql_dir: Option<PathBuf>,

        /// Directory the document is written to
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// JSON file with the result rows, or '-' for stdin
        #[arg(long, value_name = "FILE")]
        rows: PathBuf,

        /// Tool version to stamp into the document
        #[arg(long, value_name = "VERSION")]
        tool_version: Option<String>,
    },

    /// Show a stored metadata document
    Show {
        /// Query name
        #[arg(long)]
        name: String,

        /// Directory containing the document
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Also print every record
        #[arg(long)]
        records: bool,
    },

    /// List stored metadata documents
    List {
        /// Directory containing the documents
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Rewrite a stored document with a new tool version
    #[command(
        name = "restamp",
        after_help = "\
EXAMPLES:
    # Stamp with the configured (or built-in) tool version
    cgmeta restamp --name betalingstype

    # Stamp with an explicit version
    cgmeta restamp --name betalingstype --tool-version 2.1.0"
    )]
    Restamp {
        /// Query name
        #[arg(long)]
        name: String,

        /// Directory containing the document
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// New tool version
        #[arg(long, value_name = "VERSION")]
        tool_version: Option<String>,
    },

    /// Print the canonical form of a database identifier prefix spec
    #[command(
        name = "prefixes",
        after_help = "\
EXAMPLES:
    cgmeta prefixes 'HB|RT'          # HB=1|RT=1001
    cgmeta prefixes 'B=1000|X'       # B=1000|X=1"
    )]
    Prefixes {
        /// Prefix spec, e.g. 'HB|RT' or 'B=1000'
        spec: String,
    },

    /// Print the generated identifier and value of database keys
    #[command(
        name = "resolve",
        after_help = "\
OUTPUT:
    One line per key: KEY, identifier and value separated by tabs.
    The value is '-' when the key has no numeric suffix."
    )]
    Resolve {
        /// Query name
        #[arg(long)]
        name: String,

        /// Directory containing the document
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Database keys
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
SETUP:
    # Bash
    cgmeta completion bash >> ~/.bashrc

    # Zsh
    cgmeta completion zsh > ~/.zfunc/_cgmeta

    # Fish
    cgmeta completion fish > ~/.config/fish/completions/cgmeta.fish

    # PowerShell
    cgmeta completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
