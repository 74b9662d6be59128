//! cli
//!
//! Command-line interface layer for cgmeta.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and install the log subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers resolve paths from flags and config, call
//! into [`crate::core`], and print results through [`crate::ui::output`].
//! Logs go to stderr through `tracing`; command output goes to stdout.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::core::config::Config;
use crate::core::record::RecordRegistry;
use crate::ui::output::{self, Verbosity};
use anyhow::{Context as _, Result};
use tracing::Level;

/// Shared state for command handlers.
#[derive(Debug)]
pub struct Context {
    /// Loaded configuration.
    pub config: Config,
    /// Record shapes documents may use.
    pub registry: RecordRegistry,
    /// Output verbosity.
    pub verbosity: Verbosity,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    init_logging(verbosity);

    let loaded = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    for warning in &loaded.warnings {
        output::warn(
            format!("{} ({})", warning.message, warning.path.display()),
            verbosity,
        );
    }
    if let Some(path) = loaded.config.loaded_from() {
        tracing::debug!(path = %path.display(), "loaded config");
    }

    let ctx = Context {
        config: loaded.config,
        registry: RecordRegistry::with_builtins(),
        verbosity,
    };

    // Dispatch to command handler
    commands::dispatch(cli.command, &ctx)
}

/// Install the stderr log subscriber.
fn init_logging(verbosity: Verbosity) {
    let level = match verbosity {
        Verbosity::Quiet => Level::WARN,
        Verbosity::Normal => Level::INFO,
        Verbosity::Debug => Level::DEBUG,
    };

    // A subscriber may already be installed when running inside tests.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
