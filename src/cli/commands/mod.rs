//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves directories from flags, falling back to config
//! 2. Calls into [`crate::core`]
//! 3. Formats and displays output
//!
//! Handlers return `anyhow::Result` and attach context naming the file or
//! document involved.

mod completion;
mod ingest;
mod list;
mod prefixes;
mod resolve;
mod restamp;
mod show;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use ingest::ingest;
pub use list::list;
pub use prefixes::prefixes;
pub use resolve::resolve;
pub use restamp::restamp;
pub use show::show;

use super::args::Command;
use super::Context;
use crate::core::metadata::MetadataStore;
use anyhow::Result;
use std::path::Path;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Ingest {
            name,
            sql_dir,
            out_dir,
            rows,
            tool_version,
        } => ingest::ingest(
            ctx,
            &name,
            sql_dir.as_deref(),
            out_dir.as_deref(),
            &rows,
            tool_version.as_deref(),
        ),
        Command::Show { name, dir, records } => show::show(ctx, &name, dir.as_deref(), records),
        Command::List { dir } => list::list(ctx, dir.as_deref()),
        Command::Restamp {
            name,
            dir,
            tool_version,
        } => restamp::restamp(ctx, &name, dir.as_deref(), tool_version.as_deref()),
        Command::Prefixes { spec } => prefixes::prefixes(&spec),
        Command::Resolve { name, dir, keys } => resolve::resolve(ctx, &name, dir.as_deref(), &keys),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Document store for `dir`, or the configured output directory.
fn store(ctx: &Context, dir: Option<&Path>) -> MetadataStore {
    MetadataStore::new(dir.unwrap_or(ctx.config.out_dir()))
}
