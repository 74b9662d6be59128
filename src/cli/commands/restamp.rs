//! restamp command - Rewrite a document with a new tool version

use super::store;
use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};
use std::path::Path;

/// Rewrite a stored document with `tool_version` (or the configured one).
///
/// Records and all other fields are kept as they are.
pub fn restamp(
    ctx: &Context,
    name: &str,
    dir: Option<&Path>,
    tool_version: Option<&str>,
) -> Result<()> {
    let store = store(ctx, dir);
    let doc = store
        .read(name, &ctx.registry)
        .with_context(|| format!("Failed to read metadata for '{}'", name))?;

    let version = tool_version.unwrap_or(ctx.config.tool_version());
    let restamped = doc.with_tool_version(version);
    let path = store
        .write(&restamped)
        .with_context(|| format!("Failed to save metadata for '{}'", name))?;

    output::print(
        format!(
            "Restamped {}: {} -> {}",
            path.display(),
            doc.tool_version(),
            restamped.tool_version()
        ),
        ctx.verbosity,
    );

    Ok(())
}
