//! list command - List stored metadata documents

use super::store;
use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};
use std::path::Path;

/// Print the query name of every document in the directory.
pub fn list(ctx: &Context, dir: Option<&Path>) -> Result<()> {
    let store = store(ctx, dir);
    let names = store
        .list()
        .with_context(|| format!("Failed to list '{}'", store.dir().display()))?;

    if names.is_empty() {
        output::print(
            format!("No metadata documents in {}", store.dir().display()),
            ctx.verbosity,
        );
        return Ok(());
    }

    for name in names {
        output::data(name);
    }

    Ok(())
}
