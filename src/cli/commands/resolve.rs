//! resolve command - Show generated identifiers and values for database keys

use super::store;
use crate::cli::Context;
use crate::core::prefixes::PrefixError;
use crate::ui::output;
use anyhow::{Context as _, Result};
use std::path::Path;

/// Print `KEY<TAB>identifier<TAB>value` for each key, using the prefixes of
/// the stored document `name`.
///
/// A key without a numeric suffix prints `-` as its value. A key without a
/// recognized prefix is an error.
pub fn resolve(ctx: &Context, name: &str, dir: Option<&Path>, keys: &[String]) -> Result<()> {
    let store = store(ctx, dir);
    let doc = store
        .read(name, &ctx.registry)
        .with_context(|| format!("Failed to read metadata for '{}'", name))?;

    for key in keys {
        let identifier = doc
            .identifier(key)
            .with_context(|| format!("Cannot resolve '{}'", key))?;
        let value = match doc.value(key) {
            Ok(value) => value.to_string(),
            Err(PrefixError::InvalidNumericSuffix(_)) => "-".to_string(),
            Err(e) => return Err(e).with_context(|| format!("Cannot resolve '{}'", key)),
        };
        output::data(format!("{}\t{}\t{}", key, identifier, value));
    }

    Ok(())
}
