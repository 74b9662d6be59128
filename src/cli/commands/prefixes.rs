//! prefixes command - Canonicalize a prefix spec

use crate::core::prefixes::PrefixMap;
use crate::ui::output;
use anyhow::{Context as _, Result};
use tracing::debug;

/// Print the canonical `NAME=INTEGER|...` form of `spec`.
pub fn prefixes(spec: &str) -> Result<()> {
    let map = PrefixMap::parse(spec).with_context(|| format!("Invalid prefix spec '{}'", spec))?;
    debug!(count = map.len(), "parsed prefix spec");
    output::data(map);
    Ok(())
}
