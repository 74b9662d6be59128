//! ingest command - Build a metadata document from a query file and rows

use crate::cli::Context;
use crate::core::metadata::MetadataStore;
use crate::core::query_file::QueryFile;
use crate::ui::output;
use anyhow::{Context as _, Result};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Read `<sql_dir>/<name>.cssql`, decode `rows` and write `<out_dir>/<name>.json`.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `name` - Query name
/// * `sql_dir` - Query file directory, defaults to the configured one
/// * `out_dir` - Output directory, defaults to the configured one
/// * `rows` - JSON rows file, `-` for stdin
/// * `tool_version` - Version to stamp, defaults to the configured one
pub fn ingest(
    ctx: &Context,
    name: &str,
    sql_dir: Option<&Path>,
    out_dir: Option<&Path>,
    rows: &Path,
    tool_version: Option<&str>,
) -> Result<()> {
    let sql_dir = sql_dir.unwrap_or(ctx.config.sql_dir());
    let query_path = QueryFile::path_for(sql_dir, name);
    let query = QueryFile::read(&query_path)
        .with_context(|| format!("Failed to load query file '{}'", query_path.display()))?;
    debug!(record_type = %query.record_type, "parsed query file");

    let rows_json = read_rows(rows)?;
    let version = tool_version.unwrap_or(ctx.config.tool_version());

    let doc = query
        .ingest(name, version, &rows_json, &ctx.registry)
        .with_context(|| format!("Failed to build metadata for '{}'", name))?;

    let store = MetadataStore::new(out_dir.unwrap_or(ctx.config.out_dir()));
    let path = store
        .write(&doc)
        .with_context(|| format!("Failed to save metadata for '{}'", name))?;

    info!(query = name, tool_version = version, "ingested");
    output::print(
        format!("Wrote {} ({} records)", path.display(), doc.records().len()),
        ctx.verbosity,
    );

    Ok(())
}

fn read_rows(rows: &Path) -> Result<String> {
    if rows == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read rows from stdin")?;
        return Ok(text);
    }

    fs::read_to_string(rows)
        .with_context(|| format!("Failed to read rows file '{}'", rows.display()))
}
