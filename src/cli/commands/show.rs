//! show command - Display a stored metadata document

use super::store;
use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};
use std::path::Path;

/// Print the fields of a document, and optionally its records.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `name` - Query name
/// * `dir` - Document directory, defaults to the configured output directory
/// * `records` - Also print every record as one line of JSON
pub fn show(ctx: &Context, name: &str, dir: Option<&Path>, records: bool) -> Result<()> {
    let store = store(ctx, dir);
    let doc = store
        .read(name, &ctx.registry)
        .with_context(|| format!("Failed to read metadata for '{}'", name))?;

    let prefixes = doc.database_identifier_prefixes().format();
    let count = doc.records().len().to_string();

    output::data(output::format_fields(&[
        ("ToolVersion", doc.tool_version()),
        ("QueryName", doc.query_name()),
        ("TemplateName", doc.template_name()),
        ("Namespace", doc.namespace()),
        ("TypeName", doc.type_name()),
        ("XmlDoc", doc.xml_doc()),
        ("IdentifierPrefix", doc.identifier_prefix()),
        ("Prefixes", prefixes.as_str()),
        ("RecordType", doc.record_type_name()),
        ("Records", count.as_str()),
    ]));

    if records {
        let lines = doc
            .records()
            .iter()
            .map(|record| record.to_json().map(|json| json.to_string()))
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to encode records")?;
        output::data(output::format_list(&lines, "  "));
    }

    Ok(())
}
