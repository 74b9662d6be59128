//! core::query_file
//!
//! Query definition files (`<name>.cssql`).
//!
//! # Format
//!
//! Three sections separated by `###`:
//!
//! ```text
//! @cg-Namespace Acme.Models
//! @cg-TypeName Betalingstype
//! @cg-XmlDoc Betalingstype er en type fra databasen.
//! @cg-IdentifierPrefix Bt
//! @cg-DatabaseIdentifierPrefixes B=1000
//! @cg-Template dataenum
//! ###
//! SELECT Code, Text FROM dbo.BETALINGSTYPE
//! ###
//! KeyValuePair
//! ```
//!
//! 1. Directives, one per line. The value is the trimmed remainder of the
//!    line. Lines that are not directives are ignored and a repeated
//!    directive overrides the earlier one. The older singular
//!    `@cg-DatabaseIdentifierPrefix` is read with the same prefix grammar.
//! 2. The SQL text.
//! 3. The record type descriptor each result row is decoded into.
//!
//! # Ingestion
//!
//! Rows returned by the SQL query are supplied as a JSON array of objects.
//! [`QueryFile::ingest`] decodes each row through a [`RecordRegistry`] and
//! assembles the metadata document.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::metadata::codec::decode_records;
use crate::core::metadata::{MetadataDocument, MetadataError};
use crate::core::prefixes::{PrefixError, PrefixMap};
use crate::core::record::{RecordRegistry, RecordSet};

/// Separator between the three sections.
pub const SECTION_SEPARATOR: &str = "###";

/// Extension of query definition files.
pub const QUERY_FILE_EXTENSION: &str = "cssql";

/// Directive keywords.
pub mod directives {
    pub const NAMESPACE: &str = "@cg-Namespace";
    pub const TYPE_NAME: &str = "@cg-TypeName";
    pub const XML_DOC: &str = "@cg-XmlDoc";
    pub const IDENTIFIER_PREFIX: &str = "@cg-IdentifierPrefix";
    pub const DATABASE_IDENTIFIER_PREFIXES: &str = "@cg-DatabaseIdentifierPrefixes";
    /// Legacy spelling of [`DATABASE_IDENTIFIER_PREFIXES`].
    pub const DATABASE_IDENTIFIER_PREFIX: &str = "@cg-DatabaseIdentifierPrefix";
    pub const TEMPLATE: &str = "@cg-Template";
}

/// Errors from reading, parsing and ingesting query files.
#[derive(Debug, Error)]
pub enum QueryFileError {
    /// The query file could not be read.
    #[error("failed to read query file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file does not have exactly three sections.
    #[error("query file must contain 3 sections separated by 2 '###' tokens, found {0}")]
    SectionCount(usize),

    /// The record type section is blank.
    #[error("query file does not name a record type in its last section")]
    MissingRecordType,

    /// A prefixes directive does not follow the prefix grammar.
    #[error("invalid database identifier prefixes directive: {0}")]
    Prefix(#[from] PrefixError),

    /// The rows are not a JSON array of objects.
    #[error("invalid rows: {0}")]
    Rows(#[source] serde_json::Error),

    /// The rows or directives do not form a valid document.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// A parsed query definition file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFile {
    pub namespace: Option<String>,
    pub type_name: Option<String>,
    pub xml_doc: Option<String>,
    pub identifier_prefix: Option<String>,
    pub database_identifier_prefixes: Option<PrefixMap>,
    pub template: Option<String>,
    pub sql_text: String,
    pub record_type: String,
}

impl QueryFile {
    /// Path of the query file for `name` in `dir`.
    pub fn path_for(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{name}.{QUERY_FILE_EXTENSION}"))
    }

    /// Read and parse a query file.
    pub fn read(path: &Path) -> Result<Self, QueryFileError> {
        debug!(path = %path.display(), "reading query file");
        let text = fs::read_to_string(path).map_err(|e| QueryFileError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&text)
    }

    /// Parse query file text.
    ///
    /// # Errors
    ///
    /// - [`QueryFileError::SectionCount`] unless there are exactly 3 sections
    /// - [`QueryFileError::Prefix`] for a malformed prefixes directive
    /// - [`QueryFileError::MissingRecordType`] if the last section is blank
    pub fn parse(text: &str) -> Result<Self, QueryFileError> {
        let sections: Vec<&str> = text.split(SECTION_SEPARATOR).collect();
        let [header, sql, record_type] = sections.as_slice() else {
            return Err(QueryFileError::SectionCount(sections.len()));
        };

        let mut file = QueryFile {
            sql_text: sql.trim().to_string(),
            record_type: record_type.trim().to_string(),
            ..Default::default()
        };

        for line in header.lines().map(str::trim_start) {
            if let Some(value) = directive(line, directives::NAMESPACE) {
                file.namespace = Some(value.to_string());
            } else if let Some(value) = directive(line, directives::TYPE_NAME) {
                file.type_name = Some(value.to_string());
            } else if let Some(value) = directive(line, directives::XML_DOC) {
                file.xml_doc = Some(value.to_string());
            } else if let Some(value) = directive(line, directives::IDENTIFIER_PREFIX) {
                file.identifier_prefix = Some(value.to_string());
            } else if let Some(value) = directive(line, directives::DATABASE_IDENTIFIER_PREFIXES)
                .or_else(|| directive(line, directives::DATABASE_IDENTIFIER_PREFIX))
            {
                file.database_identifier_prefixes = Some(PrefixMap::parse(value)?);
            } else if let Some(value) = directive(line, directives::TEMPLATE) {
                file.template = Some(value.to_string());
            }
        }

        if file.record_type.is_empty() {
            return Err(QueryFileError::MissingRecordType);
        }

        Ok(file)
    }

    /// Decode a JSON array of rows into records of this file's record type.
    pub fn decode_rows(
        &self,
        rows_json: &str,
        registry: &RecordRegistry,
    ) -> Result<RecordSet, QueryFileError> {
        let decoder = registry
            .resolve(&self.record_type)
            .copied()
            .ok_or_else(|| MetadataError::UnknownRecordType(self.record_type.clone()))?;
        let rows = serde_json::from_str(rows_json).map_err(QueryFileError::Rows)?;
        Ok(decode_records(decoder, "rows", rows)?)
    }

    /// Assemble a metadata document from this file and already decoded
    /// records.
    ///
    /// A missing directive is reported as [`MetadataError::MissingField`]
    /// naming the document field it fills. The identifier prefix and the
    /// database prefixes default to empty.
    pub fn to_document(
        &self,
        query_name: &str,
        tool_version: &str,
        records: RecordSet,
    ) -> Result<MetadataDocument, MetadataError> {
        let mut builder = MetadataDocument::builder()
            .tool_version(tool_version)
            .query_name(query_name)
            .identifier_prefix(self.identifier_prefix.clone().unwrap_or_default())
            .database_identifier_prefixes(
                self.database_identifier_prefixes.clone().unwrap_or_default(),
            )
            .sql_text(self.sql_text.as_str())
            .records(self.record_type.as_str(), records);

        if let Some(template) = &self.template {
            builder = builder.template_name(template.as_str());
        }
        if let Some(namespace) = &self.namespace {
            builder = builder.namespace(namespace.as_str());
        }
        if let Some(type_name) = &self.type_name {
            builder = builder.type_name(type_name.as_str());
        }
        if let Some(xml_doc) = &self.xml_doc {
            builder = builder.xml_doc(xml_doc.as_str());
        }

        builder.build()
    }

    /// Decode `rows_json` and assemble the document for `query_name`.
    pub fn ingest(
        &self,
        query_name: &str,
        tool_version: &str,
        rows_json: &str,
        registry: &RecordRegistry,
    ) -> Result<MetadataDocument, QueryFileError> {
        let records = self.decode_rows(rows_json, registry)?;
        debug!(
            query = query_name,
            record_type = %self.record_type,
            rows = records.len(),
            "decoded rows"
        );
        Ok(self.to_document(query_name, tool_version, records)?)
    }
}

/// Value of `line` if it starts with `keyword` as a whole word.
fn directive<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then(|| rest.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::fields;
    use crate::core::record::{KeyValuePair, Row};

    const BETALINGSTYPE: &str = "\
-- Betalingstyper
@cg-Namespace Acme.Models
@cg-TypeName Betalingstype
@cg-XmlDoc  Betalingstype er en type fra databasen.
@cg-IdentifierPrefix Bt
@cg-DatabaseIdentifierPrefixes B=1000|X
@cg-Template dataenum
###
SELECT Code AS [Key], Text AS [Value]
FROM dbo.BETALINGSTYPE
###
KeyValuePair
";

    const ROWS: &str = r#"[
        { "Key": "B001", "Value": "Kontant" },
        { "Key": "B002", "Value": "Kort" }
    ]"#;

    mod parse {
        use super::*;

        #[test]
        fn all_sections() {
            let file = QueryFile::parse(BETALINGSTYPE).unwrap();
            assert_eq!(file.namespace.as_deref(), Some("Acme.Models"));
            assert_eq!(file.type_name.as_deref(), Some("Betalingstype"));
            assert_eq!(
                file.xml_doc.as_deref(),
                Some("Betalingstype er en type fra databasen.")
            );
            assert_eq!(file.identifier_prefix.as_deref(), Some("Bt"));
            assert_eq!(file.template.as_deref(), Some("dataenum"));
            assert_eq!(
                file.database_identifier_prefixes.unwrap().format(),
                "B=1000|X=1"
            );
            assert_eq!(
                file.sql_text,
                "SELECT Code AS [Key], Text AS [Value]\nFROM dbo.BETALINGSTYPE"
            );
            assert_eq!(file.record_type, "KeyValuePair");
        }

        #[test]
        fn wrong_section_count() {
            assert!(matches!(
                QueryFile::parse("@cg-Namespace A\n###\nSELECT 1"),
                Err(QueryFileError::SectionCount(2))
            ));
            assert!(matches!(
                QueryFile::parse("a###b###c###d"),
                Err(QueryFileError::SectionCount(4))
            ));
        }

        #[test]
        fn blank_record_type() {
            assert!(matches!(
                QueryFile::parse("@cg-Namespace A\n###\nSELECT 1\n###\n   \n"),
                Err(QueryFileError::MissingRecordType)
            ));
        }

        #[test]
        fn later_directive_wins() {
            let file =
                QueryFile::parse("@cg-Template one\n@cg-Template two\n###\nSELECT 1\n###\nRow")
                    .unwrap();
            assert_eq!(file.template.as_deref(), Some("two"));
        }

        #[test]
        fn absent_directives() {
            let file = QueryFile::parse("###SELECT 1###Row").unwrap();
            assert_eq!(file.namespace, None);
            assert_eq!(file.identifier_prefix, None);
            assert_eq!(file.database_identifier_prefixes, None);
            assert_eq!(file.sql_text, "SELECT 1");
        }

        #[test]
        fn legacy_prefix_directive() {
            let file =
                QueryFile::parse("@cg-DatabaseIdentifierPrefix B\n###\nSELECT 1\n###\nRow")
                    .unwrap();
            assert_eq!(file.database_identifier_prefixes.unwrap().format(), "B=1");

            let file = QueryFile::parse(
                "@cg-DatabaseIdentifierPrefix B\n@cg-DatabaseIdentifierPrefixes HB|RT\n###\nSELECT 1\n###\nRow",
            )
            .unwrap();
            assert_eq!(
                file.database_identifier_prefixes.unwrap().format(),
                "HB=1|RT=1001"
            );
        }

        #[test]
        fn directive_must_be_whole_word() {
            let file =
                QueryFile::parse("@cg-TypeNames Foo\n@cg-Template\n###\nSELECT 1\n###\nRow")
                    .unwrap();
            assert_eq!(file.type_name, None);
            assert_eq!(file.template.as_deref(), Some(""));
        }

        #[test]
        fn malformed_prefixes() {
            assert!(matches!(
                QueryFile::parse("@cg-DatabaseIdentifierPrefixes B=x|\n###\nSELECT 1\n###\nRow"),
                Err(QueryFileError::Prefix(PrefixError::MalformedPrefixSpec { .. }))
            ));
        }
    }

    mod to_document {
        use super::*;

        #[test]
        fn missing_directive_names_field() {
            let file = QueryFile::parse(
                "@cg-Namespace A\n@cg-TypeName T\n@cg-XmlDoc x\n###\nSELECT 1\n###\nRow",
            )
            .unwrap();
            assert!(matches!(
                file.to_document("q", "1.0.0", RecordSet::empty()),
                Err(MetadataError::MissingField(fields::TEMPLATE_NAME))
            ));
        }

        #[test]
        fn optional_directives_default_to_empty() {
            let file = QueryFile::parse(
                "@cg-Namespace A\n@cg-TypeName T\n@cg-XmlDoc x\n@cg-Template t\n###\nSELECT 1\n###\nRow",
            )
            .unwrap();
            let doc = file.to_document("q", "1.0.0", RecordSet::empty()).unwrap();
            assert_eq!(doc.identifier_prefix(), "");
            assert!(doc.database_identifier_prefixes().is_empty());
            assert_eq!(doc.record_type_name(), "Row");
        }
    }

    mod ingest {
        use super::*;

        #[test]
        fn builds_document() {
            let file = QueryFile::parse(BETALINGSTYPE).unwrap();
            let doc = file
                .ingest(
                    "betalingstype",
                    "0.3.0",
                    ROWS,
                    &RecordRegistry::with_builtins(),
                )
                .unwrap();

            assert_eq!(doc.query_name(), "betalingstype");
            assert_eq!(doc.tool_version(), "0.3.0");
            assert_eq!(doc.template_name(), "dataenum");
            assert_eq!(doc.record_type_name(), "KeyValuePair");

            let view = doc.typed::<KeyValuePair>().unwrap();
            assert_eq!(view.at(1).unwrap(), &KeyValuePair::new("B002", "Kort"));
            assert_eq!(doc.identifier("B-001").unwrap(), "BtB_001");
            assert_eq!(doc.value("B002").unwrap(), 1002);
        }

        #[test]
        fn rows_as_ad_hoc_columns() {
            let file = QueryFile::parse(&BETALINGSTYPE.replace("KeyValuePair", "Row")).unwrap();
            let doc = file
                .ingest("q", "1", ROWS, &RecordRegistry::with_builtins())
                .unwrap();
            let view = doc.typed::<Row>().unwrap();
            assert_eq!(view.at(0).unwrap().get_str("Value"), Some("Kontant"));
        }

        #[test]
        fn unknown_record_type() {
            let file = QueryFile::parse(&BETALINGSTYPE.replace("KeyValuePair", "Nope")).unwrap();
            assert!(matches!(
                file.ingest("q", "1", ROWS, &RecordRegistry::with_builtins()),
                Err(QueryFileError::Metadata(MetadataError::UnknownRecordType(_)))
            ));
        }

        #[test]
        fn invalid_rows() {
            let file = QueryFile::parse(BETALINGSTYPE).unwrap();
            let registry = RecordRegistry::with_builtins();
            assert!(matches!(
                file.ingest("q", "1", "[{", &registry),
                Err(QueryFileError::Rows(_))
            ));
            assert!(matches!(
                file.ingest("q", "1", "{}", &registry),
                Err(QueryFileError::Metadata(MetadataError::InvalidFieldType { .. }))
            ));
            assert!(matches!(
                file.ingest("q", "1", r#"[{ "Key": "a" }]"#, &registry),
                Err(QueryFileError::Metadata(MetadataError::RecordDecode { index: 0, .. }))
            ));
        }
    }

    #[test]
    fn read_from_disk() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = QueryFile::path_for(temp.path(), "betalingstype");
        assert!(path.ends_with("betalingstype.cssql"));

        assert!(matches!(
            QueryFile::read(&path),
            Err(QueryFileError::Read { .. })
        ));

        fs::write(&path, BETALINGSTYPE).unwrap();
        assert_eq!(
            QueryFile::read(&path).unwrap(),
            QueryFile::parse(BETALINGSTYPE).unwrap()
        );
    }
}
