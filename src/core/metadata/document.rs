//! core::metadata::document
//!
//! The metadata document.
//!
//! # Immutability
//!
//! A [`MetadataDocument`] never changes after construction. Derivations such
//! as [`MetadataDocument::with_tool_version`] return a new document that
//! shares the record storage of the original.
//!
//! # Equality
//!
//! - [`MetadataDocument::equals_simple`] compares the scalar fields
//!   case-insensitively and the prefix maps exactly
//! - `==` additionally compares the records element-wise, in order
//!
//! # Example
//!
//! ```
//! use cgmeta::core::metadata::MetadataDocument;
//! use cgmeta::core::record::KeyValuePair;
//!
//! let doc = MetadataDocument::builder()
//!     .tool_version("0.1.0")
//!     .query_name("betalingstype")
//!     .template_name("dataenum")
//!     .namespace("Acme.Models")
//!     .type_name("Betalingstype")
//!     .xml_doc("Betalingstype er en type fra databasen.")
//!     .sql_text("SELECT * FROM SOME_TABLE")
//!     .typed_records(vec![KeyValuePair::new("key1", "value1")])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(doc.record_type_name(), "KeyValuePair");
//! assert_eq!(doc.identifier("key-1").unwrap(), "key_1");
//!
//! let restamped = doc.with_tool_version("0.2.0");
//! assert_eq!(restamped.tool_version(), "0.2.0");
//! assert_eq!(doc.tool_version(), "0.1.0");
//! ```

use super::fields;
use super::view::TypedView;
use super::MetadataError;
use crate::core::prefixes::{PrefixError, PrefixMap};
use crate::core::record::{RecordSet, RecordType};

/// Generation identity plus the query records.
#[derive(Debug, Clone)]
pub struct MetadataDocument {
    tool_version: String,
    query_name: String,
    template_name: String,
    namespace: String,
    type_name: String,
    xml_doc: String,
    identifier_prefix: String,
    database_identifier_prefixes: PrefixMap,
    sql_text: String,
    record_type_name: String,
    records: RecordSet,
}

impl MetadataDocument {
    /// Start building a document.
    pub fn builder() -> MetadataDocumentBuilder {
        MetadataDocumentBuilder::default()
    }

    /// Producer tool version.
    pub fn tool_version(&self) -> &str {
        &self.tool_version
    }

    /// Name of the originating query, also the base file name.
    pub fn query_name(&self) -> &str {
        &self.query_name
    }

    /// Template to render this document with.
    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn xml_doc(&self) -> &str {
        &self.xml_doc
    }

    /// Prefix prepended to every generated identifier. May be empty.
    pub fn identifier_prefix(&self) -> &str {
        &self.identifier_prefix
    }

    pub fn database_identifier_prefixes(&self) -> &PrefixMap {
        &self.database_identifier_prefixes
    }

    pub fn sql_text(&self) -> &str {
        &self.sql_text
    }

    /// Record type descriptor.
    pub fn record_type_name(&self) -> &str {
        &self.record_type_name
    }

    /// The opaque records, in query order.
    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    /// Typed projection over the records.
    ///
    /// Fails with [`MetadataError::RecordTypeMismatch`] when `T` is not the
    /// document's record type. Individual elements are checked again on
    /// access.
    pub fn typed<T: RecordType>(&self) -> Result<TypedView<'_, T>, MetadataError> {
        if self.record_type_name != T::DESCRIPTOR {
            return Err(MetadataError::RecordTypeMismatch {
                expected: T::DESCRIPTOR.to_string(),
                found: self.record_type_name.clone(),
            });
        }
        Ok(TypedView::new(&self.records))
    }

    /// A copy with a different tool version. Records are shared, not copied.
    pub fn with_tool_version(&self, version: impl Into<String>) -> Self {
        Self {
            tool_version: version.into(),
            ..self.clone()
        }
    }

    /// Convert a database key into a generated identifier.
    ///
    /// The key must carry one of the configured database prefixes (if any).
    /// The result is the identifier prefix followed by the key with `-`
    /// replaced by `_`.
    pub fn identifier(&self, key: &str) -> Result<String, PrefixError> {
        self.database_identifier_prefixes.check_key(key)?;
        Ok(format!("{}{}", self.identifier_prefix, key.replace('-', "_")))
    }

    /// Convert a database key into a generated numeric value.
    ///
    /// See [`PrefixMap::resolve_value`].
    pub fn value(&self, key: &str) -> Result<i32, PrefixError> {
        self.database_identifier_prefixes.resolve_value(key)
    }

    /// Scalar-field equality.
    ///
    /// Strings compare case-insensitively; the prefix maps compare exactly.
    /// Records are ignored.
    pub fn equals_simple(&self, other: &Self) -> bool {
        eq_ignore_case(&self.tool_version, &other.tool_version)
            && eq_ignore_case(&self.query_name, &other.query_name)
            && eq_ignore_case(&self.template_name, &other.template_name)
            && eq_ignore_case(&self.namespace, &other.namespace)
            && eq_ignore_case(&self.type_name, &other.type_name)
            && eq_ignore_case(&self.xml_doc, &other.xml_doc)
            && eq_ignore_case(&self.identifier_prefix, &other.identifier_prefix)
            && eq_ignore_case(&self.sql_text, &other.sql_text)
            && eq_ignore_case(&self.record_type_name, &other.record_type_name)
            && self.database_identifier_prefixes == other.database_identifier_prefixes
    }

    /// Full equality: [`equals_simple`](Self::equals_simple) and equal
    /// records, element-wise in order.
    pub fn equals(&self, other: &Self) -> bool {
        self.equals_simple(other) && self.records.records_eq(&other.records)
    }
}

impl PartialEq for MetadataDocument {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b
        || a.chars()
            .flat_map(char::to_lowercase)
            .eq(b.chars().flat_map(char::to_lowercase))
}

/// Builder for [`MetadataDocument`].
///
/// Every string field except the identifier prefix is required and must be
/// non-empty; [`build`](Self::build) reports the first missing one.
#[derive(Debug, Default)]
pub struct MetadataDocumentBuilder {
    tool_version: Option<String>,
    query_name: Option<String>,
    template_name: Option<String>,
    namespace: Option<String>,
    type_name: Option<String>,
    xml_doc: Option<String>,
    identifier_prefix: String,
    database_identifier_prefixes: PrefixMap,
    sql_text: Option<String>,
    record_type_name: Option<String>,
    records: Option<RecordSet>,
}

impl MetadataDocumentBuilder {
    pub fn tool_version(mut self, value: impl Into<String>) -> Self {
        self.tool_version = Some(value.into());
        self
    }

    pub fn query_name(mut self, value: impl Into<String>) -> Self {
        self.query_name = Some(value.into());
        self
    }

    pub fn template_name(mut self, value: impl Into<String>) -> Self {
        self.template_name = Some(value.into());
        self
    }

    pub fn namespace(mut self, value: impl Into<String>) -> Self {
        self.namespace = Some(value.into());
        self
    }

    pub fn type_name(mut self, value: impl Into<String>) -> Self {
        self.type_name = Some(value.into());
        self
    }

    pub fn xml_doc(mut self, value: impl Into<String>) -> Self {
        self.xml_doc = Some(value.into());
        self
    }

    pub fn identifier_prefix(mut self, value: impl Into<String>) -> Self {
        self.identifier_prefix = value.into();
        self
    }

    pub fn database_identifier_prefixes(mut self, prefixes: PrefixMap) -> Self {
        self.database_identifier_prefixes = prefixes;
        self
    }

    pub fn sql_text(mut self, value: impl Into<String>) -> Self {
        self.sql_text = Some(value.into());
        self
    }

    /// Opaque records and the descriptor of their shape.
    ///
    /// The descriptor is not resolved here; a wrong descriptor surfaces when
    /// the records are viewed or decoded.
    pub fn records(mut self, record_type_name: impl Into<String>, records: RecordSet) -> Self {
        self.record_type_name = Some(record_type_name.into());
        self.records = Some(records);
        self
    }

    /// Records of a statically known shape; the descriptor is taken from `T`.
    pub fn typed_records<T: RecordType>(self, records: Vec<T>) -> Self {
        self.records(T::DESCRIPTOR, RecordSet::from_typed(records))
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// [`MetadataError::MissingField`] naming the first required field that
    /// is absent or empty.
    pub fn build(self) -> Result<MetadataDocument, MetadataError> {
        Ok(MetadataDocument {
            tool_version: required(self.tool_version, fields::TOOL_VERSION)?,
            query_name: required(self.query_name, fields::QUERY_NAME)?,
            template_name: required(self.template_name, fields::TEMPLATE_NAME)?,
            namespace: required(self.namespace, fields::NAMESPACE)?,
            type_name: required(self.type_name, fields::TYPE_NAME)?,
            xml_doc: required(self.xml_doc, fields::XML_DOC)?,
            identifier_prefix: self.identifier_prefix,
            database_identifier_prefixes: self.database_identifier_prefixes,
            sql_text: required(self.sql_text, fields::SQL_TEXT)?,
            record_type_name: required(self.record_type_name, fields::RECORD_TYPE_NAME)?,
            records: self
                .records
                .ok_or(MetadataError::MissingField(fields::RECORDS))?,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, MetadataError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(MetadataError::MissingField(field))
}
