//! core::metadata
//!
//! Metadata documents: the bundle of generation identity fields and query
//! records handed from the data-extraction step to the rendering step.
//!
//! # Modules
//!
//! - [`document`] - The immutable [`MetadataDocument`] and its builder
//! - [`codec`] - Canonical JSON encoding and decoding
//! - [`view`] - [`TypedView`], a typed projection over opaque records
//! - [`store`] - One `<queryName>.json` file per document
//!
//! # Persisted format
//!
//! ```text
//! {
//!   "ToolVersion": "0.1.0",
//!   "QueryName": "betalingstype",
//!   "TemplateName": "dataenum",
//!   "Namespace": "Acme.Models",
//!   "TypeName": "Betalingstype",
//!   "XmlDoc": "Betalingstype er en type fra databasen.",
//!   "SqlText": "SELECT * FROM SOME_TABLE",
//!   "RecordTypeName": "KeyValuePair",
//!   "Records": [ ... ]
//! }
//! ```
//!
//! `IdentifierPrefix` and `DatabaseIdentifierPrefixes` are written between
//! `XmlDoc` and `SqlText` when non-empty.

pub mod codec;
pub mod document;
pub mod store;
pub mod view;

pub use codec::{decode, decode_typed, encode, TypedDocument};
pub use document::{MetadataDocument, MetadataDocumentBuilder};
pub use store::{MetadataStore, StoreError};
pub use view::{TypedIter, TypedView};

use thiserror::Error;

use crate::core::prefixes::PrefixError;

/// Canonical field names, as written in the persisted JSON.
pub mod fields {
    pub const TOOL_VERSION: &str = "ToolVersion";
    pub const QUERY_NAME: &str = "QueryName";
    pub const TEMPLATE_NAME: &str = "TemplateName";
    pub const NAMESPACE: &str = "Namespace";
    pub const TYPE_NAME: &str = "TypeName";
    pub const XML_DOC: &str = "XmlDoc";
    pub const IDENTIFIER_PREFIX: &str = "IdentifierPrefix";
    pub const DATABASE_IDENTIFIER_PREFIXES: &str = "DatabaseIdentifierPrefixes";
    /// Older single-prefix key, still accepted when decoding.
    pub const DATABASE_IDENTIFIER_PREFIX: &str = "DatabaseIdentifierPrefix";
    pub const SQL_TEXT: &str = "SqlText";
    pub const RECORD_TYPE_NAME: &str = "RecordTypeName";
    pub const RECORDS: &str = "Records";
}

/// Errors from building, encoding, decoding and viewing metadata documents.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A required field is absent or empty.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// The registry has no decoder for the descriptor.
    #[error("no record type is registered for descriptor '{0}'")]
    UnknownRecordType(String),

    /// Records were requested as a different type than they hold.
    #[error("record type mismatch: expected '{expected}', found '{found}'")]
    RecordTypeMismatch { expected: String, found: String },

    /// `Records` was read before `RecordTypeName`.
    #[error("'{}' appears before '{}'; the record type cannot be resolved", fields::RECORDS, fields::RECORD_TYPE_NAME)]
    RecordTypeUnresolved,

    /// Typed access past the end of the records.
    #[error("record index {index} is out of bounds ({len} records)")]
    IndexOutOfBounds { index: usize, len: usize },

    /// An unknown or repeated key in a document.
    #[error("unexpected field '{0}'")]
    UnexpectedField(String),

    /// A value has the wrong JSON type.
    #[error("field '{field}' must be {expected}")]
    InvalidFieldType {
        field: String,
        expected: &'static str,
    },

    /// A record does not match its record type.
    #[error("failed to decode record {index}: {source}")]
    RecordDecode {
        index: usize,
        source: serde_json::Error,
    },

    /// The text is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The prefixes field does not follow the prefix grammar.
    #[error("invalid database identifier prefixes: {0}")]
    Prefix(#[from] PrefixError),
}
