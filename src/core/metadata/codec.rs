//! core::metadata::codec
//!
//! Canonical JSON encoding of metadata documents.
//!
//! # Encoding
//!
//! Keys are written in a fixed order (see [`super`]), indented by two spaces,
//! without a trailing newline and without escaping non-ASCII characters.
//! Golden files and generated-code diffs depend on this exact shape.
//!
//! # Decoding
//!
//! Keys may appear in any order, except that `RecordTypeName` must come
//! before `Records`: the records can only be decoded once their type is
//! known. Unknown keys are rejected. A `null` value counts as absent.
//!
//! - [`decode`] resolves the record type at runtime through a
//!   [`RecordRegistry`]
//! - [`decode_typed`] decodes records as a compile-time type `T` and fails
//!   with [`MetadataError::RecordTypeMismatch`] before decoding any record
//!   if the document names another type
//!
//! # Example
//!
//! ```
//! use cgmeta::core::metadata::{codec, MetadataDocument};
//! use cgmeta::core::record::{KeyValuePair, RecordRegistry};
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
//! let json = codec::encode(&doc).unwrap();
//! let copy = codec::decode(&json, &RecordRegistry::with_builtins()).unwrap();
//! assert_eq!(copy, doc);
//!
//! let typed = codec::decode_typed::<KeyValuePair>(&json).unwrap();
//! assert_eq!(typed.records().at(0).unwrap().value, "value1");
//! ```

use std::marker::PhantomData;

use serde_json::{Map, Value};

use super::document::MetadataDocument;
use super::fields;
use super::view::TypedView;
use super::MetadataError;
use crate::core::prefixes::PrefixMap;
use crate::core::record::{RecordDecoder, RecordRegistry, RecordSet, RecordType};

/// Encode a document to its canonical JSON text.
pub fn encode(doc: &MetadataDocument) -> Result<String, MetadataError> {
    let mut object = Map::new();

    put(&mut object, fields::TOOL_VERSION, doc.tool_version());
    put(&mut object, fields::QUERY_NAME, doc.query_name());
    put(&mut object, fields::TEMPLATE_NAME, doc.template_name());
    put(&mut object, fields::NAMESPACE, doc.namespace());
    put(&mut object, fields::TYPE_NAME, doc.type_name());
    put(&mut object, fields::XML_DOC, doc.xml_doc());

    if !doc.identifier_prefix().is_empty() {
        put(&mut object, fields::IDENTIFIER_PREFIX, doc.identifier_prefix());
    }

    let prefixes = doc.database_identifier_prefixes();
    if !prefixes.is_empty() {
        put(
            &mut object,
            fields::DATABASE_IDENTIFIER_PREFIXES,
            &prefixes.format(),
        );
    }

    put(&mut object, fields::SQL_TEXT, doc.sql_text());
    put(&mut object, fields::RECORD_TYPE_NAME, doc.record_type_name());

    let records = doc
        .records()
        .iter()
        .map(|record| record.to_json())
        .collect::<Result<Vec<_>, _>>()?;
    object.insert(fields::RECORDS.to_string(), Value::Array(records));

    Ok(serde_json::to_string_pretty(&Value::Object(object))?)
}

fn put(object: &mut Map<String, Value>, field: &str, value: &str) {
    object.insert(field.to_string(), Value::String(value.to_string()));
}

/// Decode a document, resolving the record type through `registry`.
///
/// # Errors
///
/// - [`MetadataError::MissingField`] if a required key is absent or empty
/// - [`MetadataError::RecordTypeUnresolved`] if `Records` precedes `RecordTypeName`
/// - [`MetadataError::UnknownRecordType`] if the descriptor is not registered
/// - [`MetadataError::UnexpectedField`] for unknown keys
pub fn decode(json: &str, registry: &RecordRegistry) -> Result<MetadataDocument, MetadataError> {
    decode_with(json, Resolver::Registry(registry))
}

/// Decode a document whose records are statically known to be `T`.
///
/// Fails eagerly with [`MetadataError::RecordTypeMismatch`] when the
/// document's `RecordTypeName` is not `T::DESCRIPTOR`.
pub fn decode_typed<T: RecordType>(json: &str) -> Result<TypedDocument<T>, MetadataError> {
    let document = decode_with(json, Resolver::Typed(RecordDecoder::of::<T>()))?;
    TypedDocument::new(document)
}

impl MetadataDocument {
    /// Canonical JSON text of this document. See [`encode`].
    pub fn to_canonical_json(&self) -> Result<String, MetadataError> {
        encode(self)
    }
}

/// How the decoder finds the record decoder for a descriptor.
enum Resolver<'r> {
    Registry(&'r RecordRegistry),
    Typed(RecordDecoder),
}

impl Resolver<'_> {
    fn resolve(&self, descriptor: &str) -> Result<RecordDecoder, MetadataError> {
        match self {
            Resolver::Registry(registry) => registry
                .resolve(descriptor)
                .copied()
                .ok_or_else(|| MetadataError::UnknownRecordType(descriptor.to_string())),
            Resolver::Typed(decoder) if decoder.descriptor() == descriptor => Ok(*decoder),
            Resolver::Typed(decoder) => Err(MetadataError::RecordTypeMismatch {
                expected: decoder.descriptor().to_string(),
                found: descriptor.to_string(),
            }),
        }
    }
}

fn decode_with(json: &str, resolver: Resolver<'_>) -> Result<MetadataDocument, MetadataError> {
    let json = json.strip_prefix('\u{feff}').unwrap_or(json);

    let object = match serde_json::from_str::<Value>(json)? {
        Value::Object(object) => object,
        _ => {
            return Err(MetadataError::InvalidFieldType {
                field: "<document>".into(),
                expected: "a JSON object",
            })
        }
    };

    let mut builder = MetadataDocument::builder();
    let mut record_type: Option<String> = None;
    let mut records: Option<RecordSet> = None;
    let mut seen_prefixes = false;

    // Object iteration follows document order (serde_json preserve_order).
    for (key, value) in object {
        if value.is_null() {
            continue;
        }

        match key.as_str() {
            fields::TOOL_VERSION => builder = builder.tool_version(string_value(&key, value)?),
            fields::QUERY_NAME => builder = builder.query_name(string_value(&key, value)?),
            fields::TEMPLATE_NAME => builder = builder.template_name(string_value(&key, value)?),
            fields::NAMESPACE => builder = builder.namespace(string_value(&key, value)?),
            fields::TYPE_NAME => builder = builder.type_name(string_value(&key, value)?),
            fields::XML_DOC => builder = builder.xml_doc(string_value(&key, value)?),
            fields::IDENTIFIER_PREFIX => {
                builder = builder.identifier_prefix(string_value(&key, value)?)
            }
            fields::DATABASE_IDENTIFIER_PREFIXES | fields::DATABASE_IDENTIFIER_PREFIX => {
                // Current and legacy keys are mutually exclusive.
                if seen_prefixes {
                    return Err(MetadataError::UnexpectedField(key));
                }
                seen_prefixes = true;
                let spec = string_value(&key, value)?;
                builder = builder.database_identifier_prefixes(PrefixMap::parse(&spec)?);
            }
            fields::SQL_TEXT => builder = builder.sql_text(string_value(&key, value)?),
            fields::RECORD_TYPE_NAME => record_type = Some(string_value(&key, value)?),
            fields::RECORDS => {
                let descriptor = record_type
                    .as_deref()
                    .ok_or(MetadataError::RecordTypeUnresolved)?;
                if descriptor.is_empty() {
                    return Err(MetadataError::MissingField(fields::RECORD_TYPE_NAME));
                }
                let decoder = resolver.resolve(descriptor)?;
                records = Some(decode_records(decoder, fields::RECORDS, value)?);
            }
            _ => return Err(MetadataError::UnexpectedField(key)),
        }
    }

    builder = match (record_type, records) {
        (Some(record_type), Some(records)) => builder.records(record_type, records),
        (Some(_), None) => return Err(MetadataError::MissingField(fields::RECORDS)),
        (None, _) => builder,
    };

    builder.build()
}

fn string_value(field: &str, value: Value) -> Result<String, MetadataError> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(MetadataError::InvalidFieldType {
            field: field.to_string(),
            expected: "a string",
        }),
    }
}

/// Decode a JSON array of records with `decoder`, in order.
pub(crate) fn decode_records(
    decoder: RecordDecoder,
    field: &str,
    value: Value,
) -> Result<RecordSet, MetadataError> {
    let items = match value {
        Value::Array(items) => items,
        _ => {
            return Err(MetadataError::InvalidFieldType {
                field: field.to_string(),
                expected: "an array",
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            decoder
                .decode(item)
                .map_err(|source| MetadataError::RecordDecode { index, source })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(RecordSet::new)
}

/// A document whose record type is statically known to be `T`.
#[derive(Debug)]
pub struct TypedDocument<T> {
    document: MetadataDocument,
    _marker: PhantomData<fn() -> T>,
}

impl<T: RecordType> TypedDocument<T> {
    /// Wrap a document after checking its record type descriptor.
    pub fn new(document: MetadataDocument) -> Result<Self, MetadataError> {
        document.typed::<T>()?;
        Ok(Self {
            document,
            _marker: PhantomData,
        })
    }

    /// The records as `T`.
    pub fn records(&self) -> TypedView<'_, T> {
        TypedView::new(self.document.records())
    }

    pub fn document(&self) -> &MetadataDocument {
        &self.document
    }

    pub fn into_document(self) -> MetadataDocument {
        self.document
    }
}

impl<T> Clone for TypedDocument<T> {
    fn clone(&self) -> Self {
        Self {
            document: self.document.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for TypedDocument<T> {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
    }
}

impl<T> PartialEq<MetadataDocument> for TypedDocument<T> {
    fn eq(&self, other: &MetadataDocument) -> bool {
        &self.document == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{KeyValuePair, Row};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct RecordTuple {
        key: String,
        value: String,
    }

    impl RecordType for RecordTuple {
        const DESCRIPTOR: &'static str = "RecordTuple";
    }

    fn tuple(key: &str, value: &str) -> RecordTuple {
        RecordTuple {
            key: key.into(),
            value: value.into(),
        }
    }

    fn registry() -> RecordRegistry {
        let mut registry = RecordRegistry::with_builtins();
        registry.register::<RecordTuple>();
        registry
    }

    fn sample() -> MetadataDocument {
        MetadataDocument::builder()
            .tool_version("0.1.0")
            .query_name("betalingstype")
            .template_name("dataenum")
            .namespace("Acme.Models")
            .type_name("Betalingstype")
            .xml_doc("Betalingstype er en type fra databasen.")
            .sql_text("SELECT * FROM SOME_TABLE")
            .typed_records(vec![tuple("key1", "value1"), tuple("key2", "value2")])
            .build()
            .unwrap()
    }

    const GOLDEN: &str = r#"{
  "ToolVersion": "0.1.0",
  "QueryName": "betalingstype",
  "TemplateName": "dataenum",
  "Namespace": "Acme.Models",
  "TypeName": "Betalingstype",
  "XmlDoc": "Betalingstype er en type fra databasen.",
  "SqlText": "SELECT * FROM SOME_TABLE",
  "RecordTypeName": "RecordTuple",
  "Records": [
    {
      "Key": "key1",
      "Value": "value1"
    },
    {
      "Key": "key2",
      "Value": "value2"
    }
  ]
}"#;

    mod encode {
        use super::*;

        #[test]
        fn matches_golden_text() {
            assert_eq!(encode(&sample()).unwrap(), GOLDEN);
        }

        #[test]
        fn optional_fields_in_position() {
            let doc = MetadataDocument::builder()
                .tool_version("1")
                .query_name("q")
                .template_name("t")
                .namespace("n")
                .type_name("T")
                .xml_doc("x")
                .identifier_prefix("Bt")
                .database_identifier_prefixes(PrefixMap::parse("RT|HB").unwrap())
                .sql_text("SELECT 1")
                .typed_records(Vec::<KeyValuePair>::new())
                .build()
                .unwrap();

            let expected = r#"{
  "ToolVersion": "1",
  "QueryName": "q",
  "TemplateName": "t",
  "Namespace": "n",
  "TypeName": "T",
  "XmlDoc": "x",
  "IdentifierPrefix": "Bt",
  "DatabaseIdentifierPrefixes": "HB=1001|RT=1",
  "SqlText": "SELECT 1",
  "RecordTypeName": "KeyValuePair",
  "Records": []
}"#;
            assert_eq!(doc.to_canonical_json().unwrap(), expected);
        }

        #[test]
        fn non_ascii_not_escaped() {
            let doc = MetadataDocument::builder()
                .tool_version("1")
                .query_name("q")
                .template_name("t")
                .namespace("n")
                .type_name("T")
                .xml_doc("Betalingstype på dansk <æøå> & \"citat\"")
                .sql_text("SELECT 1")
                .typed_records(Vec::<KeyValuePair>::new())
                .build()
                .unwrap();
            let json = encode(&doc).unwrap();
            assert!(json.contains(r#""XmlDoc": "Betalingstype på dansk <æøå> & \"citat\"","#));
        }

        #[test]
        fn deterministic() {
            let doc = sample();
            assert_eq!(encode(&doc).unwrap(), encode(&doc).unwrap());
        }
    }

    mod decode_untyped {
        use super::*;

        #[test]
        fn golden_text() {
            let doc = decode(GOLDEN, &registry()).unwrap();

            assert_eq!(doc.tool_version(), "0.1.0");
            assert_eq!(doc.query_name(), "betalingstype");
            assert_eq!(doc.template_name(), "dataenum");
            assert_eq!(doc.namespace(), "Acme.Models");
            assert_eq!(doc.type_name(), "Betalingstype");
            assert_eq!(doc.xml_doc(), "Betalingstype er en type fra databasen.");
            assert_eq!(doc.identifier_prefix(), "");
            assert_eq!(doc.sql_text(), "SELECT * FROM SOME_TABLE");
            assert_eq!(doc.record_type_name(), "RecordTuple");
            assert_eq!(doc.records().len(), 2);

            let view = doc.typed::<RecordTuple>().unwrap();
            assert_eq!(view.at(0).unwrap(), &tuple("key1", "value1"));
            assert_eq!(view.at(1).unwrap(), &tuple("key2", "value2"));
            assert_eq!(doc, sample());
        }

        #[test]
        fn roundtrip() {
            let doc = sample();
            let copy = decode(&encode(&doc).unwrap(), &registry()).unwrap();
            assert_eq!(copy, doc);
        }

        #[test]
        fn any_key_order_with_type_first() {
            let json = r#"{
                "RecordTypeName": "KeyValuePair",
                "SqlText": "SELECT 1",
                "Records": [{ "Key": "a", "Value": "b" }],
                "XmlDoc": "x",
                "TypeName": "T",
                "Namespace": "n",
                "TemplateName": "t",
                "QueryName": "q",
                "ToolVersion": "1"
            }"#;
            let doc = decode(json, &registry()).unwrap();
            assert_eq!(doc.records().len(), 1);
        }

        #[test]
        fn records_before_type_unresolved() {
            let json = r#"{
                "ToolVersion": "1",
                "Records": [],
                "RecordTypeName": "KeyValuePair"
            }"#;
            assert!(matches!(
                decode(json, &registry()),
                Err(MetadataError::RecordTypeUnresolved)
            ));
        }

        #[test]
        fn missing_sql_text() {
            let json = GOLDEN.replace("  \"SqlText\": \"SELECT * FROM SOME_TABLE\",\n", "");
            assert!(matches!(
                decode(&json, &registry()),
                Err(MetadataError::MissingField("SqlText"))
            ));
        }

        #[test]
        fn missing_records() {
            let json = r#"{
                "ToolVersion": "1", "QueryName": "q", "TemplateName": "t",
                "Namespace": "n", "TypeName": "T", "XmlDoc": "x",
                "SqlText": "s", "RecordTypeName": "KeyValuePair"
            }"#;
            assert!(matches!(
                decode(json, &registry()),
                Err(MetadataError::MissingField("Records"))
            ));
        }

        #[test]
        fn null_counts_as_missing() {
            let json = GOLDEN.replace(
                "\"XmlDoc\": \"Betalingstype er en type fra databasen.\"",
                "\"XmlDoc\": null",
            );
            assert!(matches!(
                decode(&json, &registry()),
                Err(MetadataError::MissingField("XmlDoc"))
            ));
        }

        #[test]
        fn unknown_record_type() {
            assert!(matches!(
                decode(GOLDEN, &RecordRegistry::with_builtins()),
                Err(MetadataError::UnknownRecordType(ref d)) if d == "RecordTuple"
            ));
        }

        #[test]
        fn unexpected_field_rejected() {
            let json = GOLDEN.replacen('{', "{\n  \"QueriedAt\": \"2024-01-01\",", 1);
            assert!(matches!(
                decode(&json, &registry()),
                Err(MetadataError::UnexpectedField(ref f)) if f == "QueriedAt"
            ));
        }

        #[test]
        fn wrong_scalar_type() {
            let json = GOLDEN.replace("\"ToolVersion\": \"0.1.0\"", "\"ToolVersion\": 1");
            assert!(matches!(
                decode(&json, &registry()),
                Err(MetadataError::InvalidFieldType { ref field, .. }) if field == "ToolVersion"
            ));
        }

        #[test]
        fn bad_record_reports_index() {
            let json = GOLDEN.replace("\"Value\": \"value2\"", "\"Value\": 2");
            assert!(matches!(
                decode(&json, &registry()),
                Err(MetadataError::RecordDecode { index: 1, .. })
            ));
        }

        #[test]
        fn not_an_object() {
            assert!(matches!(
                decode("[]", &registry()),
                Err(MetadataError::InvalidFieldType { .. })
            ));
            assert!(matches!(
                decode("{", &registry()),
                Err(MetadataError::Json(_))
            ));
        }

        #[test]
        fn byte_order_mark_tolerated() {
            let json = format!("\u{feff}{GOLDEN}");
            assert_eq!(decode(&json, &registry()).unwrap(), sample());
        }

        #[test]
        fn prefixes_roundtrip() {
            let json = GOLDEN.replace(
                "  \"SqlText\"",
                "  \"DatabaseIdentifierPrefixes\": \"B=1000|X\",\n  \"SqlText\"",
            );
            let doc = decode(&json, &registry()).unwrap();
            assert_eq!(doc.database_identifier_prefixes().get("B"), Some(1000));
            assert_eq!(doc.database_identifier_prefixes().get("X"), Some(1));
            assert_eq!(encode(&doc).unwrap(), json.replace("B=1000|X", "B=1000|X=1"));
        }

        #[test]
        fn legacy_single_prefix_key() {
            let json = GOLDEN.replace(
                "  \"SqlText\"",
                "  \"DatabaseIdentifierPrefix\": \"B\",\n  \"SqlText\"",
            );
            let doc = decode(&json, &registry()).unwrap();
            assert_eq!(doc.database_identifier_prefixes().get("B"), Some(1));
            assert!(encode(&doc)
                .unwrap()
                .contains("\"DatabaseIdentifierPrefixes\": \"B=1\""));
        }

        #[test]
        fn current_and_legacy_prefix_keys_together() {
            let json = GOLDEN.replace(
                "  \"SqlText\"",
                "  \"DatabaseIdentifierPrefixes\": \"HB=1\",\n  \"DatabaseIdentifierPrefix\": \"B\",\n  \"SqlText\"",
            );
            assert!(matches!(
                decode(&json, &registry()),
                Err(MetadataError::UnexpectedField(ref f)) if f == "DatabaseIdentifierPrefix"
            ));
        }

        #[test]
        fn row_numbers_roundtrip_exactly() {
            let rows: Vec<Row> = [104547414.14285715, 1.0715660391465826e-75, 0.1, -2.5e300]
                .into_iter()
                .map(|x: f64| {
                    let columns = json!({
                        "Amount": x,
                        "Count": -42i64,
                        "Active": true,
                        "Note": null,
                        "Parts": [1, 2.75, "a", [false]],
                    });
                    Row(columns.as_object().unwrap().clone())
                })
                .collect();
            let doc = MetadataDocument::builder()
                .tool_version("0.1.0")
                .query_name("saldo")
                .template_name("table")
                .namespace("Acme.Ledger")
                .type_name("Saldo")
                .xml_doc("x")
                .sql_text("SELECT Amount FROM dbo.SALDO")
                .records(Row::DESCRIPTOR, RecordSet::from_typed(rows))
                .build()
                .unwrap();

            let json = encode(&doc).unwrap();
            let copy = decode(&json, &registry()).unwrap();
            assert_eq!(copy, doc);
            assert_eq!(
                copy.typed::<Row>().unwrap().at(0).unwrap().get("Amount"),
                Some(&json!(104547414.14285715))
            );
            assert_eq!(encode(&copy).unwrap(), json);
        }

        #[test]
        fn malformed_prefixes() {
            let json = GOLDEN.replace(
                "  \"SqlText\"",
                "  \"DatabaseIdentifierPrefixes\": \"B=x\",\n  \"SqlText\"",
            );
            assert!(matches!(
                decode(&json, &registry()),
                Err(MetadataError::Prefix(_))
            ));
        }

        #[test]
        fn end_to_end_identifier() {
            let records = vec![
                KeyValuePair::new("key1", "value1"),
                KeyValuePair::new("key2", "value2"),
            ];
            let doc = MetadataDocument::builder()
                .tool_version("0.1.0")
                .query_name("betalingstype")
                .template_name("dataenum")
                .namespace("Acme.Models")
                .type_name("Betalingstype")
                .xml_doc("Betalingstype er en type fra databasen.")
                .sql_text("SELECT * FROM SOME_TABLE")
                .typed_records(records)
                .build()
                .unwrap();

            let json = encode(&doc).unwrap();
            assert!(json.contains("\"RecordTypeName\": \"KeyValuePair\""));

            let copy = decode(&json, &registry()).unwrap();
            assert_eq!(copy.identifier("key1").unwrap(), "key1");
        }
    }

    mod decode_with_type {
        use super::*;

        #[test]
        fn matching_type() {
            let typed = decode_typed::<RecordTuple>(GOLDEN).unwrap();
            assert_eq!(typed.records().count(), 2);
            assert_eq!(typed.records().at(1).unwrap(), &tuple("key2", "value2"));
            assert_eq!(typed, sample());
        }

        #[test]
        fn mismatch_fails_eagerly() {
            assert!(matches!(
                decode_typed::<KeyValuePair>(GOLDEN),
                Err(MetadataError::RecordTypeMismatch { ref expected, ref found })
                    if expected == "KeyValuePair" && found == "RecordTuple"
            ));
        }

        #[test]
        fn typed_and_untyped_agree() {
            let typed = decode_typed::<RecordTuple>(GOLDEN).unwrap();
            let untyped = decode(GOLDEN, &registry()).unwrap();
            assert_eq!(typed.document(), &untyped);
            assert_eq!(typed.into_document(), untyped);
        }

        #[test]
        fn records_before_type_unresolved() {
            let json = r#"{ "Records": [], "RecordTypeName": "RecordTuple" }"#;
            assert!(matches!(
                decode_typed::<RecordTuple>(json),
                Err(MetadataError::RecordTypeUnresolved)
            ));
        }
    }
}
