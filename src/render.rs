//! render
//!
//! The model surface handed to code templates.
//!
//! A template renders one metadata document whose record type it knows at
//! compile time. [`TemplateModel`] pairs the document with a typed view of
//! its records and exposes the helpers every template needs: identifier and
//! value conversion for database keys, the name of the default enum member
//! and XML escaping for doc comments.
//!
//! # Example
//!
//! ```
//! use cgmeta::core::metadata::MetadataDocument;
//! use cgmeta::core::prefixes::PrefixMap;
//! use cgmeta::core::record::KeyValuePair;
//! use cgmeta::render::TemplateModel;
//!
//! let doc = MetadataDocument::builder()
//!     .tool_version("0.1.0")
//!     .query_name("betalingstype")
//!     .template_name("valueenum")
//!     .namespace("Acme.Models")
//!     .type_name("Betalingstype")
//!     .xml_doc("Kontant & kort")
//!     .identifier_prefix("Bt")
//!     .database_identifier_prefixes(PrefixMap::parse("B=1000").unwrap())
//!     .sql_text("SELECT Code, Text FROM dbo.BETALINGSTYPE")
//!     .typed_records(vec![KeyValuePair::new("B001", "Kontant")])
//!     .build()
//!     .unwrap();
//!
//! let model = TemplateModel::<KeyValuePair>::new(&doc).unwrap();
//! for record in model.records() {
//!     let record = record.unwrap();
//!     assert_eq!(model.identifier(&record.key).unwrap(), "BtB001");
//!     assert_eq!(model.value(&record.key).unwrap(), 1001);
//! }
//! assert_eq!(model.xml_doc(), "Kontant &amp; kort");
//! ```

use std::marker::PhantomData;

use crate::core::metadata::{MetadataDocument, MetadataError, TypedView};
use crate::core::prefixes::PrefixError;
use crate::core::record::RecordType;

/// Name of the zero-valued member every generated enum carries.
pub const DEFAULT_VALUE_TEXT: &str = "NONE";

/// A metadata document as seen by a template rendering records of type `T`.
#[derive(Debug)]
pub struct TemplateModel<'a, T> {
    model: &'a MetadataDocument,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for TemplateModel<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TemplateModel<'_, T> {}

impl<'a, T: RecordType> TemplateModel<'a, T> {
    /// Wrap `model`, checking that its records are of type `T`.
    pub fn new(model: &'a MetadataDocument) -> Result<Self, MetadataError> {
        model.typed::<T>()?;
        Ok(Self {
            model,
            _marker: PhantomData,
        })
    }

    /// The underlying document.
    pub fn model(&self) -> &'a MetadataDocument {
        self.model
    }

    /// The records as `T`.
    pub fn records(&self) -> TypedView<'a, T> {
        TypedView::new(self.model.records())
    }

    /// See [`MetadataDocument::identifier`].
    pub fn identifier(&self, key: &str) -> Result<String, PrefixError> {
        self.model.identifier(key)
    }

    /// See [`MetadataDocument::value`].
    pub fn value(&self, key: &str) -> Result<i32, PrefixError> {
        self.model.value(key)
    }

    pub fn default_value_text(&self) -> &'static str {
        DEFAULT_VALUE_TEXT
    }

    /// The document's XML doc text, escaped for a doc comment.
    pub fn xml_doc(&self) -> String {
        xml_doc_string(self.model.xml_doc())
    }
}

/// Escape `s` for use as XML text.
pub fn xml_doc_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
