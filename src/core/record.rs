//! core::record
//!
//! Opaque database records.
//!
//! # Overview
//!
//! The query step produces rows without the metadata layer knowing their
//! concrete type. Each row is held as a boxed [`Record`] and the collection
//! as a [`RecordSet`]. Consumers that know the concrete type recover it with
//! a down-cast (see [`crate::core::metadata::TypedView`]).
//!
//! Concrete shapes implement [`RecordType`], which names the shape with a
//! record type descriptor. A [`RecordRegistry`] maps descriptors back to
//! decoders so persisted documents can be read without compile-time
//! knowledge of the record type.
//!
//! # Example
//!
//! ```
//! use cgmeta::core::record::{KeyValuePair, Record, RecordRegistry, RecordSet};
//!
//! let records = RecordSet::from_typed(vec![
//!     KeyValuePair::new("key1", "value1"),
//!     KeyValuePair::new("key2", "value2"),
//! ]);
//! assert_eq!(records.len(), 2);
//! assert_eq!(records.get(0).unwrap().descriptor(), "KeyValuePair");
//!
//! let registry = RecordRegistry::with_builtins();
//! assert!(registry.contains("KeyValuePair"));
//! ```

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A concrete record shape.
///
/// `DESCRIPTOR` is stored in persisted documents and must be unique among
/// the shapes registered in a [`RecordRegistry`].
pub trait RecordType:
    Serialize + DeserializeOwned + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Record type descriptor.
    const DESCRIPTOR: &'static str;
}

/// A type-erased record.
///
/// Implemented for every [`RecordType`]; not meant to be implemented by hand.
pub trait Record: fmt::Debug + Send + Sync + 'static {
    /// Descriptor of the concrete shape.
    fn descriptor(&self) -> &'static str;

    /// Access for down-casting.
    fn as_any(&self) -> &dyn Any;

    /// Encode with the default serde encoding of the concrete shape.
    fn to_json(&self) -> Result<Value, serde_json::Error>;

    /// Deep equality. Records of different concrete shapes are never equal.
    fn eq_record(&self, other: &dyn Record) -> bool;
}

impl<T: RecordType> Record for T {
    fn descriptor(&self) -> &'static str {
        T::DESCRIPTOR
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn eq_record(&self, other: &dyn Record) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// Immutable ordered sequence of records.
///
/// Cloning is cheap and shares the underlying storage.
#[derive(Debug, Clone)]
pub struct RecordSet(Arc<[Box<dyn Record>]>);

impl RecordSet {
    /// Wrap already-erased records. Order is preserved.
    pub fn new(records: Vec<Box<dyn Record>>) -> Self {
        Self(Arc::from(records))
    }

    /// An empty record set.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Erase a vector of concrete records.
    pub fn from_typed<T: RecordType>(records: Vec<T>) -> Self {
        Self::new(
            records
                .into_iter()
                .map(|r| Box::new(r) as Box<dyn Record>)
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Record> {
        self.0.get(index).map(|r| &**r)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Record> + '_ {
        self.0.iter().map(|r| &**r)
    }

    /// Whether both sets share the same storage.
    pub fn ptr_eq(&self, other: &RecordSet) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Element-wise deep equality, in order.
    pub fn records_eq(&self, other: &RecordSet) -> bool {
        self.ptr_eq(other)
            || (self.len() == other.len()
                && self.iter().zip(other.iter()).all(|(a, b)| a.eq_record(b)))
    }
}

impl Default for RecordSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Box<dyn Record>>> for RecordSet {
    fn from(records: Vec<Box<dyn Record>>) -> Self {
        Self::new(records)
    }
}

/// Decoder for one registered record shape.
#[derive(Clone, Copy)]
pub struct RecordDecoder {
    descriptor: &'static str,
    type_id: TypeId,
    decode: fn(Value) -> Result<Box<dyn Record>, serde_json::Error>,
}

impl RecordDecoder {
    /// Decoder for `T`.
    pub fn of<T: RecordType>() -> Self {
        Self {
            descriptor: T::DESCRIPTOR,
            type_id: TypeId::of::<T>(),
            decode: decode_boxed::<T>,
        }
    }

    pub fn descriptor(&self) -> &'static str {
        self.descriptor
    }

    /// Whether this decoder produces values of type `T`.
    pub fn is<T: RecordType>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Decode one JSON value into a record.
    pub fn decode(&self, value: Value) -> Result<Box<dyn Record>, serde_json::Error> {
        (self.decode)(value)
    }
}

impl fmt::Debug for RecordDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDecoder")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

fn decode_boxed<T: RecordType>(value: Value) -> Result<Box<dyn Record>, serde_json::Error> {
    Ok(Box::new(serde_json::from_value::<T>(value)?))
}

/// Registry of record shapes, keyed by descriptor.
///
/// The host populates the registry at startup; the set of shapes is closed.
#[derive(Debug, Clone, Default)]
pub struct RecordRegistry {
    decoders: BTreeMap<&'static str, RecordDecoder>,
}

impl RecordRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in shapes ([`KeyValuePair`], [`Row`]).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register::<KeyValuePair>().register::<Row>();
        registry
    }

    /// Register `T` under its descriptor, replacing any earlier registration.
    pub fn register<T: RecordType>(&mut self) -> &mut Self {
        self.decoders.insert(T::DESCRIPTOR, RecordDecoder::of::<T>());
        self
    }

    /// Look up the decoder for a descriptor.
    pub fn resolve(&self, descriptor: &str) -> Option<&RecordDecoder> {
        self.decoders.get(descriptor)
    }

    pub fn contains(&self, descriptor: &str) -> bool {
        self.decoders.contains_key(descriptor)
    }

    /// Registered descriptors in sorted order.
    pub fn descriptors(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.decoders.keys().copied()
    }
}

/// A code/text pair, the usual shape of lookup tables turned into enums.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
}

impl KeyValuePair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl RecordType for KeyValuePair {
    const DESCRIPTOR: &'static str = "KeyValuePair";
}

/// A row with an ad-hoc set of columns, kept in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub serde_json::Map<String, Value>);

impl Row {
    /// Column value by name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Column value as a string, if it is one.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }
}

impl RecordType for Row {
    const DESCRIPTOR: &'static str = "Row";
}
