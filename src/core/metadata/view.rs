//! core::metadata::view
//!
//! Typed, read-only access to opaque records.
//!
//! A [`TypedView`] borrows the record storage of a document and down-casts
//! each element when it is accessed. An element of the wrong concrete type
//! is reported as [`MetadataError::RecordTypeMismatch`] at that point, not
//! when the view is created.

use std::marker::PhantomData;

use super::MetadataError;
use crate::core::record::{Record, RecordSet, RecordType};

/// Typed projection over a [`RecordSet`].
#[derive(Debug)]
pub struct TypedView<'a, T> {
    records: &'a RecordSet,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for TypedView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedView<'_, T> {}

impl<'a, T: RecordType> TypedView<'a, T> {
    /// View `records` as `T`. Nothing is checked until elements are accessed.
    pub fn new(records: &'a RecordSet) -> Self {
        Self {
            records,
            _marker: PhantomData,
        }
    }

    /// Number of records.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<Result<&'a T, MetadataError>> {
        self.records.get(index).map(downcast::<T>)
    }

    /// The record at `index`.
    ///
    /// # Errors
    ///
    /// - [`MetadataError::RecordTypeMismatch`] if the element is not a `T`
    /// - [`MetadataError::IndexOutOfBounds`] past the end
    pub fn at(&self, index: usize) -> Result<&'a T, MetadataError> {
        self.get(index).unwrap_or(Err(MetadataError::IndexOutOfBounds {
            index,
            len: self.count(),
        }))
    }

    /// Iterate in order. Each call starts from the first record.
    pub fn iter(&self) -> TypedIter<'a, T> {
        TypedIter {
            records: self.records,
            index: 0,
            _marker: PhantomData,
        }
    }

    /// Down-cast every record, failing on the first mismatch.
    pub fn to_vec(&self) -> Result<Vec<&'a T>, MetadataError> {
        self.iter().collect()
    }
}

impl<'a, T: RecordType> IntoIterator for TypedView<'a, T> {
    type Item = Result<&'a T, MetadataError>;
    type IntoIter = TypedIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T: RecordType> IntoIterator for &TypedView<'a, T> {
    type Item = Result<&'a T, MetadataError>;
    type IntoIter = TypedIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`TypedView`].
#[derive(Debug)]
pub struct TypedIter<'a, T> {
    records: &'a RecordSet,
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: RecordType> Iterator for TypedIter<'a, T> {
    type Item = Result<&'a T, MetadataError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.get(self.index)?;
        self.index += 1;
        Some(downcast::<T>(record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.records.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<T: RecordType> ExactSizeIterator for TypedIter<'_, T> {}

fn downcast<T: RecordType>(record: &dyn Record) -> Result<&T, MetadataError> {
    record
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| MetadataError::RecordTypeMismatch {
            expected: T::DESCRIPTOR.to_string(),
            found: record.descriptor().to_string(),
        })
}
