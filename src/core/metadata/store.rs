//! core::metadata::store
//!
//! Metadata documents on disk.
//!
//! # Layout
//!
//! One file per document, named after its query: `<dir>/<queryName>.json`.
//! The file holds the exact output of [`codec::encode`](super::codec::encode),
//! so regenerating an unchanged document leaves the file byte-identical.
//!
//! # Atomicity
//!
//! Writes go to a temporary file in the same directory which is synced and
//! then renamed over the target. Readers never observe a partial document.
//!
//! # Example
//!
//! ```no_run
//! use cgmeta::core::metadata::MetadataStore;
//! use cgmeta::core::record::{KeyValuePair, RecordRegistry};
//!
//! let store = MetadataStore::new("generated/metadata");
//! let doc = store.read("betalingstype", &RecordRegistry::with_builtins())?;
//! let typed = store.read_typed::<KeyValuePair>("betalingstype")?;
//! # Ok::<(), cgmeta::core::metadata::StoreError>(())
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::codec::{self, TypedDocument};
use super::document::MetadataDocument;
use super::MetadataError;
use crate::core::record::{RecordRegistry, RecordType};

/// File extension of stored documents.
pub const DOCUMENT_EXTENSION: &str = "json";

/// Errors from document storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document file could not be read.
    #[error("failed to read metadata file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The document file could not be written.
    #[error("failed to write metadata file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The query name cannot be used as a file name.
    #[error("invalid query name: '{0}'")]
    InvalidName(String),

    /// The file content is not a valid document.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// A directory of `<queryName>.json` documents.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    dir: PathBuf,
}

impl MetadataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory documents are stored in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document for `name`.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidName`] if `name` is empty or contains a path
    /// separator.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.{DOCUMENT_EXTENSION}")))
    }

    /// Whether a document for `name` exists.
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Write `doc` to `<dir>/<queryName>.json`, creating the directory if
    /// needed. Returns the path written.
    pub fn write(&self, doc: &MetadataDocument) -> Result<PathBuf, StoreError> {
        let path = self.path_for(doc.query_name())?;
        let json = codec::encode(doc)?;

        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Write {
            path: self.dir.clone(),
            source: e,
        })?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| StoreError::Write {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(json.as_bytes())
            .map_err(|e| StoreError::Write {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| StoreError::Write {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, &path).map_err(|e| StoreError::Write {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), records = doc.records().len(), "wrote metadata");
        Ok(path)
    }

    /// Read the document for `name`, resolving its record type through
    /// `registry`.
    pub fn read(
        &self,
        name: &str,
        registry: &RecordRegistry,
    ) -> Result<MetadataDocument, StoreError> {
        let json = self.read_text(name)?;
        Ok(codec::decode(&json, registry)?)
    }

    /// Read the document for `name` with records of type `T`.
    pub fn read_typed<T: RecordType>(&self, name: &str) -> Result<TypedDocument<T>, StoreError> {
        let json = self.read_text(name)?;
        Ok(codec::decode_typed::<T>(&json)?)
    }

    /// Query names of all stored documents, sorted.
    ///
    /// A missing directory yields an empty list.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.dir.clone(),
                    source: e,
                })
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Read {
                path: self.dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            let is_document = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(DOCUMENT_EXTENSION);
            if !is_document {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    fn read_text(&self, name: &str) -> Result<String, StoreError> {
        let path = self.path_for(name)?;
        debug!(path = %path.display(), "reading metadata");
        fs::read_to_string(&path).map_err(|e| StoreError::Read { path, source: e })
    }
}
