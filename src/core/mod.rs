//! core
//!
//! Core domain types, codecs, and storage for cgmeta.
//!
//! # Modules
//!
//! - [`record`] - Opaque records and the record type registry
//! - [`prefixes`] - Database identifier prefix grammar and key resolution
//! - [`metadata`] - Metadata documents, their JSON codec and storage
//! - [`query_file`] - `.cssql` query definition files
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Documents are immutable and cheap to derive from
//! - Parsing is strict: unknown keys and malformed values are errors
//! - Encoding is canonical and byte-stable

pub mod config;
pub mod metadata;
pub mod prefixes;
pub mod query_file;
pub mod record;
