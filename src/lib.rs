//! cgmeta - Metadata documents for database-driven code generation
//!
//! A code generation pipeline runs in two steps. A data-extraction step runs
//! a SQL query and stores the resulting rows, together with the identity of
//! the artifact to generate, as a metadata document. A rendering step later
//! reads that document back and feeds it to a template. This crate owns the
//! document model between the two steps.
//!
//! # Architecture
//!
//! - [`core`] - Documents, the JSON codec, identifier prefixes, query files
//!   and configuration
//! - [`render`] - The model surface templates render against
//! - [`cli`] - Command-line interface layer (parses args, delegates to core)
//! - [`ui`] - User-facing output
//!
//! # Invariants
//!
//! 1. A document is immutable once built
//! 2. Encoding is deterministic: the same document always yields the same text
//! 3. Decoding then re-encoding a canonical document reproduces it exactly
//! 4. A typed view never yields a record of the wrong concrete type

pub mod cli;
pub mod core;
pub mod render;
pub mod ui;
