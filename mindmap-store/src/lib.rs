//! Mindmap document store.
//!
//! Persists a module/file document knowledge base in SQLite and serves the
//! query operations the agents rely on:
//! - module and file listings
//! - full-content lookup by file or module
//! - BM25 keyword search across the whole corpus
//!
//! ```text
//! mindmap dir → Importer → documents table → queries / BM25 → agent tools
//! ```
//!
//! Embeddings are stored alongside each document (fixed 1536-dim f32 BLOBs)
//! but are not queried here; similarity search is out of scope.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod bm25;
pub mod document;
pub mod import;
pub mod store;

pub use bm25::Bm25Index;
pub use document::{bytes_to_vec, vec_to_bytes, Document, EMBEDDING_DIM};
pub use import::{import_dir, scan_mindmap_dir, ImportSummary};
pub use store::{DocumentStore, StoreSummary};
