//! Retrieval-augmented generation over the PDOT documents.
//!
//! - `indexer`: offline job that rebuilds the vector store from the catalog
//! - `engine`: per-request retrieval filtered by entity, plus answer synthesis
//! - `sqlite`: the persistent `VectorStore` implementation

pub mod catalog;
pub mod context_builder;
pub mod engine;
pub mod indexer;
pub mod loader;
pub mod splitter;
pub mod sqlite;
pub mod store;

pub use catalog::{normalize_label, EntityCatalog};
pub use engine::ContextEngine;
pub use indexer::{IndexReport, Indexer};
pub use loader::{DocumentLoader, PdfLoader};
pub use splitter::RecursiveSplitter;
pub use sqlite::SqliteVectorStore;
pub use store::{ChunkSearchResult, StoredChunk, VectorStore};
