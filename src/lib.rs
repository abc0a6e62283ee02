//! Entity-scoped question answering over regional planning documents (PDOT).
//!
//! `pdot-indexer` rebuilds the vector store from the configured PDFs and
//! `pdot-server` answers questions restricted to one entity's chunks.

pub mod core;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
