//! Hosted AI providers: embeddings and answer generation.

pub mod google;
pub mod openai;
pub mod provider;
pub mod types;

pub use google::GoogleEmbeddings;
pub use openai::OpenAiChat;
pub use provider::{EmbeddingProvider, GenerationProvider};
pub use types::{ChatMessage, ChatRequest};
