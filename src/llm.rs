//! Seams for the external language and embedding models.
//!
//! The system never talks to a model vendor directly; the router receives
//! these traits at construction and the binary (or a test) supplies the
//! implementations.

use crate::error::Result;
use async_trait::async_trait;

/// An opaque text generator: system + user messages in, prose out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, system: Option<&str>, user: &str, max_tokens: u32) -> Result<String>;
}

/// A pure text-to-vector function. Implementations return 384-dimension
/// unit-normalized embeddings.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Expected embedding width.
pub const EMBEDDING_DIM: usize = 384;
