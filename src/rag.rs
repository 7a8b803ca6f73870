//! Document search: embedding-backed retrieval with chunked ingestion.

use crate::error::Result;
use crate::llm::{Embedder, EMBEDDING_DIM};
use crate::storage::{DocumentHit, StatsDatabase};
use std::sync::Arc;
use tracing::{info, warn};

/// Similarity floor below which hits are discarded.
pub const MIN_SIMILARITY: f64 = 0.3;

/// Default chunk target and overlap, in characters.
pub const CHUNK_SIZE: usize = 500;
pub const CHUNK_OVERLAP: usize = 50;

/// Retrieval service owning the embedder.
pub struct RagService {
    embedder: Arc<dyn Embedder>,
}

impl RagService {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Store one document with its embedding. Returns the document id.
    pub fn add_document(
        &self,
        db: &StatsDatabase,
        content: &str,
        title: Option<&str>,
        source: Option<&str>,
        url: Option<&str>,
        metadata: Option<&serde_json::Value>,
    ) -> Result<i64> {
        let embedding = self.embedder.embed(content);
        if embedding.len() != EMBEDDING_DIM {
            warn!(
                got = embedding.len(),
                expected = EMBEDDING_DIM,
                "unexpected_embedding_width"
            );
        }
        let id = db.insert_document(title, source, content, url, &embedding, metadata)?;
        info!(doc_id = id, title, "document_added");
        Ok(id)
    }

    /// Chunk a long document and store every chunk under the same title
    /// and source. Returns the ids of the stored chunks.
    pub fn ingest_document(
        &self,
        db: &StatsDatabase,
        content: &str,
        title: Option<&str>,
        source: Option<&str>,
        url: Option<&str>,
        metadata: Option<&serde_json::Value>,
    ) -> Result<Vec<i64>> {
        let chunks = chunk_text(content, CHUNK_SIZE, CHUNK_OVERLAP);
        let mut ids = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            ids.push(self.add_document(db, chunk, title, source, url, metadata)?);
        }
        Ok(ids)
    }

    /// Nearest documents to the query, all satisfying the similarity floor.
    pub fn search(
        &self,
        db: &StatsDatabase,
        query: &str,
        limit: usize,
    ) -> Result<Vec<DocumentHit>> {
        let query_embedding = self.embedder.embed(query);
        let hits = db.search_documents(&query_embedding, limit, MIN_SIMILARITY)?;
        let preview: String = query.chars().take(50).collect();
        info!(query = %preview, results = hits.len(), "rag_search");
        Ok(hits)
    }
}

/// Split text into overlapping chunks, preferring paragraph boundaries,
/// then sentence boundaries, then a hard cut. A boundary is only taken
/// past the half-chunk mark so chunks stay near the target size.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < text.len() {
        let mut end = floor_char_boundary(text, (start + chunk_size).min(text.len()));

        if end < text.len() {
            let window = &text[start..end];
            if let Some(para) = window.rfind("\n\n") {
                if para > chunk_size / 2 {
                    end = start + para + 2;
                } else {
                    end = start + sentence_break(window).unwrap_or(window.len());
                }
            } else {
                end = start + sentence_break(window).unwrap_or(window.len());
            }
        }

        let chunk = text[start..end].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        if end >= text.len() {
            break;
        }
        start = floor_char_boundary(text, end.saturating_sub(overlap));
    }

    chunks
}

/// Snap a byte index down to the nearest character boundary.
fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn sentence_break(window: &str) -> Option<usize> {
    for punct in [". ", "! ", "? "] {
        if let Some(pos) = window.rfind(punct) {
            if pos > window.len() / 2 {
                return Some(pos + 2);
            }
        }
    }
    None
}
