use std::sync::Arc;

use notesrag_core::traits::Embedder;
use notesrag_core::types::RetrievalResult;
use notesrag_core::Result;
use notesrag_vector::FlatIndex;

/// Embeds a question and returns the `k` most similar chunks.
pub struct Retriever {
    index: Arc<FlatIndex>,
    embedder: Arc<dyn Embedder>,
    k: usize,
}

impl Retriever {
    pub fn new(index: Arc<FlatIndex>, embedder: Arc<dyn Embedder>, k: usize) -> Self {
        Self { index, embedder, k }
    }

    pub fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        let q_vec = self.embedder.embed(query)?;
        let hits = self.index.query(&q_vec, self.k)?;
        tracing::debug!(hits = hits.len(), k = self.k, "retrieved chunks");
        Ok(hits)
    }
}
