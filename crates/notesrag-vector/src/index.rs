use notesrag_core::types::{Chunk, IndexEntry, RetrievalResult, ScoredChunk, SimilarityMetric};
use notesrag_core::{Error, Result};

use crate::similarity;

/// Exact nearest-neighbour index over an immutable set of entries.
///
/// Built once; every query scores all entries. Read-only after `build`, so
/// it can be shared across threads behind an `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    entries: Vec<IndexEntry>,
    dim: usize,
    metric: SimilarityMetric,
}

impl FlatIndex {
    /// Build from entries. All vectors must have the same non-zero length.
    pub fn build(entries: Vec<IndexEntry>, metric: SimilarityMetric) -> Result<Self> {
        let dim = entries.first().map_or(0, |e| e.vector.len());
        if !entries.is_empty() && dim == 0 {
            return Err(Error::IndexBuild("embedding vectors must not be empty".into()));
        }
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dim) {
            return Err(Error::DimensionMismatch { expected: dim, actual: bad.vector.len() });
        }
        tracing::debug!(entries = entries.len(), dim, ?metric, "built flat index");
        Ok(Self { entries, dim, metric })
    }

    /// Pair chunks with their vectors (same length, same order) and build.
    pub fn from_parts(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>, metric: SimilarityMetric) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(Error::IndexBuild(format!("{} chunks but {} vectors", chunks.len(), vectors.len())));
        }
        let entries = chunks.into_iter().zip(vectors).map(|(chunk, vector)| IndexEntry { chunk, vector }).collect();
        Self::build(entries, metric)
    }

    /// Top-`k` entries by descending score; ties keep insertion order.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<RetrievalResult> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: vector.len() });
        }
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, similarity::score(self.metric, vector, &e.vector)))
            .collect();
        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk { chunk: self.entries[i].chunk.clone(), score })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector length of the indexed entries; 0 for an empty index.
    pub fn dim(&self) -> usize {
        self.dim
    }
}
