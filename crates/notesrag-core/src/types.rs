//! Domain types shared by the loader, chunker, index and pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The on-disk format a document was read from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Text,
    Pdf,
    Docx,
}

/// Similarity function used to rank vectors.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    Dot,
}

/// A file read from the notes directory. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub raw_text: String,
    pub format: DocumentFormat,
}

impl SourceDocument {
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

/// A bounded segment of one source document.
///
/// - `text`: exact substring of the source text
/// - `source_path`: path of the originating document
/// - `sequence_index`: position within the parent document
/// - `offset`: byte offset of `text` within the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_path: PathBuf,
    pub sequence_index: usize,
    pub offset: usize,
}

impl Chunk {
    /// Byte offset one past the last byte of this chunk in the source text.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    /// File name used in source tags; never the full path.
    pub fn source_name(&self) -> String {
        display_name(&self.source_path)
    }
}

pub type EmbeddingVector = Vec<f32>;

/// A chunk and its vector, owned by the vector index.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: EmbeddingVector,
}

/// One retrieval hit. `score` is metric-specific but higher is always better.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Hits ordered by descending score.
pub type RetrievalResult = Vec<ScoredChunk>;

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}
