//! notesrag-vector
//!
//! In-memory vector index used by the retrieval pipeline. Nothing is
//! persisted; the index is rebuilt from the notes directory at startup.

pub mod index;
pub mod similarity;

pub use index::FlatIndex;
