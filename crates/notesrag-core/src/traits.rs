//! Narrow interfaces to the external services the pipeline depends on.

use crate::error::Result;

/// Converts text into fixed-length vectors.
///
/// `embed_batch` is order-preserving and returns one vector per input. All
/// vectors from one embedder have the same length.
pub trait Embedder: Send + Sync {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| crate::Error::embedding("embedder returned no vector"))
    }
}

/// Produces model text for a fully rendered prompt.
pub trait AnswerGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}
