//! notesrag-embed
//!
//! Embedding gateways: a deterministic token-hashing embedder for offline use
//! and tests, and an HTTP client for OpenAI-compatible `/embeddings` APIs.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use twox_hash::XxHash64;

use notesrag_core::config::{EmbeddingConfig, EmbeddingProvider};
use notesrag_core::traits::Embedder;
use notesrag_core::{Error, Result};

pub mod openai;

pub use openai::OpenAiEmbedder;

/// Bag-of-tokens embedder: each lowercase alphanumeric token is hashed into
/// one of `dim` buckets, then the vector is L2-normalized.
///
/// Texts sharing words get positive cosine similarity, which is enough for
/// offline runs and deterministic tests. No network access.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let val = 0.5 + ((h >> 32) as u32) as f32 / u32::MAX as f32;
            v[idx] += val;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn fake_embeddings_forced() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the configured embedder. `APP_USE_FAKE_EMBEDDINGS=1` forces the hash embedder.
pub fn default_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    if fake_embeddings_forced() || config.provider == EmbeddingProvider::Hash {
        tracing::info!(dim = config.dim, "using hash embedder");
        return Ok(Arc::new(HashEmbedder::new(config.dim)));
    }
    let api_key = config.api_key().ok_or_else(|| {
        Error::InvalidConfig("embedding provider 'openai' needs an API key (set OPENAI_API_KEY or embedding.api_key)".into())
    })?;
    tracing::info!(model = %config.model, base_url = %config.base_url, "using OpenAI-compatible embedder");
    Ok(Arc::new(OpenAiEmbedder::new(config, api_key)?))
}
