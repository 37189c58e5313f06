//! Client for OpenAI-compatible `POST {base_url}/embeddings`.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use notesrag_core::config::EmbeddingConfig;
use notesrag_core::traits::Embedder;
use notesrag_core::{Error, Result};

pub struct OpenAiEmbedder {
    client: Client,
    url: String,
    model: String,
    api_key: String,
    batch_size: usize,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::embedding(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            batch_size: config.batch_size.max(1),
        })
    }

    fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest { model: &self.model, input })
            .send()
            .map_err(|e| Error::embedding(format!("request to {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::embedding(format!("HTTP {status}: {}", body.trim())));
        }
        let parsed: EmbeddingsResponse =
            response.json().map_err(|e| Error::embedding(format!("malformed response: {e}")))?;
        order_vectors(parsed, input.len())
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            tracing::debug!(batch = batch.len(), model = %self.model, "embedding batch");
            out.extend(self.request(batch)?);
        }
        Ok(out)
    }
}

/// Put vectors back in input order and check one vector came back per input.
pub(crate) fn order_vectors(response: EmbeddingsResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut data = response.data;
    if data.len() != expected {
        return Err(Error::embedding(format!("expected {expected} vectors, got {}", data.len())));
    }
    data.sort_by_key(|d| d.index);
    if data.iter().enumerate().any(|(i, d)| d.index != i) {
        return Err(Error::embedding("response indices do not cover the request"));
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}
