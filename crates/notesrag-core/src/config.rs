use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::SimilarityMetric;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from("config.toml")
    }

    /// Merge defaults, `path`, the `RUST_ENV`-specific sibling file and `APP_*` env vars.
    pub fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let path = path.as_ref();

        let mut figment = Figment::from(Serialized::defaults(RagConfig::default())).merge(Toml::file(path));
        if let Some(env_file) = env_specific_file(path, &env_name) {
            figment = figment.merge(Toml::file(env_file));
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    /// Extract and validate the typed settings.
    pub fn settings(&self) -> anyhow::Result<RagConfig> {
        let settings: RagConfig = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

fn env_specific_file(base: &Path, env_name: &str) -> Option<PathBuf> {
    let suffix = match env_name {
        "dev" | "development" => "dev",
        "prod" | "production" => "prod",
        "test" | "testing" => "test",
        _ => return None,
    };
    let stem = base.file_stem()?.to_string_lossy();
    Some(base.with_file_name(format!("{stem}.{suffix}.toml")))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub notes: NotesConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
}

impl RagConfig {
    pub fn validate(&self) -> crate::Result<()> {
        self.chunking.validate()?;
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be at least 1".into()));
        }
        if self.embedding.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be at least 1".into()));
        }
        if self.llm.temperature.is_nan() || self.llm.temperature < 0.0 {
            return Err(Error::InvalidConfig(format!("llm.temperature must be >= 0, got {}", self.llm.temperature)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    pub dir: String,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self { dir: "./notes".to_string() }
    }
}

impl NotesConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        expand_path(&self.dir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Target number of trailing characters repeated at the start of the next chunk.
    pub chunk_overlap: usize,
    /// Split points, coarsest first. An empty string splits between characters.
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            chunk_overlap: 150,
            separators: ["\n\n", "\n", " ", ""].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap, ..Self::default() }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be greater than 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub metric: SimilarityMetric,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4, metric: SimilarityMetric::Cosine }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    OpenAi,
    Hash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub batch_size: usize,
    /// Vector length produced by the hash provider.
    pub dim: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAi,
            model: "text-embedding-ada-002".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            batch_size: 256,
            dim: 1024,
            timeout_secs: 60,
        }
    }
}

impl EmbeddingConfig {
    pub fn api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Echo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            model: "gpt-4o".to_string(),
            temperature: 0.2,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref())
    }
}

fn resolve_api_key(configured: Option<&str>) -> Option<String> {
    configured
        .map(str::to_string)
        .or_else(|| env::var("OPENAI_API_KEY").ok())
        .filter(|k| !k.trim().is_empty())
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
