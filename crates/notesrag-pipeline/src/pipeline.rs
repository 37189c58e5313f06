//! Orchestrator: indexes the notes directory once and answers questions
//! against the resulting snapshot.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use notesrag_core::chunker::Chunker;
use notesrag_core::config::RagConfig;
use notesrag_core::loader::DocumentLoader;
use notesrag_core::traits::{AnswerGenerator, Embedder};
use notesrag_core::Result;
use notesrag_vector::FlatIndex;

use crate::context;
use crate::prompt::PromptTemplate;
use crate::retriever::Retriever;

pub const NOT_INITIALIZED: &str = "Notes system is still starting up. Please try again shortly.";
pub const NO_QUESTION: &str = "No question provided";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Indexing,
    Ready,
    DegradedNoDocuments,
    Failed(String),
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Uninitialized => f.write_str("uninitialized"),
            PipelineState::Indexing => f.write_str("indexing"),
            PipelineState::Ready => f.write_str("ready"),
            PipelineState::DegradedNoDocuments => f.write_str("no documents"),
            PipelineState::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Outcome of one question. Every variant carries the text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Generator output, verbatim, plus the files the context came from.
    Grounded { text: String, sources: Vec<String> },
    NoDocuments(String),
    /// Startup failed or has not finished.
    Unavailable(String),
    /// This question failed; the pipeline is still usable.
    Failed(String),
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Answer::Grounded { text, .. } => text,
            Answer::NoDocuments(text) | Answer::Unavailable(text) | Answer::Failed(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Answer::Grounded { text, .. } => text,
            Answer::NoDocuments(text) | Answer::Unavailable(text) | Answer::Failed(text) => text,
        }
    }

    pub fn sources(&self) -> &[String] {
        match self {
            Answer::Grounded { sources, .. } => sources,
            _ => &[],
        }
    }
}

/// Everything a query needs, swapped as a unit on (re)initialization.
struct Snapshot {
    state: PipelineState,
    retriever: Option<Retriever>,
    corpus_summary: String,
    documents: usize,
    chunks: usize,
}

impl Snapshot {
    fn placeholder(state: PipelineState) -> Self {
        Self { state, retriever: None, corpus_summary: String::new(), documents: 0, chunks: 0 }
    }
}

pub struct RagPipeline {
    config: RagConfig,
    chunker: Chunker,
    prompt: PromptTemplate,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn AnswerGenerator>,
    current: RwLock<Arc<Snapshot>>,
    init_lock: Mutex<()>,
}

impl RagPipeline {
    pub fn new(config: RagConfig, embedder: Arc<dyn Embedder>, generator: Arc<dyn AnswerGenerator>) -> Result<Self> {
        config.validate()?;
        let chunker = Chunker::new(config.chunking.clone())?;
        Ok(Self {
            config,
            chunker,
            prompt: PromptTemplate::default(),
            embedder,
            generator,
            current: RwLock::new(Arc::new(Snapshot::placeholder(PipelineState::Uninitialized))),
            init_lock: Mutex::new(()),
        })
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.config.notes.resolved_dir()
    }

    /// Load, chunk, embed and index the notes directory, then publish the
    /// result. Safe to call again; queries keep using the previous snapshot
    /// until the new one is complete.
    pub fn initialize(&self) -> PipelineState {
        let _guard = self.init_lock.lock();
        {
            let mut current = self.current.write();
            if current.state == PipelineState::Uninitialized {
                *current = Arc::new(Snapshot::placeholder(PipelineState::Indexing));
            }
        }

        let dir = self.notes_dir();
        let snapshot = match self.build(&dir) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::warn!(dir = %dir.display(), "no notes found");
                Snapshot {
                    corpus_summary: format!("No notes found. Please add some documents to the {} folder.", dir.display()),
                    ..Snapshot::placeholder(PipelineState::DegradedNoDocuments)
                }
            }
            Err(e) => {
                tracing::error!(dir = %dir.display(), error = %e, "failed to index notes");
                let reason = e.to_string();
                Snapshot {
                    corpus_summary: format!("Error loading notes: {reason}"),
                    ..Snapshot::placeholder(PipelineState::Failed(reason))
                }
            }
        };

        let state = snapshot.state.clone();
        *self.current.write() = Arc::new(snapshot);
        tracing::info!(%state, "pipeline initialized");
        state
    }

    /// `Ok(None)` when there is nothing to index.
    fn build(&self, dir: &Path) -> Result<Option<Snapshot>> {
        let report = DocumentLoader::new().load_directory(dir)?;
        if !report.failures.is_empty() {
            tracing::warn!(skipped = report.failures.len(), "some notes could not be loaded");
        }
        if report.is_empty() {
            return Ok(None);
        }

        let chunks = self.chunker.chunk_documents(&report.documents);
        if chunks.is_empty() {
            return Ok(None);
        }
        tracing::info!(documents = report.documents.len(), chunks = chunks.len(), "embedding chunks");

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        let chunk_count = chunks.len();
        let index = FlatIndex::from_parts(chunks, vectors, self.config.retrieval.metric)?;

        Ok(Some(Snapshot {
            state: PipelineState::Ready,
            retriever: Some(Retriever::new(Arc::new(index), self.embedder.clone(), self.config.retrieval.top_k)),
            corpus_summary: context::corpus_summary(&report.documents),
            documents: report.documents.len(),
            chunks: chunk_count,
        }))
    }

    pub fn state(&self) -> PipelineState {
        self.current.read().state.clone()
    }

    pub fn corpus_summary(&self) -> String {
        self.current.read().corpus_summary.clone()
    }

    /// Loaded documents and indexed chunks in the current snapshot.
    pub fn stats(&self) -> (usize, usize) {
        let current = self.current.read();
        (current.documents, current.chunks)
    }

    pub fn ask(&self, question: &str) -> Answer {
        let snapshot: Arc<Snapshot> = self.current.read().clone();
        let retriever = match (&snapshot.state, &snapshot.retriever) {
            (PipelineState::Ready, Some(retriever)) => retriever,
            (PipelineState::DegradedNoDocuments, _) => {
                return Answer::NoDocuments(format!(
                    "Notes system not properly initialized. Please check that you have documents in the {} folder.",
                    self.notes_dir().display()
                ))
            }
            (PipelineState::Failed(reason), _) => return Answer::Unavailable(reason.clone()),
            _ => return Answer::Unavailable(NOT_INITIALIZED.to_string()),
        };

        let question = question.trim();
        if question.is_empty() {
            return Answer::Failed(NO_QUESTION.to_string());
        }

        match self.answer_with(retriever, question) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "question failed");
                Answer::Failed(format!("Error processing your question: {e}"))
            }
        }
    }

    pub fn answer(&self, question: &str) -> String {
        self.ask(question).into_text()
    }

    fn answer_with(&self, retriever: &Retriever, question: &str) -> Result<Answer> {
        let hits = retriever.retrieve(question)?;
        let context = context::assemble(&hits);
        let prompt = self.prompt.render(question, &context);
        let text = self.generator.generate(&prompt)?;
        Ok(Answer::Grounded { text, sources: context::source_names(&hits) })
    }
}
