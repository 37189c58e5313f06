use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;

use notesrag_core::config::RagConfig;
use notesrag_core::traits::{AnswerGenerator, Embedder};
use notesrag_core::{Error, Result};
use notesrag_embed::HashEmbedder;
use notesrag_pipeline::context;
use notesrag_pipeline::{Answer, PipelineState, PromptTemplate, RagPipeline, Retriever};
use notesrag_vector::FlatIndex;

const PARIS: &str = "The capital of France is Paris.";

/// Hash embeddings with a call counter and an optional failure trigger.
struct TestEmbedder {
    inner: HashEmbedder,
    calls: AtomicUsize,
    fail_on: Option<&'static str>,
}

impl TestEmbedder {
    fn new() -> Self {
        Self { inner: HashEmbedder::new(256), calls: AtomicUsize::new(0), fail_on: None }
    }

    fn failing_on(trigger: &'static str) -> Self {
        Self { fail_on: Some(trigger), ..Self::new() }
    }
}

impl Embedder for TestEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(trigger) = self.fail_on {
            if texts.iter().any(|t| t.contains(trigger)) {
                return Err(Error::embedding("service unavailable"));
            }
        }
        self.inner.embed_batch(texts)
    }
}

/// Records prompts and answers with a fixed string.
#[derive(Default)]
struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingGenerator {
    fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

impl AnswerGenerator for RecordingGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        if self.fail {
            return Err(Error::generation("rate limited"));
        }
        Ok("- Paris [SOURCE: a.md]".to_string())
    }
}

fn config_for(dir: &Path) -> RagConfig {
    let mut config = RagConfig::default();
    config.notes.dir = dir.to_string_lossy().into_owned();
    config
}

fn pipeline(dir: &Path, embedder: Arc<TestEmbedder>, generator: Arc<RecordingGenerator>) -> RagPipeline {
    RagPipeline::new(config_for(dir), embedder, generator).unwrap()
}

fn paris_notes() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.md"), PARIS).unwrap();
    fs::write(tmp.path().join("b.txt"), "Sourdough bread needs flour, water, salt and a starter.").unwrap();
    tmp
}

#[test]
fn retrieval_finds_the_matching_sentence() {
    let tmp = paris_notes();
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(256));
    let docs = notesrag_core::loader::DocumentLoader::new().load_directory(tmp.path()).unwrap().documents;
    let chunks = notesrag_core::chunker::Chunker::new(RagConfig::default().chunking).unwrap().chunk_documents(&docs);
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder.embed_batch(&texts).unwrap();
    let index = FlatIndex::from_parts(chunks, vectors, Default::default()).unwrap();

    let retriever = Retriever::new(Arc::new(index), embedder, 1);
    let hits = retriever.retrieve("What is the capital of France?").unwrap();

    assert_eq!(hits.len(), 1);
    assert!(hits[0].chunk.text.contains(PARIS));
    assert!(context::assemble(&hits).starts_with("[SOURCE: a.md]\n"));
}

#[test]
fn ready_pipeline_sends_tagged_context_to_the_generator() {
    let tmp = paris_notes();
    let generator = Arc::new(RecordingGenerator::default());
    let rag = pipeline(tmp.path(), Arc::new(TestEmbedder::new()), generator.clone());

    assert_eq!(rag.initialize(), PipelineState::Ready);
    assert_eq!(rag.stats(), (2, 2));

    let answer = rag.ask("What is the capital of France?");
    assert_eq!(answer.sources().first().map(String::as_str), Some("a.md"));
    match &answer {
        Answer::Grounded { text, sources } => {
            assert_eq!(text, "- Paris [SOURCE: a.md]");
            assert_eq!(sources[0], "a.md");
        }
        other => panic!("expected grounded answer, got {other:?}"),
    }

    let prompts = generator.prompts.lock();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Question:\nWhat is the capital of France?"));
    assert!(prompts[0].contains(&format!("[SOURCE: a.md]\n{PARIS}")));
}

#[test]
fn empty_directory_degrades_without_external_calls() {
    let tmp = TempDir::new().unwrap();
    let embedder = Arc::new(TestEmbedder::new());
    let generator = Arc::new(RecordingGenerator::default());
    let rag = pipeline(tmp.path(), embedder.clone(), generator.clone());

    assert_eq!(rag.initialize(), PipelineState::DegradedNoDocuments);

    let answer = rag.ask("anything?");
    assert!(matches!(answer, Answer::NoDocuments(_)));
    assert!(answer.text().starts_with("Notes system not properly initialized."));
    assert!(answer.sources().is_empty());
    assert!(rag.corpus_summary().starts_with("No notes found."));
    assert_eq!(generator.calls(), 0);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn missing_directory_is_created_and_degrades() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("notes");
    let rag = pipeline(&dir, Arc::new(TestEmbedder::new()), Arc::new(RecordingGenerator::default()));

    assert_eq!(rag.initialize(), PipelineState::DegradedNoDocuments);
    assert!(dir.is_dir());
}

#[test]
fn empty_files_count_as_no_documents() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("blank.md"), "").unwrap();
    let rag = pipeline(tmp.path(), Arc::new(TestEmbedder::new()), Arc::new(RecordingGenerator::default()));
    assert_eq!(rag.initialize(), PipelineState::DegradedNoDocuments);
}

#[test]
fn embedding_failure_at_startup_fails_the_pipeline() {
    let tmp = paris_notes();
    let generator = Arc::new(RecordingGenerator::default());
    let rag = pipeline(tmp.path(), Arc::new(TestEmbedder::failing_on("Paris")), generator.clone());

    let state = rag.initialize();
    let reason = match &state {
        PipelineState::Failed(reason) => reason.clone(),
        other => panic!("expected failed state, got {other:?}"),
    };
    assert!(!reason.is_empty());
    assert!(reason.contains("service unavailable"));

    let first = rag.answer("What is the capital of France?");
    let second = rag.answer("Anything else?");
    assert_eq!(first, reason);
    assert_eq!(second, reason);
    assert_eq!(rag.corpus_summary(), format!("Error loading notes: {reason}"));
    assert_eq!(generator.calls(), 0);
}

#[test]
fn generation_failure_is_reported_per_query() {
    let tmp = paris_notes();
    let rag = pipeline(tmp.path(), Arc::new(TestEmbedder::new()), Arc::new(RecordingGenerator::failing()));
    assert_eq!(rag.initialize(), PipelineState::Ready);

    let answer = rag.ask("What is the capital of France?");
    assert!(matches!(answer, Answer::Failed(_)));
    assert!(answer.text().starts_with("Error processing your question: "));
    assert!(answer.text().contains("rate limited"));
    assert_eq!(rag.state(), PipelineState::Ready);
}

#[test]
fn query_embedding_failure_does_not_poison_the_pipeline() {
    let tmp = paris_notes();
    let generator = Arc::new(RecordingGenerator::default());
    let rag = pipeline(tmp.path(), Arc::new(TestEmbedder::failing_on("explode")), generator.clone());
    assert_eq!(rag.initialize(), PipelineState::Ready);

    assert!(matches!(rag.ask("please explode"), Answer::Failed(_)));
    assert!(matches!(rag.ask("What is the capital of France?"), Answer::Grounded { .. }));
    assert_eq!(generator.calls(), 1);
}

#[test]
fn empty_question_is_rejected_without_calls() {
    let tmp = paris_notes();
    let generator = Arc::new(RecordingGenerator::default());
    let rag = pipeline(tmp.path(), Arc::new(TestEmbedder::new()), generator.clone());
    rag.initialize();

    assert_eq!(rag.ask("   "), Answer::Failed("No question provided".to_string()));
    assert_eq!(generator.calls(), 0);
}

#[test]
fn uninitialized_pipeline_is_unavailable() {
    let tmp = paris_notes();
    let generator = Arc::new(RecordingGenerator::default());
    let rag = pipeline(tmp.path(), Arc::new(TestEmbedder::new()), generator.clone());

    assert_eq!(rag.state(), PipelineState::Uninitialized);
    assert!(matches!(rag.ask("hello?"), Answer::Unavailable(_)));
    assert_eq!(generator.calls(), 0);
}

#[test]
fn corpus_summary_lists_documents() {
    let tmp = paris_notes();
    let rag = pipeline(tmp.path(), Arc::new(TestEmbedder::new()), Arc::new(RecordingGenerator::default()));
    rag.initialize();

    let summary = rag.corpus_summary();
    assert!(summary.contains(&format!("📄 a.md\n{PARIS}...")));
    assert!(summary.contains("📄 b.txt\n"));
}

#[test]
fn concurrent_questions_share_the_index() {
    let tmp = paris_notes();
    let generator = Arc::new(RecordingGenerator::default());
    let rag = pipeline(tmp.path(), Arc::new(TestEmbedder::new()), generator.clone());
    rag.initialize();

    std::thread::scope(|s| {
        for i in 0..8 {
            let rag = &rag;
            s.spawn(move || {
                let answer = rag.ask(&format!("What is the capital of France? ({i})"));
                assert!(matches!(answer, Answer::Grounded { .. }), "{answer:?}");
            });
        }
    });
    assert_eq!(generator.calls(), 8);
}

#[test]
fn reinitialize_picks_up_new_notes() {
    let tmp = TempDir::new().unwrap();
    let rag = pipeline(tmp.path(), Arc::new(TestEmbedder::new()), Arc::new(RecordingGenerator::default()));
    assert_eq!(rag.initialize(), PipelineState::DegradedNoDocuments);

    fs::write(tmp.path().join("a.md"), PARIS).unwrap();
    assert_eq!(rag.initialize(), PipelineState::Ready);
    assert!(matches!(rag.ask("What is the capital of France?"), Answer::Grounded { .. }));
}

#[test]
fn custom_prompt_template_is_used() {
    let tmp = paris_notes();
    let generator = Arc::new(RecordingGenerator::default());
    let rag = pipeline(tmp.path(), Arc::new(TestEmbedder::new()), generator.clone())
        .with_prompt(PromptTemplate::new("Q={question}\nC={context}").unwrap());
    rag.initialize();
    rag.ask("capital of France");

    let prompts = generator.prompts.lock();
    assert!(prompts[0].starts_with("Q=capital of France\nC=[SOURCE: "));
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let mut config = RagConfig::default();
    config.chunking.chunk_overlap = config.chunking.chunk_size;
    let err = RagPipeline::new(config, Arc::new(TestEmbedder::new()), Arc::new(RecordingGenerator::default()));
    assert!(matches!(err, Err(Error::InvalidConfig(_))));
}
