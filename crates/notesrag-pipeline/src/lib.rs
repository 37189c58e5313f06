//! notesrag-pipeline
//!
//! Question answering over the notes corpus: retrieval, context assembly,
//! prompt rendering, generation and the orchestrator that owns the
//! pipeline state.

pub mod context;
pub mod generator;
pub mod pipeline;
pub mod prompt;
pub mod retriever;

pub use generator::{default_generator, EchoGenerator, OpenAiChatGenerator};
pub use pipeline::{Answer, PipelineState, RagPipeline};
pub use prompt::PromptTemplate;
pub use retriever::Retriever;
