//! Rendering retrieved chunks and loaded documents as text.

use notesrag_core::types::{ScoredChunk, SourceDocument};

/// Placed between two chunks in the assembled context.
pub const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

const PREVIEW_CHARS: usize = 200;

pub fn source_tag(name: &str) -> String {
    format!("[SOURCE: {name}]")
}

/// One `[SOURCE: name]` block per hit, in retrieval order. Empty input gives
/// an empty string.
pub fn assemble(hits: &[ScoredChunk]) -> String {
    hits.iter()
        .map(|hit| format!("{}\n{}", source_tag(&hit.chunk.source_name()), hit.chunk.text))
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR)
}

/// Distinct source file names of `hits`, first occurrence wins.
pub fn source_names(hits: &[ScoredChunk]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for hit in hits {
        let name = hit.chunk.source_name();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Short listing of the loaded documents: file name plus the first 200 characters.
pub fn corpus_summary(docs: &[SourceDocument]) -> String {
    docs.iter()
        .map(|doc| {
            let preview: String = doc.raw_text.chars().take(PREVIEW_CHARS).collect();
            format!("📄 {}\n{}...", doc.file_name(), preview)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
