//! Recursive, boundary-aware text splitter.
//!
//! Text is first cut into pieces using the coarsest separator present, and
//! any piece still longer than `chunk_size` is cut again with the next finer
//! separator. Pieces are then merged greedily into chunks of at most
//! `chunk_size` characters; each new chunk starts by repeating up to
//! `chunk_overlap` trailing characters of the previous one.
//!
//! Chunks are exact substrings of the input (separators are kept at the end
//! of the piece they terminate), and consecutive chunks always touch or
//! overlap. Overlap is a target: when the trailing piece of a chunk is larger
//! than `chunk_overlap` the next chunk starts at that piece's end instead.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Chunk, SourceDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Piece {
    start: usize,
    end: usize,
    chars: usize,
}

/// Byte range of one chunk within the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn chunk_documents(&self, docs: &[SourceDocument]) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = docs.iter().flat_map(|d| self.chunk_document(d)).collect();
        debug!(documents = docs.len(), chunks = chunks.len(), "chunked documents");
        chunks
    }

    pub fn chunk_document(&self, doc: &SourceDocument) -> Vec<Chunk> {
        self.split_spans(&doc.raw_text)
            .into_iter()
            .enumerate()
            .map(|(sequence_index, span)| Chunk {
                text: doc.raw_text[span.start..span.end].to_string(),
                source_path: doc.path.clone(),
                sequence_index,
                offset: span.start,
            })
            .collect()
    }

    pub fn split_text<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.split_spans(text).into_iter().map(|s| &text[s.start..s.end]).collect()
    }

    pub fn split_spans(&self, text: &str) -> Vec<Span> {
        let mut pieces = Vec::new();
        self.split_pieces(text, 0, &self.config.separators, &mut pieces);
        self.merge(&pieces)
    }

    fn split_pieces(&self, text: &str, base: usize, separators: &[String], out: &mut Vec<Piece>) {
        if text.is_empty() {
            return;
        }
        let chars = text.chars().count();
        if chars <= self.config.chunk_size {
            out.push(Piece { start: base, end: base + text.len(), chars });
            return;
        }

        let Some(pos) = separators.iter().position(|s| s.is_empty() || text.contains(s.as_str())) else {
            // No separator left to try: the unit is indivisible and stays oversized.
            out.push(Piece { start: base, end: base + text.len(), chars });
            return;
        };
        let separator = separators[pos].as_str();
        let finer = &separators[pos + 1..];

        if separator.is_empty() {
            for (i, ch) in text.char_indices() {
                out.push(Piece { start: base + i, end: base + i + ch.len_utf8(), chars: 1 });
            }
            return;
        }

        let mut offset = 0;
        for part in text.split_inclusive(separator) {
            self.split_pieces(part, base + offset, finer, out);
            offset += part.len();
        }
    }

    fn merge(&self, pieces: &[Piece]) -> Vec<Span> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let mut spans = Vec::new();
        let mut window: VecDeque<Piece> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            if total + piece.chars > size && !window.is_empty() {
                spans.push(window_span(&window));
                while total > overlap || (total > 0 && total + piece.chars > size) {
                    let Some(front) = window.pop_front() else { break };
                    total -= front.chars;
                }
            }
            window.push_back(piece);
            total += piece.chars;
        }
        if !window.is_empty() {
            spans.push(window_span(&window));
        }
        spans
    }
}

fn window_span(window: &VecDeque<Piece>) -> Span {
    let start = window.front().map_or(0, |p| p.start);
    let end = window.back().map_or(start, |p| p.end);
    Span { start, end }
}
