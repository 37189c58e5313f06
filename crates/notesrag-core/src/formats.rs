//! Per-format text extraction.
//!
//! Each `DocumentFormat` variant owns one reader. Adding a format means adding
//! a variant, its extensions and its reader; nothing else branches on
//! extensions.

use std::fs;
use std::path::Path;

use docx_rs::{DocumentChild, ParagraphChild, RunChild};

use crate::error::{Error, Result};
use crate::types::{DocumentFormat, SourceDocument};

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 3] = [DocumentFormat::Text, DocumentFormat::Pdf, DocumentFormat::Docx];

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            DocumentFormat::Text => &["md", "txt"],
            DocumentFormat::Pdf => &["pdf"],
            DocumentFormat::Docx => &["docx"],
        }
    }

    /// Format for a path by its (case-insensitive) extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extensions().contains(&ext.as_str()))
    }

    pub fn read(self, path: &Path) -> Result<SourceDocument> {
        let raw_text = match self {
            DocumentFormat::Text => read_text(path)?,
            DocumentFormat::Pdf => read_pdf(path)?,
            DocumentFormat::Docx => read_docx(path)?,
        };
        Ok(SourceDocument { path: path.to_path_buf(), raw_text, format: self })
    }
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::load(path, e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::load(path, format!("invalid UTF-8: {e}")))
}

fn read_pdf(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::load(path, e.to_string()))?;
    // pdf-extract panics on some malformed files instead of returning an error.
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(Error::load(path, e.to_string())),
        Err(_) => Err(Error::load(path, "PDF parser aborted on malformed input")),
    }
}

fn read_docx(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::load(path, e.to_string()))?;
    let doc = docx_rs::read_docx(&bytes).map_err(|e| Error::load(path, e.to_string()))?;

    let mut paragraphs = Vec::new();
    for child in doc.document.children {
        if let DocumentChild::Paragraph(p) = child {
            let mut text = String::new();
            push_paragraph_text(&p.children, &mut text);
            paragraphs.push(text);
        }
    }
    Ok(paragraphs.join("\n\n"))
}

/// Text of runs, including runs nested in hyperlinks.
fn push_paragraph_text(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for child in &run.children {
                    match child {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        RunChild::Break(_) => out.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_paragraph_text(&link.children, out),
            _ => {}
        }
    }
}
