use notesrag_core::{Error, Result};

pub const QUESTION_PLACEHOLDER: &str = "{question}";
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

pub const DEFAULT_TEMPLATE: &str = "You are a helpful notes assistant. Use only the provided context to answer the question.
Cite sources like [SOURCE: filename.md] when relevant.

Question:
{question}

Context:
{context}

Answer succinctly, with bullet points when helpful, and list sources at the end.";

/// Prompt text with `{question}` and `{context}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string() }
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [QUESTION_PLACEHOLDER, CONTEXT_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(Error::InvalidConfig(format!("prompt template is missing {placeholder}")));
            }
        }
        Ok(Self { template })
    }

    /// Substitute both placeholders in one left-to-right pass. Placeholder
    /// text inside `question` or `context` is copied as-is.
    pub fn render(&self, question: &str, context: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + question.len() + context.len());
        let mut rest = self.template.as_str();
        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix(QUESTION_PLACEHOLDER) {
                out.push_str(question);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(CONTEXT_PLACEHOLDER) {
                out.push_str(context);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}
