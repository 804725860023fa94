//! Prompt templates for tubelens.
//!
//! Defaults can be overridden by pointing `prompts.custom_path` at a TOML
//! file with the same structure.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    pub summary: SummaryPrompts,
}

/// Prompts for RAG answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub answer: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            answer: "You are an assistant answering questions about a YouTube video's \
transcript. Use only the context below to answer the question. If the answer is not \
contained, say you don't know.\n\nCONTEXT:\n{{context}}\n\nQUESTION: {{question}}\n\n\
Answer concisely:"
                .to_string(),
        }
    }
}

/// Prompts for transcript summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub window: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            window: "Summarize the following transcript excerpt in {{min_words}} to \
{{max_words}} words. Write plain prose, no preamble.\n\nEXCERPT:\n{{text}}"
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, applying overrides from the given TOML file if present.
    pub fn load(custom_path: Option<&Path>) -> crate::error::Result<Self> {
        match custom_path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&content)?)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// Substitute `{{name}}` placeholders in a template.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{{{}}}}}", name), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_all_vars() {
        let out = render(
            "Q: {{question}} C: {{context}}",
            &[("question", "why"), ("context", "because")],
        );
        assert_eq!(out, "Q: why C: because");
    }

    #[test]
    fn test_default_answer_prompt_instructs_ignorance() {
        let prompts = Prompts::default();
        assert!(prompts.rag.answer.contains("say you don't know"));
        assert!(prompts.rag.answer.contains("{{context}}"));
        assert!(prompts.rag.answer.contains("{{question}}"));
    }
}
