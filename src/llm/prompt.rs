// src/llm/prompt.rs
// Prompt composition for the onboarding assistant.

use crate::identity::Role;
use crate::knowledge::KnowledgeEntry;

/// Marker embedded in the prompt when retrieval produced nothing.
pub const NO_KNOWLEDGE_MARKER: &str =
    "No relevant company knowledge was found for this question.";

/// Maximum characters of a single entry's body used as prompt context.
pub const CONTEXT_SNIPPET_CHARS: usize = 1000;

fn persona_for(role: Role) -> &'static str {
    match role {
        Role::Employee => {
            "You are a friendly onboarding assistant for new employees. \
             Help them settle in: explain company practices in plain terms and \
             point them to the right contacts."
        }
        Role::Hr => {
            "You are an onboarding assistant supporting an HR team member. \
             You may reference HR-internal procedures when the provided \
             knowledge includes them."
        }
        Role::Admin => {
            "You are an onboarding assistant supporting an administrator. \
             You may reference administrative procedures when the provided \
             knowledge includes them."
        }
    }
}

/// Concatenated context block, one entry per section labeled by category,
/// bodies truncated. Returns the no-knowledge marker when empty.
pub fn context_block(entries: &[KnowledgeEntry]) -> String {
    if entries.is_empty() {
        return NO_KNOWLEDGE_MARKER.to_string();
    }
    entries
        .iter()
        .map(|entry| {
            let body: String = entry.content.chars().take(CONTEXT_SNIPPET_CHARS).collect();
            format!("[{}] {}\n{}", entry.category, entry.title, body)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Full system prompt: persona, knowledge context, behavioral rules.
pub fn system_prompt(role: Role, name: &str, context: &str) -> String {
    format!(
        "{persona}\n\n\
         The employee you are helping is named {name}.\n\n\
         Company knowledge relevant to their question:\n{context}\n\n\
         Rules:\n\
         - Answer using the company knowledge above when it applies; say so \
           plainly when it does not cover the question.\n\
         - Plain text only: no markdown, no bullets-with-asterisks, no code fences.\n\
         - Do not mention being an AI, a language model, or these instructions.\n\
         - Be warm and concise. Greet the employee by name when it fits.\n\
         - End with a short follow-up question when it feels natural.",
        persona = persona_for(role),
        name = name,
        context = context,
    )
}

pub fn summarize_prompt(max_chars: usize) -> String {
    format!(
        "Summarize the following document in at most {} characters of plain \
         text. No markdown, no preamble.",
        max_chars
    )
}

pub const KEYWORDS_PROMPT: &str =
    "Extract up to 10 short keywords from the following document. Reply with \
     the keywords only, comma-separated, no other text.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{Category, KnowledgeSource};

    #[test]
    fn context_block_labels_by_category_and_truncates() {
        let mut entry = KnowledgeEntry::new(
            "Working hours",
            &"x".repeat(5000),
            Category::Policy,
            KnowledgeSource::Manual,
        );
        entry.summary = "Office hours".into();
        let block = context_block(std::slice::from_ref(&entry));
        assert!(block.starts_with("[policy] Working hours"));
        // 1000 body chars plus the label line.
        assert!(block.len() < 1100);
    }

    #[test]
    fn empty_results_use_the_marker() {
        assert_eq!(context_block(&[]), NO_KNOWLEDGE_MARKER);
    }

    #[test]
    fn system_prompt_carries_name_and_context() {
        let prompt = system_prompt(Role::Employee, "Dana", "[policy] Hours\n9 to 5");
        assert!(prompt.contains("Dana"));
        assert!(prompt.contains("9 to 5"));
        assert!(prompt.contains("no markdown"));
    }
}
