// src/chat/intent.rs
// Pure keyword-based intent classification and quick-reply derivation.

use serde::Serialize;

use crate::identity::Role;
use crate::knowledge::{Category, KnowledgeEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Greeting,
    Thanks,
    Policy,
    Benefit,
    Hr,
    It,
    Emergency,
    Equipment,
    Training,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Thanks => "thanks",
            Intent::Policy => "policy",
            Intent::Benefit => "benefit",
            Intent::Hr => "hr",
            Intent::It => "it",
            Intent::Emergency => "emergency",
            Intent::Equipment => "equipment",
            Intent::Training => "training",
            Intent::General => "general",
        }
    }
}

/// Patterns are tested in this fixed priority order; the first match wins.
/// Emergency outranks everything, social intents outrank topical ones, and
/// IT outranks HR so device problems ("my laptop...") never land in HR.
/// The order is part of the observable contract; change with care.
const PATTERNS: &[(Intent, &[&str])] = &[
    (
        Intent::Emergency,
        &["emergency", "urgent", "fire", "accident", "injured", "evacuat"],
    ),
    (
        Intent::Greeting,
        &["hello", "hi ", "hi!", "hi,", "hey", "good morning", "good afternoon"],
    ),
    (Intent::Thanks, &["thank", "thanks", "appreciate"]),
    (
        Intent::It,
        &[
            "laptop", "computer", "password", "wifi", "wi-fi", "vpn", "printer",
            "software", "login", "log in", "email setup", "it support", "it help",
        ],
    ),
    (
        Intent::Hr,
        &[
            "vacation", "leave", "pto", "time off", "holiday", "payroll", "salary",
            "paycheck", "sick day", "hr ",
        ],
    ),
    (
        Intent::Benefit,
        &["benefit", "insurance", "health plan", "dental", "401k", "pension", "perks"],
    ),
    (
        Intent::Policy,
        &["policy", "policies", "rule", "guideline", "dress code", "code of conduct"],
    ),
    (
        Intent::Equipment,
        &["equipment", "desk", "chair", "monitor", "badge", "keycard", "headset"],
    ),
    (
        Intent::Training,
        &["training", "course", "onboarding plan", "learn", "certification", "workshop"],
    ),
];

/// Classify free text into an intent. Case-insensitive substring match in
/// the fixed order above; `general` when nothing matches.
pub fn classify_intent(text: &str) -> Intent {
    let lowered = text.to_lowercase();
    for (intent, needles) in PATTERNS {
        if needles.iter().any(|needle| lowered.contains(needle)) {
            return *intent;
        }
    }
    Intent::General
}

/// The four suggestions always offered.
const DEFAULT_QUICK_REPLIES: [&str; 4] = [
    "What are the working hours?",
    "How do I set up my email?",
    "Who do I contact for IT help?",
    "Where can I find the employee handbook?",
];

fn category_suggestion(category: Category) -> &'static str {
    match category {
        Category::Policy => "Show me company policies",
        Category::Benefits => "What benefits do I get?",
        Category::It => "I need IT support",
        Category::Hr => "Connect me with HR",
        Category::General => "Tell me more about the company",
        Category::AdminOnly => "Show admin resources",
        Category::HrOnly => "Show HR team resources",
    }
}

/// Suggested follow-ups: one suggestion per distinct category in the
/// retrieved knowledge, padded with the defaults, de-duplicated, at most
/// five. Category suggestions come first so retrieval context always
/// survives the cap.
pub fn derive_quick_replies(results: &[KnowledgeEntry], _role: Role) -> Vec<String> {
    let mut replies: Vec<String> = Vec::new();

    for entry in results {
        let suggestion = category_suggestion(entry.category).to_string();
        if !replies.contains(&suggestion) {
            replies.push(suggestion);
        }
    }

    for default in DEFAULT_QUICK_REPLIES {
        let default = default.to_string();
        if !replies.contains(&default) {
            replies.push(default);
        }
    }

    replies.truncate(5);
    replies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeSource;

    #[test]
    fn greeting_is_detected() {
        assert_eq!(classify_intent("Hello there!"), Intent::Greeting);
    }

    #[test]
    fn vacation_request_is_hr() {
        assert_eq!(classify_intent("How do I request vacation?"), Intent::Hr);
    }

    #[test]
    fn device_trouble_is_it() {
        assert_eq!(classify_intent("My laptop won't turn on"), Intent::It);
    }

    #[test]
    fn unmatched_text_is_general() {
        assert_eq!(classify_intent("asdlkj random text"), Intent::General);
    }

    #[test]
    fn emergency_outranks_everything() {
        assert_eq!(
            classify_intent("Urgent: my laptop caught fire"),
            Intent::Emergency
        );
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify_intent("HELLO!"), Intent::Greeting);
    }

    #[test]
    fn quick_replies_cover_retrieved_categories_and_cap_at_five() {
        let results = vec![
            KnowledgeEntry::new("Remote policy", "...", Category::Policy, KnowledgeSource::Manual),
            KnowledgeEntry::new("VPN guide", "...", Category::It, KnowledgeSource::Manual),
            KnowledgeEntry::new("Insurance", "...", Category::Benefits, KnowledgeSource::Manual),
        ];
        let replies = derive_quick_replies(&results, Role::Employee);
        assert!(replies.len() <= 5);
        assert!(replies.contains(&"Show me company policies".to_string()));
        assert!(replies.contains(&"I need IT support".to_string()));
    }

    #[test]
    fn quick_replies_deduplicate_categories() {
        let results = vec![
            KnowledgeEntry::new("A", "...", Category::Policy, KnowledgeSource::Manual),
            KnowledgeEntry::new("B", "...", Category::Policy, KnowledgeSource::Manual),
        ];
        let replies = derive_quick_replies(&results, Role::Employee);
        let policy_count = replies
            .iter()
            .filter(|r| *r == "Show me company policies")
            .count();
        assert_eq!(policy_count, 1);
    }

    #[test]
    fn defaults_alone_when_nothing_retrieved() {
        let replies = derive_quick_replies(&[], Role::Employee);
        assert_eq!(replies.len(), 4);
    }
}
