use crate::domain::{ports::ContentFilter, SafetyVerdict};

const BLOCKED_KEYWORDS: &[&str] = &[
    // violence and self-harm
    "kill",
    "murder",
    "suicide",
    "hurt yourself",
    // academic dishonesty and misuse
    "hack",
    "cheat",
    "exam answers",
    "homework answers",
    "nsfw",
    // personal information
    "phone number",
    "address",
    "password",
    "social security",
    "credit card",
    "adhaar card",
];

const OUT_OF_SCOPE: &[&str] = &[
    "love advice",
    "relationship",
    "dating",
    "politics",
    "religion",
    "financial advice",
];

const SOLUTION_MARKERS: &[&str] = &["solve", "solution", "answer", "calculate"];

pub const BLOCKED_REASON: &str =
    "Your query contains inappropriate or harmful content and cannot be processed.";
pub const OUT_OF_SCOPE_REASON: &str =
    "Your query is outside the educational scope of this AI tutor.";

/// Case-insensitive substring matching against two phrase lists: harmful
/// content first, then topics outside the curriculum.
pub struct KeywordFilter {
    blocked: Vec<String>,
    out_of_scope: Vec<String>,
    disclaimer: String,
}

impl KeywordFilter {
    pub fn new(disclaimer: impl Into<String>) -> Self {
        Self {
            blocked: BLOCKED_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            out_of_scope: OUT_OF_SCOPE.iter().map(|k| k.to_string()).collect(),
            disclaimer: disclaimer.into(),
        }
    }

    pub fn with_blocked(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.blocked = keywords
            .into_iter()
            .map(|k| k.into().to_lowercase())
            .collect();
        self
    }

    pub fn with_out_of_scope(
        mut self,
        topics: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.out_of_scope = topics
            .into_iter()
            .map(|t| t.into().to_lowercase())
            .collect();
        self
    }
}

impl ContentFilter for KeywordFilter {
    fn check(&self, text: &str) -> SafetyVerdict {
        let lowered = text.to_lowercase();
        if self.blocked.iter().any(|k| lowered.contains(k.as_str())) {
            return SafetyVerdict::reject(BLOCKED_REASON);
        }
        if self.out_of_scope.iter().any(|t| lowered.contains(t.as_str())) {
            return SafetyVerdict::reject(OUT_OF_SCOPE_REASON);
        }
        SafetyVerdict::allow()
    }

    fn annotate(&self, mut answer: String) -> String {
        let lowered = answer.to_lowercase();
        if SOLUTION_MARKERS.iter().any(|m| lowered.contains(m)) {
            answer.push_str("\n\n");
            answer.push_str(&self.disclaimer);
        }
        answer
    }
}
