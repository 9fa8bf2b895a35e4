use crate::domain::SafetyVerdict;

/// Pure, synchronous gate applied around every question.
pub trait ContentFilter: Send + Sync {
    fn check(&self, text: &str) -> SafetyVerdict;
    fn annotate(&self, answer: String) -> String;
}
