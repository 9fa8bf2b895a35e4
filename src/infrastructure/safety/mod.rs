mod keyword;

pub use keyword::{KeywordFilter, BLOCKED_REASON, OUT_OF_SCOPE_REASON};
