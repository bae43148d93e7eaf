use serde::Serialize;

/// Recorded when a rule fires on a line: which rule, what it matched,
/// and what the match became.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub rule_name: &'static str,
    pub before_fragment: String,
    pub after_fragment: String,
}

/// Per-line output of the engine.
///
/// `changed` is true iff `changes` is non-empty. For annotation-only rules
/// the line text can be identical to the input while `changed` is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineResult {
    pub line: String,
    pub changed: bool,
    pub changes: Vec<ChangeRecord>,
}
