use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const SUBJECT_PREFIX: &str = "[BUG REPORT]";

/// The structured free-text part of a bug report.
///
/// `summary`, `steps`, `expected` and `actual` are required; `notes` may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BugReport {
    #[validate(custom(function = "non_blank"))]
    pub summary: String,
    #[validate(custom(function = "non_blank"))]
    pub steps: String,
    #[validate(custom(function = "non_blank"))]
    pub expected: String,
    #[validate(custom(function = "non_blank"))]
    pub actual: String,
    #[serde(default)]
    pub notes: String,
}

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

impl BugReport {
    /// Email subject line. Whitespace (including newlines) in the summary is
    /// collapsed so the header stays on one line.
    pub fn subject(&self) -> String {
        let summary = self.summary.split_whitespace().collect::<Vec<_>>().join(" ");
        format!("{} {}", SUBJECT_PREFIX, summary)
    }

    /// Reproduction steps, one per non-blank line, in original order.
    /// Lines are kept as typed, indentation included.
    pub fn step_lines(&self) -> impl Iterator<Item = &str> {
        self.steps.lines().filter(|line| !line.trim().is_empty())
    }
}
