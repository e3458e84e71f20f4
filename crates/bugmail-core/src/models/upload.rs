use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Byte counts recovered from a provider's free-text size-limit error,
/// e.g. `File size too large. Got 79655928. Maximum is 10485760.`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLimitFacts {
    pub got_bytes: u64,
    pub max_bytes: u64,
}

static SIZE_LIMIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bgot\s+(\d+).*?\bmaximum\s+is\s+(\d+)")
        .expect("size limit pattern is a valid regex")
});

impl SizeLimitFacts {
    /// Returns `None` when the text carries no `Got <n> ... Maximum is <m>` pair.
    pub fn parse(error_text: &str) -> Option<Self> {
        let captures = SIZE_LIMIT_PATTERN.captures(error_text)?;
        let got_bytes = captures.get(1)?.as_str().parse().ok()?;
        let max_bytes = captures.get(2)?.as_str().parse().ok()?;
        Some(Self {
            got_bytes,
            max_bytes,
        })
    }

    pub fn got_mb(&self) -> String {
        format_megabytes(self.got_bytes)
    }

    pub fn max_mb(&self) -> String {
        format_megabytes(self.max_bytes)
    }
}

/// Formats a byte count as MiB with at most two decimals, truncating rather
/// than rounding so the figure never overstates what was measured.
/// Whole numbers keep one decimal (`10.0`).
pub fn format_megabytes(bytes: u64) -> String {
    let mb = (bytes as f64 / BYTES_PER_MB * 100.0).floor() / 100.0;
    let mut text = format!("{:.2}", mb);
    if text.ends_with('0') {
        text.pop();
    }
    text
}

/// An attachment that reached the media host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedLink {
    pub label: String,
    pub url: String,
}

/// An attachment that did not make it. Never fatal to the submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFailure {
    pub filename: String,
    pub reason: String,
    pub size_limit: Option<SizeLimitFacts>,
}

impl UploadFailure {
    /// Builds a failure from raw provider text, recovering size-limit facts
    /// when the text contains them.
    pub fn from_provider_text(filename: impl Into<String>, error_text: &str) -> Self {
        Self {
            filename: filename.into(),
            reason: error_text.to_string(),
            size_limit: SizeLimitFacts::parse(error_text),
        }
    }

    /// Human-readable notice for the submitter.
    pub fn message(&self) -> String {
        match &self.size_limit {
            Some(facts) => format!(
                "{}: file size {}MB exceeds the {}MB upload limit",
                self.filename,
                facts.got_mb(),
                facts.max_mb()
            ),
            None => format!("{}: upload failed - {}", self.filename, self.reason),
        }
    }

    pub fn is_size_limit_exceeded(&self) -> bool {
        self.size_limit.is_some()
    }
}

/// Per-attachment result, one per input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadOutcome {
    Success(UploadedLink),
    Failure(UploadFailure),
}

/// All outcomes of one submission, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadSummary {
    pub fn links(&self) -> Vec<UploadedLink> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                UploadOutcome::Success(link) => Some(link.clone()),
                UploadOutcome::Failure(_) => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<UploadFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                UploadOutcome::Failure(failure) => Some(failure.clone()),
                UploadOutcome::Success(_) => None,
            })
            .collect()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, UploadOutcome::Success(_)))
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl FromIterator<UploadOutcome> for UploadSummary {
    fn from_iter<I: IntoIterator<Item = UploadOutcome>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_size_limit_message() {
        let facts =
            SizeLimitFacts::parse("File size too large. Got 79655928. Maximum is 10485760.")
                .unwrap();
        assert_eq!(facts.got_bytes, 79655928);
        assert_eq!(facts.max_bytes, 10485760);
        assert_eq!(facts.got_mb(), "75.96");
        assert_eq!(facts.max_mb(), "10.0");
    }

    #[test]
    fn parse_tolerates_case_and_surrounding_text() {
        let facts = SizeLimitFacts::parse(
            "Upload rejected (400): file size too large. GOT 2048, while maximum IS 1024 bytes",
        )
        .unwrap();
        assert_eq!(facts.got_bytes, 2048);
        assert_eq!(facts.max_bytes, 1024);
    }

    #[test]
    fn parse_returns_none_without_both_numbers() {
        assert!(SizeLimitFacts::parse("Invalid image file").is_none());
        assert!(SizeLimitFacts::parse("Got 123 but no limit").is_none());
    }

    #[test]
    fn failure_message_prefers_size_limit_facts() {
        let failure = UploadFailure::from_provider_text(
            "huge.mov",
            "File size too large. Got 79655928. Maximum is 10485760.",
        );
        assert!(failure.is_size_limit_exceeded());
        assert_eq!(
            failure.message(),
            "huge.mov: file size 75.96MB exceeds the 10.0MB upload limit"
        );

        let raw = UploadFailure::from_provider_text("a.png", "Invalid Signature");
        assert!(!raw.is_size_limit_exceeded());
        assert_eq!(raw.message(), "a.png: upload failed - Invalid Signature");
    }

    #[test]
    fn summary_views_preserve_order() {
        let summary: UploadSummary = vec![
            UploadOutcome::Success(UploadedLink {
                label: "SCREENSHOT1".into(),
                url: "https://x/1".into(),
            }),
            UploadOutcome::Failure(UploadFailure::from_provider_text("b.mp4", "boom")),
            UploadOutcome::Success(UploadedLink {
                label: "SCREENSHOT2".into(),
                url: "https://x/2".into(),
            }),
        ]
        .into_iter()
        .collect();

        let labels: Vec<String> = summary.links().into_iter().map(|l| l.label).collect();
        assert_eq!(labels, vec!["SCREENSHOT1", "SCREENSHOT2"]);
        assert_eq!(summary.failure_count(), 1);
        assert_eq!(summary.failures()[0].filename, "b.mp4");
    }

    #[test]
    fn format_megabytes_trims_to_two_decimals() {
        assert_eq!(format_megabytes(1024 * 1024 * 3 / 2), "1.5");
        assert_eq!(format_megabytes(0), "0.0");
    }
}
