//! Filename classification and display labels.
//!
//! Labels are assigned per submission: screenshots and videos are numbered
//! independently in encounter order (`SCREENSHOT1`, `VIDEO1`, ...), everything
//! else is labelled after its filename.

use bugmail_core::models::{AttachmentCategory, Classification, ResourceType};
use std::path::Path;

/// Extensions labelled as screenshots. PDF is included for labelling but is
/// uploaded as a raw file.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pdf"];

/// Extensions labelled as videos, including animated image formats.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "webm", "avi", "mkv", "mpeg", "mpg", "wmv", "flv", "gif", "edf",
];

/// Extensions reported as documents. Labelled and transported like any other file.
pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    "txt", "log", "csv", "json", "xml", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "zip",
];

/// Per-submission label counters. Both start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCounters {
    screenshots: u32,
    videos: u32,
}

impl Default for LabelCounters {
    fn default() -> Self {
        Self {
            screenshots: 1,
            videos: 1,
        }
    }
}

impl LabelCounters {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_screenshot(&mut self) -> u32 {
        let n = self.screenshots;
        self.screenshots += 1;
        n
    }

    fn next_video(&mut self) -> u32 {
        let n = self.videos;
        self.videos += 1;
        n
    }
}

/// Lowercased extension, if the filename has one.
fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

pub struct FileClassifier;

impl FileClassifier {
    /// Classify `filename`, advancing `counters` when a numbered label is used.
    pub fn classify(filename: &str, counters: &mut LabelCounters) -> Classification {
        let extension = extension_of(filename);
        let extension = extension.as_deref().unwrap_or("");

        if IMAGE_EXTENSIONS.contains(&extension) {
            let resource_type = if extension == "pdf" {
                ResourceType::Raw
            } else {
                ResourceType::Image
            };
            return Classification {
                category: AttachmentCategory::Image,
                resource_type,
                label: format!("SCREENSHOT{}", counters.next_screenshot()),
            };
        }

        if VIDEO_EXTENSIONS.contains(&extension) {
            return Classification {
                category: AttachmentCategory::Video,
                resource_type: ResourceType::Video,
                label: format!("VIDEO{}", counters.next_video()),
            };
        }

        let category = if DOCUMENT_EXTENSIONS.contains(&extension) {
            AttachmentCategory::Document
        } else {
            AttachmentCategory::Other
        };
        Classification {
            category,
            resource_type: ResourceType::Raw,
            label: format!("FILE_{}", filename),
        }
    }

    /// Classify a whole submission in one pass, preserving order.
    pub fn classify_all<'a, I>(filenames: I) -> Vec<Classification>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counters = LabelCounters::new();
        filenames
            .into_iter()
            .map(|name| Self::classify(name, &mut counters))
            .collect()
    }
}
