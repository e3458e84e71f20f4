use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A user-submitted file accompanying a bug report.
///
/// Owned by the upload pipeline for the duration of one submission.
#[derive(Clone)]
pub struct Attachment {
    pub filename: String,
    pub data: Bytes,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("size_bytes", &self.data.len())
            .finish()
    }
}

/// Display category used for labelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentCategory {
    Image,
    Video,
    Document,
    Other,
}

/// The media host's classification of a byte stream. Controls how the host
/// stores and serves it, and can differ from [`AttachmentCategory`] (PDFs are
/// labelled as screenshots but travel as raw files).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Video,
    Raw,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
            ResourceType::Raw => "raw",
        }
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: AttachmentCategory,
    pub resource_type: ResourceType,
    pub label: String,
}

/// An attachment together with its classification, ready for upload.
#[derive(Debug, Clone)]
pub struct ClassifiedAttachment {
    pub attachment: Attachment,
    pub classification: Classification,
}

impl ClassifiedAttachment {
    pub fn label(&self) -> &str {
        &self.classification.label
    }

    pub fn filename(&self) -> &str {
        &self.attachment.filename
    }

    /// Only true image transports are candidates for re-encoding.
    pub fn is_compressible(&self) -> bool {
        self.classification.category == AttachmentCategory::Image
            && self.classification.resource_type == ResourceType::Image
    }
}
