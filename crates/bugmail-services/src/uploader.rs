//! Attachment upload orchestration.
//!
//! Classifies a submission's files, shrinks oversized screenshots and
//! publishes everything to the media host. Per-file failures are recorded as
//! data in the returned [`UploadSummary`]; this module never fails a submission.

use bugmail_core::models::{
    Attachment, ClassifiedAttachment, UploadFailure, UploadOutcome, UploadSummary, UploadedLink,
};
use bugmail_core::UploadConfig;
use bugmail_processing::{FileClassifier, ImageCompressor};
use bugmail_storage::{MediaHost, UploadRequest};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;

pub struct AttachmentUploader {
    host: Arc<dyn MediaHost>,
    config: UploadConfig,
}

impl AttachmentUploader {
    pub fn new(host: Arc<dyn MediaHost>, config: UploadConfig) -> Self {
        Self { host, config }
    }

    /// Label every attachment in one pass, in submission order.
    pub fn classify(attachments: Vec<Attachment>) -> Vec<ClassifiedAttachment> {
        let classifications =
            FileClassifier::classify_all(attachments.iter().map(|a| a.filename.as_str()));
        attachments
            .into_iter()
            .zip(classifications)
            .map(|(attachment, classification)| ClassifiedAttachment {
                attachment,
                classification,
            })
            .collect()
    }

    /// Upload all attachments and return one outcome per input, in input order.
    ///
    /// Labels are fixed before any network I/O. With `concurrency > 1` several
    /// uploads are in flight at once, but results are still collected in order.
    pub async fn upload_all(&self, attachments: Vec<Attachment>) -> UploadSummary {
        let classified = Self::classify(attachments);
        let total = classified.len();
        let concurrency = self.config.concurrency.max(1);

        let summary: UploadSummary = stream::iter(classified)
            .map(|item| self.upload_one(item))
            .buffered(concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect();

        tracing::info!(
            total = total,
            uploaded = summary.success_count(),
            failed = summary.failure_count(),
            backend = self.host.backend_name(),
            "Attachment upload finished"
        );

        summary
    }

    async fn upload_one(&self, item: ClassifiedAttachment) -> UploadOutcome {
        let label = item.label().to_string();
        let original_name = item.filename().to_string();
        let (filename, data) = self.prepare(&item).await;

        let request = UploadRequest {
            filename,
            resource_type: item.classification.resource_type,
            data,
        };

        match self.host.upload(request).await {
            Ok(media) => UploadOutcome::Success(UploadedLink {
                label,
                url: media.secure_url,
            }),
            Err(e) => {
                let failure = UploadFailure::from_provider_text(&original_name, &e.to_string());
                tracing::warn!(
                    filename = %original_name,
                    category = ?item.classification.category,
                    size_limit_exceeded = failure.is_size_limit_exceeded(),
                    error = %e,
                    "Attachment upload failed"
                );
                UploadOutcome::Failure(failure)
            }
        }
    }

    /// Bytes and filename to send. Oversized screenshots are re-encoded as
    /// JPEG; anything that cannot be decoded goes out unchanged.
    async fn prepare(&self, item: &ClassifiedAttachment) -> (String, Bytes) {
        let original = (item.filename().to_string(), item.attachment.data.clone());
        let size = item.attachment.size_bytes() as u64;
        if !item.is_compressible() || size <= self.config.max_image_bytes {
            return original;
        }

        let data = item.attachment.data.clone();
        let target = self.config.max_image_bytes;
        let min_quality = self.config.min_jpeg_quality;
        let result = tokio::task::spawn_blocking(move || {
            ImageCompressor::compress_bytes(&data, target, min_quality)
        })
        .await;

        match result {
            Ok(Ok(compressed)) => {
                tracing::info!(
                    filename = %item.filename(),
                    original_bytes = size,
                    compressed_bytes = compressed.size_bytes,
                    quality = compressed.quality,
                    within_target = compressed.within_target,
                    "Screenshot compressed before upload"
                );
                (jpeg_filename(item.filename()), compressed.data)
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    filename = %item.filename(),
                    error = %e,
                    "Screenshot could not be decoded, uploading as-is"
                );
                original
            }
            Err(e) => {
                tracing::error!(filename = %item.filename(), error = %e, "Compression task failed");
                original
            }
        }
    }
}

/// `shot.png` -> `shot.jpg`; the host keeps the submitted name.
fn jpeg_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("screenshot");
    format!("{}.jpg", stem)
}
