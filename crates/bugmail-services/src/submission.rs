//! Submission pipeline: validate, upload, compose, send.

use crate::composer::ReportComposer;
use crate::email::{ReportMailer, SmtpDispatcher};
use crate::uploader::AttachmentUploader;
use bugmail_core::models::{AddressBook, AddressBookEntry, Attachment, BugReport, UploadSummary};
use bugmail_core::{AppError, Config};
use bugmail_storage::{create_media_host, MediaHost};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use validator::Validate;

pub const SUCCESS_MESSAGE: &str =
    "Email sent successfully! Attachments are provided as links.";

/// What a successful submission produced.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub recipient: AddressBookEntry,
    pub subject: String,
    pub uploads: UploadSummary,
}

impl SubmissionReceipt {
    pub fn success_message(&self) -> &'static str {
        SUCCESS_MESSAGE
    }

    /// One line per attachment that did not make it into the email.
    pub fn warnings(&self) -> Vec<String> {
        self.uploads.failures().iter().map(|f| f.message()).collect()
    }
}

pub struct SubmissionService {
    config: Config,
    uploader: AttachmentUploader,
    mailer: Arc<dyn ReportMailer>,
}

impl SubmissionService {
    pub fn new(config: Config, host: Arc<dyn MediaHost>, mailer: Arc<dyn ReportMailer>) -> Self {
        let uploader = AttachmentUploader::new(host, config.upload().clone());
        Self {
            config,
            uploader,
            mailer,
        }
    }

    /// Wire the production media host and SMTP dispatcher.
    ///
    /// A disabled configuration is refused here, before any client is built.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        if !config.send_report_email() {
            return Err(AppError::ConfigurationDisabled);
        }

        let host =
            create_media_host(&config).map_err(|e| AppError::Configuration(e.to_string()))?;
        let mailer = SmtpDispatcher::from_config(config.smtp())
            .map_err(|e| AppError::Configuration(e.to_string()))?;
        Ok(Self::new(config, host, Arc::new(mailer)))
    }

    pub fn recipients(&self) -> &AddressBook {
        self.config.address_book()
    }

    /// Run one submission end to end.
    ///
    /// `recipient` selects an address book entry by index, address or label.
    /// Upload failures do not fail the submission; they are returned in the
    /// receipt. Cancelling `cancel` drops whatever is in flight.
    pub async fn submit(
        &self,
        report: &BugReport,
        recipient: &str,
        attachments: Vec<Attachment>,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReceipt, AppError> {
        report.validate()?;

        if !self.config.send_report_email() {
            tracing::warn!("Report rejected: email sending is disabled");
            return Err(AppError::ConfigurationDisabled);
        }

        let entry = self
            .recipients()
            .resolve(recipient)
            .cloned()
            .ok_or_else(|| AppError::UnknownRecipient(recipient.to_string()))?;

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let attachment_count = attachments.len();
        tracing::info!(
            recipient = %entry.address,
            attachments = attachment_count,
            "Submitting bug report"
        );

        let uploads = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!("Submission cancelled during upload");
                return Err(AppError::Cancelled);
            }
            summary = self.uploader.upload_all(attachments) => summary,
        };

        let html = ReportComposer::compose(report, &uploads.links());
        let subject = report.subject();
        let to = vec![entry.address.clone()];

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!("Submission cancelled before the email was sent");
                return Err(AppError::Cancelled);
            }
            sent = self.mailer.send(&subject, &html, &to) => sent,
        };
        sent.map_err(|e| {
            tracing::error!(error = %e, recipient = %entry.address, "Report email failed");
            AppError::Dispatch(e.to_string())
        })?;

        tracing::info!(
            recipient = %entry.address,
            uploaded = uploads.success_count(),
            failed = uploads.failure_count(),
            "Bug report submitted"
        );

        Ok(SubmissionReceipt {
            recipient: entry,
            subject,
            uploads,
        })
    }
}
