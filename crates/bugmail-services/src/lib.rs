//! Bugmail Services Layer
//!
//! This crate is the **business service layer**: it hosts the attachment
//! uploader, the report composer, the SMTP dispatcher and the submission
//! pipeline that coordinates them, and re-exports a unified API from
//! processing and storage so that front ends depend on a single facade.

pub mod composer;
pub mod email;
pub mod submission;
pub mod uploader;

pub use bugmail_processing::{CompressionResult, FileClassifier, ImageCompressor, LabelCounters};
pub use bugmail_storage::{
    create_media_host, CloudinaryHost, HostError, HostResult, MediaHost, UploadRequest,
    UploadedMedia,
};
pub use composer::ReportComposer;
pub use email::{DispatchError, EmailDispatcher, ReportMailer, SmtpDispatcher};
pub use submission::{SubmissionReceipt, SubmissionService};
pub use uploader::AttachmentUploader;
