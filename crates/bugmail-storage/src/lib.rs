//! Bugmail Storage Library
//!
//! This crate provides the media host abstraction used to publish report
//! attachments, and the signed, chunked HTTP client for the hosted media API.
//!
//! # Upload protocol
//!
//! Every file is sent as one or more `multipart/form-data` POSTs to
//! `{api_base}/v1_1/{cloud_name}/{resource_type}/upload`. Files larger than the
//! configured chunk size are split; each chunk carries the same
//! `X-Unique-Upload-Id` and a `Content-Range: bytes {start}-{end}/{total}` header.
//! The response to the final chunk holds the public `secure_url`.

pub mod cloudinary;
pub mod factory;
pub mod traits;

// Re-export commonly used types
pub use cloudinary::CloudinaryHost;
pub use factory::create_media_host;
pub use traits::{HostError, HostResult, MediaHost, UploadRequest, UploadedMedia};
