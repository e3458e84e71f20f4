//! Media host abstraction trait
//!
//! This module defines the MediaHost trait that every attachment host must implement.

use async_trait::async_trait;
use bugmail_core::models::ResourceType;
use bytes::Bytes;
use thiserror::Error;

/// Media host operation errors
///
/// The `Display` form of every variant carries the host's own diagnostic text,
/// which is what the size-limit parser inspects.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid response from media host: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for HostError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HostError::Timeout(err.to_string())
        } else {
            HostError::Transport(err.to_string())
        }
    }
}

/// Result type for media host operations
pub type HostResult<T> = Result<T, HostError>;

/// A single file to publish.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub resource_type: ResourceType,
    pub data: Bytes,
}

/// What the host reports after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub secure_url: String,
    pub public_id: Option<String>,
    pub bytes: Option<u64>,
}

/// Media host abstraction trait
///
/// Implementations publish a file and return its public URL. Uploads of
/// different files are independent and may run concurrently.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Upload a file and return the host's view of it
    async fn upload(&self, request: UploadRequest) -> HostResult<UploadedMedia>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}
