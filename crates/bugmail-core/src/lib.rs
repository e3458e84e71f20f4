//! Bugmail Core Library
//!
//! This crate provides the domain models, error taxonomy and configuration
//! shared by every bugmail component.

pub mod config;
pub mod error;
pub mod models;
pub mod transport_types;

// Re-export commonly used types
pub use config::{BugmailConfig, Config, MediaHostConfig, SmtpConfig, UploadConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use transport_types::{SignatureAlgorithm, SmtpSecurity};
