//! Error types module
//!
//! Submission-level failures are unified under `AppError`. Per-attachment upload
//! failures are deliberately not errors: they are recorded as
//! [`UploadOutcome::Failure`](crate::models::UploadOutcome) so that one bad file never
//! blocks the report email.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues and administrative states
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the submitter.
pub trait ErrorMetadata {
    /// Process exit code used by command-line front ends
    fn exit_code(&self) -> i32;

    /// Machine-readable error code (e.g., "DISPATCH_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether resubmitting the same report may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the submitter
    fn suggested_action(&self) -> Option<&'static str>;

    /// Human-readable message shown to the submitter
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A required report field is missing. Raised before any network activity.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Email sending is administratively turned off.
    #[error("Report email sending is disabled (SEND_REPORT_EMAIL=false)")]
    ConfigurationDisabled,

    #[error("Unknown recipient: {0}")]
    UnknownRecipient(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// SMTP transport, TLS or authentication fault. Fatal to the submission.
    #[error("Email dispatch failed: {0}")]
    Dispatch(String),

    #[error("Submission cancelled")]
    Cancelled,

    /// Anything outside the pipeline taxonomy, such as an unreadable attachment path.
    #[error("Internal error: {message}")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = err.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort_unstable();
        AppError::Validation(format!(
            "required fields are missing: {}",
            fields.join(", ")
        ))
    }
}

/// Static metadata for each variant:
/// (exit_code, error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (i32, &'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::Validation(_) => (
            2,
            "VALIDATION_ERROR",
            false,
            Some("Fill in summary, steps, expected and actual result"),
            LogLevel::Debug,
        ),
        AppError::ConfigurationDisabled => (
            3,
            "EMAIL_DISABLED",
            false,
            Some("Set SEND_REPORT_EMAIL=true in the environment or .env file"),
            LogLevel::Warn,
        ),
        AppError::UnknownRecipient(_) => (
            2,
            "UNKNOWN_RECIPIENT",
            false,
            Some("Pick a recipient from the configured address book"),
            LogLevel::Debug,
        ),
        AppError::Configuration(_) => (
            3,
            "CONFIGURATION_ERROR",
            false,
            Some("Check the environment or .env file"),
            LogLevel::Error,
        ),
        AppError::Dispatch(_) => (
            4,
            "DISPATCH_FAILED",
            true,
            Some("Check SMTP settings and resubmit"),
            LogLevel::Error,
        ),
        AppError::Cancelled => (130, "CANCELLED", true, None, LogLevel::Warn),
        AppError::InternalWithSource { .. } => {
            (1, "INTERNAL_ERROR", false, None, LogLevel::Error)
        }
    }
}

impl AppError {
    /// Get the error type name for logs
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Validation(_) => "Validation",
            AppError::ConfigurationDisabled => "ConfigurationDisabled",
            AppError::UnknownRecipient(_) => "UnknownRecipient",
            AppError::Configuration(_) => "Configuration",
            AppError::Dispatch(_) => "Dispatch",
            AppError::Cancelled => "Cancelled",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn exit_code(&self) -> i32 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(ref msg) => format!("Please complete the report: {}", msg),
            AppError::ConfigurationDisabled => {
                "Email sending is disabled. Check the .env configuration.".to_string()
            }
            AppError::UnknownRecipient(ref who) => format!("Unknown recipient: {}", who),
            AppError::Configuration(ref msg) => format!("Configuration error: {}", msg),
            // SMTP diagnostics are surfaced verbatim so the submitter can act on them.
            AppError::Dispatch(ref msg) => format!("Failed to send the report email: {}", msg),
            AppError::Cancelled => "Submission cancelled; nothing was sent.".to_string(),
            AppError::InternalWithSource { ref source, .. } => format!("{:#}", source),
        }
    }
}
