use anyhow::Context;
use bugmail_core::models::Attachment;
use bugmail_core::{AppError, ErrorMetadata, LogLevel};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Field text given inline or read from a file. The file wins when both are set.
pub fn text_arg(inline: Option<String>, file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => Ok(inline.unwrap_or_default()),
    }
}

/// Read every path into an attachment named after the file.
pub async fn read_attachments(paths: &[PathBuf]) -> anyhow::Result<Vec<Attachment>> {
    let mut attachments = Vec::with_capacity(paths.len());
    for path in paths {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Invalid attachment path: {}", path.display()))?;
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read attachment: {}", path.display()))?;
        attachments.push(Attachment::new(filename, data));
    }
    Ok(attachments)
}

/// Error body printed for `--json` runs
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub error_type: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        ErrorResponse {
            error: err.client_message(),
            code: err.error_code(),
            error_type: err.error_type().to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action().map(String::from),
        }
    }
}

/// Recover the pipeline error from a failed run. Anything else (unreadable
/// files, bad config) becomes an internal error that keeps its cause chain.
pub fn into_app_error(err: anyhow::Error) -> AppError {
    match err.downcast::<AppError>() {
        Ok(app) => app,
        Err(other) => AppError::from(other),
    }
}

pub fn exit_code(err: &AppError) -> i32 {
    err.exit_code()
}

/// Message shown to the submitter for a failed run.
pub fn user_message(err: &AppError) -> String {
    match err.suggested_action() {
        Some(action) => format!("{}\n{}", err.client_message(), action),
        None => err.client_message(),
    }
}

pub fn log_error(err: &AppError) {
    let details = err.detailed_message();
    let error_type = err.error_type();
    let code = err.error_code();
    match err.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %details, error_type, code, "Submission failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %details, error_type, code, "Submission failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %details, error_type, code, "Submission failed");
        }
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_counts_characters() {
        assert_eq!(truncate_string("\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}", 4), "\u{e9}...");
    }

    #[test]
    fn text_arg_prefers_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "open\nsave").unwrap();
        let text = text_arg(Some("inline".to_string()), Some(file.path())).unwrap();
        assert_eq!(text, "open\nsave");
        assert_eq!(text_arg(Some("inline".to_string()), None).unwrap(), "inline");
        assert_eq!(text_arg(None, None).unwrap(), "");
    }

    #[tokio::test]
    async fn read_attachments_uses_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        std::fs::write(&path, b"png").unwrap();

        let attachments = read_attachments(&[path]).await.unwrap();
        assert_eq!(attachments[0].filename, "shot.png");
        assert_eq!(attachments[0].data.as_ref(), b"png");
        assert!(read_attachments(&[dir.path().join("missing.mp4")])
            .await
            .is_err());
    }

    #[test]
    fn exit_code_and_message_follow_app_error() {
        let err = into_app_error(anyhow::Error::new(AppError::ConfigurationDisabled));
        assert!(matches!(err, AppError::ConfigurationDisabled));
        assert_eq!(exit_code(&err), 3);
        assert!(user_message(&err).starts_with("Email sending is disabled."));

        let other = into_app_error(anyhow::anyhow!("boom").context("loading"));
        assert_eq!(exit_code(&other), 1);
        assert_eq!(user_message(&other), "loading: boom");
    }

    #[test]
    fn context_wrapped_app_error_is_recovered() {
        let err = anyhow::Error::new(AppError::Cancelled).context("submitting");
        assert_eq!(exit_code(&into_app_error(err)), 130);
    }

    #[test]
    fn error_response_carries_metadata() {
        let err = AppError::Dispatch("535 5.7.8 bad credentials".to_string());
        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(body["code"], "DISPATCH_FAILED");
        assert_eq!(body["error_type"], "Dispatch");
        assert_eq!(body["recoverable"], true);
        assert_eq!(body["suggested_action"], "Check SMTP settings and resubmit");
        assert!(body["error"].as_str().unwrap().contains("535 5.7.8"));

        let cancelled = serde_json::to_value(ErrorResponse::from(&AppError::Cancelled)).unwrap();
        assert!(cancelled.get("suggested_action").is_none());
    }
}
