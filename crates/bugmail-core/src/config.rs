//! Configuration module
//!
//! All settings are read once at startup (environment plus an optional `.env`
//! file) into an immutable [`Config`] that is handed to the components that
//! need it. Nothing reads the process environment after that point.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::models::AddressBook;
use crate::transport_types::{SignatureAlgorithm, SmtpSecurity};

// Common constants
const SMTP_SERVER: &str = "smtp.gmail.com";
const SMTP_TIMEOUT_SECS: u64 = 30;
const MEDIA_HOST_API_BASE: &str = "https://api.cloudinary.com";
const UPLOAD_FOLDER: &str = "bug_report_files";
const UPLOAD_CHUNK_SIZE_BYTES: usize = 20_000_000;
const MIN_UPLOAD_CHUNK_SIZE_BYTES: usize = 5 * 1024 * 1024;
const UPLOAD_TIMEOUT_SECS: u64 = 30;
const UPLOAD_CONCURRENCY: usize = 1;
const UPLOAD_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;
const MIN_JPEG_QUALITY: u8 = 30;

/// SMTP relay settings
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub security: SmtpSecurity,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
    pub timeout_secs: u64,
}

impl SmtpConfig {
    /// Sender mailbox: `SMTP_FROM`, falling back to the login user.
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.user.as_deref())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Remote media host credentials and transfer settings
#[derive(Clone, Debug)]
pub struct MediaHostConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
    pub signature_algorithm: SignatureAlgorithm,
    pub folder: String,
    pub chunk_size_bytes: usize,
    pub timeout_secs: u64,
}

impl MediaHostConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Attachment pipeline tuning
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub concurrency: usize,
    /// Images larger than this are re-encoded before upload.
    pub max_image_bytes: u64,
    pub min_jpeg_quality: u8,
}

/// Everything the report pipeline needs
#[derive(Clone, Debug)]
pub struct BugmailConfig {
    pub send_report_email: bool,
    pub address_book: AddressBook,
    pub smtp: SmtpConfig,
    pub media_host: MediaHostConfig,
    pub upload: UploadConfig,
}

/// Application configuration, cheap to clone and shared read-only.
#[derive(Clone, Debug)]
pub struct Config(pub Arc<BugmailConfig>);

impl Config {
    fn inner(&self) -> &BugmailConfig {
        &self.0
    }

    /// Load from the process environment, reading `.env` first when present.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Used by `from_env` and by tests.
    pub fn from_vars<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = BugmailConfig::from_vars(lookup)?;
        Ok(Config(Arc::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn send_report_email(&self) -> bool {
        self.inner().send_report_email
    }

    pub fn address_book(&self) -> &AddressBook {
        &self.inner().address_book
    }

    pub fn smtp(&self) -> &SmtpConfig {
        &self.inner().smtp
    }

    pub fn media_host(&self) -> &MediaHostConfig {
        &self.inner().media_host
    }

    pub fn upload(&self) -> &UploadConfig {
        &self.inner().upload
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn flag<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, key)
        .map(|s| s.to_lowercase())
        .and_then(|s| match s.as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn number<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    non_empty(lookup, key)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl BugmailConfig {
    pub fn from_vars<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address_book = AddressBook::parse(&lookup("TO_EMAILS").unwrap_or_default())
            .map_err(|e| anyhow::anyhow!("TO_EMAILS: {}", e))?;

        let security = match non_empty(&lookup, "SMTP_SECURITY") {
            Some(mode) => mode.parse::<SmtpSecurity>()?,
            None if flag(&lookup, "SMTP_USE_SSL", false) => SmtpSecurity::Tls,
            None => SmtpSecurity::StartTls,
        };

        let port = match non_empty(&lookup, "SMTP_PORT") {
            Some(port) => port
                .parse::<u16>()
                .ok()
                .filter(|&p| p > 0)
                .ok_or_else(|| anyhow::anyhow!("SMTP_PORT must be a valid port number"))?,
            None => security.default_port(),
        };

        let smtp = SmtpConfig {
            host: non_empty(&lookup, "SMTP_SERVER").unwrap_or_else(|| SMTP_SERVER.to_string()),
            port,
            security,
            user: non_empty(&lookup, "SMTP_USER"),
            password: lookup("SMTP_PASSWORD").filter(|s| !s.is_empty()),
            from: non_empty(&lookup, "SMTP_FROM"),
            timeout_secs: number(&lookup, "SMTP_TIMEOUT_SECS", SMTP_TIMEOUT_SECS),
        };

        let signature_algorithm = match non_empty(&lookup, "CLOUDINARY_SIGNATURE_ALGORITHM") {
            Some(algorithm) => algorithm.parse::<SignatureAlgorithm>()?,
            None => SignatureAlgorithm::default(),
        };

        let media_host = MediaHostConfig {
            cloud_name: non_empty(&lookup, "CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
            api_key: non_empty(&lookup, "CLOUDINARY_API_KEY").unwrap_or_default(),
            api_secret: non_empty(&lookup, "CLOUDINARY_API_SECRET").unwrap_or_default(),
            api_base: non_empty(&lookup, "CLOUDINARY_API_BASE")
                .unwrap_or_else(|| MEDIA_HOST_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            signature_algorithm,
            folder: non_empty(&lookup, "UPLOAD_FOLDER")
                .unwrap_or_else(|| UPLOAD_FOLDER.to_string()),
            chunk_size_bytes: number(&lookup, "UPLOAD_CHUNK_SIZE_BYTES", UPLOAD_CHUNK_SIZE_BYTES),
            timeout_secs: number(&lookup, "UPLOAD_TIMEOUT_SECS", UPLOAD_TIMEOUT_SECS),
        };

        let upload = UploadConfig {
            concurrency: number(&lookup, "UPLOAD_CONCURRENCY", UPLOAD_CONCURRENCY),
            max_image_bytes: number(&lookup, "UPLOAD_MAX_IMAGE_BYTES", UPLOAD_MAX_IMAGE_BYTES),
            min_jpeg_quality: number(&lookup, "MIN_JPEG_QUALITY", MIN_JPEG_QUALITY),
        };

        let config = BugmailConfig {
            send_report_email: flag(&lookup, "SEND_REPORT_EMAIL", true),
            address_book,
            smtp,
            media_host,
            upload,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.send_report_email
            && (self.media_host.cloud_name.is_empty()
                || self.media_host.api_key.is_empty()
                || self.media_host.api_secret.is_empty())
        {
            return Err(anyhow::anyhow!(
                "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set"
            ));
        }

        if self.media_host.chunk_size_bytes < MIN_UPLOAD_CHUNK_SIZE_BYTES {
            return Err(anyhow::anyhow!(
                "UPLOAD_CHUNK_SIZE_BYTES must be at least {} bytes",
                MIN_UPLOAD_CHUNK_SIZE_BYTES
            ));
        }

        if self.media_host.timeout_secs == 0 || self.smtp.timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "UPLOAD_TIMEOUT_SECS and SMTP_TIMEOUT_SECS must be greater than zero"
            ));
        }

        if self.upload.concurrency == 0 {
            return Err(anyhow::anyhow!("UPLOAD_CONCURRENCY must be at least 1"));
        }

        if !(1..=90).contains(&self.upload.min_jpeg_quality) {
            return Err(anyhow::anyhow!("MIN_JPEG_QUALITY must be between 1 and 90"));
        }

        if self.send_report_email {
            if self.address_book.is_empty() {
                return Err(anyhow::anyhow!(
                    "TO_EMAILS must list at least one recipient when SEND_REPORT_EMAIL=true"
                ));
            }
            if self.smtp.sender().is_none() {
                return Err(anyhow::anyhow!(
                    "SMTP_FROM or SMTP_USER must be set when SEND_REPORT_EMAIL=true"
                ));
            }
            if self.smtp.user.is_some() != self.smtp.password.is_some() {
                return Err(anyhow::anyhow!(
                    "SMTP_USER and SMTP_PASSWORD must be set together"
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("TO_EMAILS", "QA <qa@example.com>,dev@example.com"),
            ("SMTP_USER", "reporter@example.com"),
            ("SMTP_PASSWORD", "app-password"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "123"),
            ("CLOUDINARY_API_SECRET", "secret"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config, anyhow::Error> {
        Config::from_vars(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_match_gmail_starttls() {
        let config = load(&base_vars()).unwrap();
        assert!(config.send_report_email());
        assert_eq!(config.smtp().host, "smtp.gmail.com");
        assert_eq!(config.smtp().port, 587);
        assert_eq!(config.smtp().security, SmtpSecurity::StartTls);
        assert_eq!(config.smtp().sender(), Some("reporter@example.com"));
        assert_eq!(config.smtp().timeout(), Duration::from_secs(30));
        assert_eq!(config.media_host().folder, "bug_report_files");
        assert_eq!(config.media_host().chunk_size_bytes, 20_000_000);
        assert_eq!(config.upload().concurrency, 1);
        assert_eq!(config.upload().max_image_bytes, 10_485_760);
        assert_eq!(config.upload().min_jpeg_quality, 30);
        assert_eq!(config.address_book().len(), 2);
    }

    #[test]
    fn use_ssl_flag_selects_implicit_tls_and_port() {
        let mut vars = base_vars();
        vars.insert("SMTP_USE_SSL", "True");
        let config = load(&vars).unwrap();
        assert_eq!(config.smtp().security, SmtpSecurity::Tls);
        assert_eq!(config.smtp().port, 465);
    }

    #[test]
    fn explicit_security_and_port_win() {
        let mut vars = base_vars();
        vars.insert("SMTP_USE_SSL", "true");
        vars.insert("SMTP_SECURITY", "none");
        vars.insert("SMTP_PORT", "2525");
        vars.insert("SMTP_FROM", "Bug Bot <bugs@example.com>");
        let config = load(&vars).unwrap();
        assert_eq!(config.smtp().security, SmtpSecurity::None);
        assert_eq!(config.smtp().port, 2525);
        assert_eq!(config.smtp().sender(), Some("Bug Bot <bugs@example.com>"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut vars = base_vars();
        vars.insert("SMTP_PORT", "smtp");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn missing_media_host_credentials_are_rejected() {
        let mut vars = base_vars();
        vars.remove("CLOUDINARY_API_SECRET");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("CLOUDINARY_API_SECRET"));
    }

    #[test]
    fn empty_address_book_only_allowed_when_sending_disabled() {
        let mut vars = base_vars();
        vars.insert("TO_EMAILS", " , ");
        assert!(load(&vars).is_err());

        vars.insert("SEND_REPORT_EMAIL", "false");
        let config = load(&vars).unwrap();
        assert!(!config.send_report_email());
        assert!(config.address_book().is_empty());
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let mut vars = base_vars();
        vars.insert("MIN_JPEG_QUALITY", "95");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn disabled_sending_needs_no_credentials() {
        let vars = HashMap::from([("SEND_REPORT_EMAIL", "false")]);
        let config = load(&vars).unwrap();
        assert!(!config.send_report_email());
        assert!(config.media_host().api_secret.is_empty());
        assert!(config.smtp().sender().is_none());
    }

    #[test]
    fn signature_algorithm_defaults_to_sha1() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(config.media_host().signature_algorithm, SignatureAlgorithm::Sha1);

        let mut vars = base_vars();
        vars.insert("CLOUDINARY_SIGNATURE_ALGORITHM", "sha256");
        let config = load(&vars).unwrap();
        assert_eq!(config.media_host().signature_algorithm, SignatureAlgorithm::Sha256);

        vars.insert("CLOUDINARY_SIGNATURE_ALGORITHM", "md5");
        assert!(load(&vars).is_err());
    }
}
