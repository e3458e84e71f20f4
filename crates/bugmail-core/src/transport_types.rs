use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// How the SMTP relay connection is secured.
///
/// Defined in core because it is parsed from configuration and consumed by the
/// email dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// TLS from the first byte (SMTPS, usually port 465)
    Tls,
    /// Plaintext connect, then upgrade with STARTTLS (usually port 587)
    StartTls,
    /// No encryption at all; only for local relays
    None,
}

impl SmtpSecurity {
    pub fn default_port(self) -> u16 {
        match self {
            SmtpSecurity::Tls => 465,
            SmtpSecurity::StartTls => 587,
            SmtpSecurity::None => 25,
        }
    }
}

impl FromStr for SmtpSecurity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tls" | "ssl" | "implicit" => Ok(SmtpSecurity::Tls),
            "starttls" => Ok(SmtpSecurity::StartTls),
            "none" | "plain" => Ok(SmtpSecurity::None),
            _ => Err(anyhow::anyhow!("Invalid SMTP security mode: {}", s)),
        }
    }
}

impl Display for SmtpSecurity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SmtpSecurity::Tls => write!(f, "tls"),
            SmtpSecurity::StartTls => write!(f, "starttls"),
            SmtpSecurity::None => write!(f, "none"),
        }
    }
}

/// Digest used to sign media host upload requests.
///
/// Accounts sign with SHA-1 unless switched to SHA-256 on the provider side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl FromStr for SignatureAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" => Ok(SignatureAlgorithm::Sha256),
            _ => Err(anyhow::anyhow!("Invalid signature algorithm: {}", s)),
        }
    }
}

impl Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SignatureAlgorithm::Sha1 => write!(f, "sha1"),
            SignatureAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}
