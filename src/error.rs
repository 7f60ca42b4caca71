//! Error types for ocicrypt-args
//!
//! Every failure while decoding argument strings, reading key files or
//! assembling a crypto configuration ends up as a [`CryptError`]. Errors are
//! returned to the caller immediately; nothing here retries or recovers.

use thiserror::Error;

/// The main error type for ocicrypt-args operations
#[derive(Error, Debug)]
pub enum CryptError {
    /// File or descriptor I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Malformed argument strings (missing separators, bad numbers)
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A recipient used a protocol prefix nobody handles
    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),

    /// Missing or unusable password for an encrypted key
    #[error("Password error: {0}")]
    Password(String),

    /// Key material that is not what the argument claims it is
    #[error("Classification error: {0}")]
    Classification(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors from the gpg binary or keyrings
    #[error("GPG error: {0}")]
    Gpg(String),

    /// Errors from PKCS11 key files or URIs
    #[error("PKCS11 error: {0}")]
    Pkcs11(String),

    /// No private key available for an encrypted layer
    #[error("Missing key: {0}")]
    MissingKey(String),

    /// YAML serialization/deserialization errors
    #[error("YAML error: {0}")]
    Yaml(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),
}

impl CryptError {
    /// Create an I/O error that names the file involved
    pub fn read_failed(path: impl AsRef<str>, err: std::io::Error) -> Self {
        Self::Io(format!("unable to read file {}: {}", path.as_ref(), err))
    }

    /// Check if this is a password error
    ///
    /// Password errors abort private key classification instead of letting
    /// the key file fall through to the next candidate type.
    pub fn is_password_error(&self) -> bool {
        matches!(self, Self::Password(_))
    }

    /// Check if this is a classification error
    pub fn is_classification(&self) -> bool {
        matches!(self, Self::Classification(_))
    }
}

impl From<std::io::Error> for CryptError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_yaml::Error> for CryptError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err.to_string())
    }
}

impl From<serde_json::Error> for CryptError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for ocicrypt-args operations
pub type CryptResult<T> = Result<T, CryptError>;
