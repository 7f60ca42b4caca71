//! Command line argument decoding
//!
//! Turns the strings given to `--recipient`, `--dec-recipient` and `--key`
//! into sorted lists of key material.

pub mod password;
pub mod private_keys;
pub mod recipients;

use clap::Args;

pub use password::process_pwd_string;
pub use private_keys::{process_private_key_files, PrivateKeyFiles};
pub use recipients::{process_recipient_keys, RecipientKeys};

/// Encryption related command line arguments
///
/// Flatten into a clap parser with `#[command(flatten)]`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct EncArgs {
    /// GPG home directory
    #[arg(long = "gpg-homedir", env = "GNUPGHOME", default_value = "")]
    pub gpg_homedir: String,

    /// GPG version to use (v1 or v2); detected when empty
    #[arg(long = "gpg-version", default_value = "")]
    pub gpg_version: String,

    /// Private key file, optionally followed by ':' and a password
    /// (pass=<pwd>, file=<path>, fd=<n> or the literal password)
    #[arg(long = "key", value_name = "KEYFILE[:PASSWORD]")]
    pub key: Vec<String>,

    /// Recipient as <protocol>:<value> (pgp, jwe, pkcs7, pkcs11, provider)
    #[arg(long = "recipient", value_name = "PROTOCOL:VALUE")]
    pub recipient: Vec<String>,

    /// Recipient whose certificate is needed for PKCS7 decryption
    #[arg(long = "dec-recipient", value_name = "PROTOCOL:VALUE")]
    pub dec_recipient: Vec<String>,
}

impl EncArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.key = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_recipients(
        mut self,
        recipients: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.recipient = recipients.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dec_recipients(
        mut self,
        recipients: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.dec_recipient = recipients.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_gpg(mut self, version: impl Into<String>, homedir: impl Into<String>) -> Self {
        self.gpg_version = version.into();
        self.gpg_homedir = homedir.into();
        self
    }
}
