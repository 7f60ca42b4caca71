//! GPG integration
//!
//! Recipients and secret keys handled by GPG come from two places: the
//! local gpg installation (driven through [`GpgClient`]) and secret
//! keyrings passed on the command line (held in a [`GpgVault`]).

pub mod client;
pub mod private_keys;
pub mod vault;

use std::fmt;
use std::process::{Command, Stdio};

use crate::error::{CryptError, CryptResult};

pub use client::CommandGpgClient;
pub use private_keys::{gpg_get_private_key, GpgPrivateKeys, PassphrasePrompt, TerminalPrompt};
pub use vault::{GpgVault, KeyringVault};

/// Major version of the gpg tool to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpgVersion {
    V1,
    V2,
}

impl GpgVersion {
    /// Binary name for this version
    pub fn binary(self) -> &'static str {
        match self {
            Self::V1 => "gpg",
            Self::V2 => "gpg2",
        }
    }

    /// Parse the `--gpg-version` argument; anything but `v1`/`v2` is `None`
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "v1" => Some(Self::V1),
            "v2" => Some(Self::V2),
            _ => None,
        }
    }
}

impl fmt::Display for GpgVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

fn binary_runs(binary: &str) -> bool {
    Command::new(binary)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Find out which gpg is installed, preferring gpg2
pub fn guess_gpg_version() -> Option<GpgVersion> {
    if binary_runs(GpgVersion::V2.binary()) {
        Some(GpgVersion::V2)
    } else if binary_runs(GpgVersion::V1.binary()) {
        Some(GpgVersion::V1)
    } else {
        None
    }
}

/// Access to a gpg installation
pub trait GpgClient {
    /// Export the public keyring
    fn read_gpg_pub_ring_file(&self) -> CryptResult<Vec<u8>>;

    /// Export the secret key `key_id`, unlocking it with `passphrase`
    fn get_gpg_private_key(&self, key_id: u64, passphrase: &[u8]) -> CryptResult<Vec<u8>>;

    /// Listing of secret key `key_id` and whether gpg knows it
    fn get_secret_key_details(&self, key_id: u64) -> CryptResult<(Vec<u8>, bool)>;

    /// Listing of public key `key_id` and whether gpg knows it
    fn get_key_details(&self, key_id: u64) -> CryptResult<(Vec<u8>, bool)>;
}

/// Create a client for `version` (`v1`, `v2`, or anything else to detect the installed one)
pub fn new_gpg_client(version: &str, homedir: &str) -> CryptResult<CommandGpgClient> {
    let version = match GpgVersion::from_arg(version) {
        Some(v) => v,
        None => {
            if !version.is_empty() {
                tracing::warn!(version, "unrecognized gpg version, detecting installed gpg");
            }
            guess_gpg_version()
                .ok_or_else(|| CryptError::Gpg("unable to determine GPG version".into()))?
        }
    };
    tracing::debug!(%version, homedir, "using gpg client");
    Ok(CommandGpgClient::new(version, homedir))
}

/// Factory for gpg clients and vaults
pub trait GpgProvider {
    fn new_client(&self, version: &str, homedir: &str) -> CryptResult<Box<dyn GpgClient>>;

    fn new_vault(&self) -> Box<dyn GpgVault>;
}

/// Uses the gpg binaries on `PATH`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemGpg;

impl GpgProvider for SystemGpg {
    fn new_client(&self, version: &str, homedir: &str) -> CryptResult<Box<dyn GpgClient>> {
        Ok(Box::new(new_gpg_client(version, homedir)?))
    }

    fn new_vault(&self) -> Box<dyn GpgVault> {
        Box::new(KeyringVault::new())
    }
}

/// Format a key ID the way gpg prints it on the command line
pub fn format_key_id(key_id: u64) -> String {
    format!("0x{:x}", key_id)
}
