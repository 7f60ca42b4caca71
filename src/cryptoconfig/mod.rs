//! Crypto configuration objects
//!
//! A [`CryptoConfig`] is what the image encryption layer consumes: an
//! encrypt half (recipient material plus the decrypt parameters needed to
//! re-wrap existing layers) and a decrypt half (private key material).
//! Both halves are plain maps from parameter name to a list of buffers.

pub mod constructors;

use std::collections::BTreeMap;

use serde::Serialize;

pub use constructors::{
    combine_crypto_configs, decrypt_with_gpg_priv_keys, decrypt_with_key_provider,
    decrypt_with_pkcs11_yaml, decrypt_with_priv_keys, decrypt_with_x509s, encrypt_with_gpg,
    encrypt_with_jwe, encrypt_with_key_provider, encrypt_with_pkcs11, encrypt_with_pkcs7,
};

pub const GPG_RECIPIENTS: &str = "gpg-recipients";
pub const GPG_PUB_RING_FILE: &str = "gpg-pubkeyringfile";
pub const GPG_PRIVATE_KEYS: &str = "gpg-privatekeys";
pub const GPG_PRIVATE_KEYS_PASSWORDS: &str = "gpg-privatekeys-passwords";
pub const PUBKEYS: &str = "pubkeys";
pub const PRIVKEYS: &str = "privkeys";
pub const PRIVKEYS_PASSWORDS: &str = "privkeys-passwords";
pub const X509S: &str = "x509s";
pub const PKCS11_PUBKEYS: &str = "pkcs11-pubkeys";
pub const PKCS11_YAMLS: &str = "pkcs11-yamls";
pub const PKCS11_CONFIG: &str = "pkcs11-config";

/// Parameter name to buffers; ordered so summaries are stable
pub type Parameters = BTreeMap<String, Vec<Vec<u8>>>;

/// Append every buffer of `src` to the matching entry of `dst`
fn add_to_map(dst: &mut Parameters, src: &Parameters) {
    for (name, values) in src {
        dst.entry(name.clone())
            .or_default()
            .extend(values.iter().cloned());
    }
}

/// Parameters needed to decrypt a layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecryptConfig {
    pub parameters: Parameters,
}

impl DecryptConfig {
    pub fn new(parameters: Parameters) -> Self {
        Self { parameters }
    }

    /// Buffers stored under `name`, empty if the parameter is absent
    pub fn get(&self, name: &str) -> &[Vec<u8>] {
        self.parameters.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Parameters needed to encrypt a layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptConfig {
    pub parameters: Parameters,

    /// Private key material used when recipients are added to an already
    /// encrypted layer
    pub decrypt_config: DecryptConfig,
}

impl EncryptConfig {
    pub fn new(parameters: Parameters, decrypt_config: DecryptConfig) -> Self {
        Self {
            parameters,
            decrypt_config,
        }
    }

    /// Buffers stored under `name`, empty if the parameter is absent
    pub fn get(&self, name: &str) -> &[Vec<u8>] {
        self.parameters.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Merge the parameters of `dc` into this config's decrypt half
    pub fn attach_decrypt_config(&mut self, dc: &DecryptConfig) {
        add_to_map(&mut self.decrypt_config.parameters, &dc.parameters);
    }
}

/// Combined encryption and decryption configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CryptoConfig {
    pub encrypt_config: Option<EncryptConfig>,
    pub decrypt_config: Option<DecryptConfig>,
}

impl CryptoConfig {
    /// A config holding the same decrypt parameters on both halves
    pub(crate) fn from_parts(encrypt: Parameters, decrypt: DecryptConfig) -> Self {
        Self {
            encrypt_config: Some(EncryptConfig::new(encrypt, decrypt.clone())),
            decrypt_config: Some(decrypt),
        }
    }

    /// True when neither half carries any parameter
    pub fn is_empty(&self) -> bool {
        let enc_empty = self.encrypt_config.as_ref().map_or(true, |ec| {
            ec.parameters.is_empty() && ec.decrypt_config.parameters.is_empty()
        });
        let dec_empty = self
            .decrypt_config
            .as_ref()
            .map_or(true, |dc| dc.parameters.is_empty());
        enc_empty && dec_empty
    }

    /// Parameter names and buffer counts, without any key material
    pub fn summary(&self) -> ConfigSummary {
        fn counts(params: &Parameters) -> BTreeMap<String, usize> {
            params.iter().map(|(k, v)| (k.clone(), v.len())).collect()
        }

        ConfigSummary {
            encrypt: self.encrypt_config.as_ref().map(|ec| counts(&ec.parameters)),
            encrypt_decrypt: self
                .encrypt_config
                .as_ref()
                .map(|ec| counts(&ec.decrypt_config.parameters)),
            decrypt: self.decrypt_config.as_ref().map(|dc| counts(&dc.parameters)),
        }
    }
}

/// Redacted view of a [`CryptoConfig`] for display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypt: Option<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypt_decrypt: Option<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decrypt: Option<BTreeMap<String, usize>>,
}
