//! Per-protocol crypto config constructors
//!
//! Each constructor files its buffers under the parameter names the layer
//! encryption code looks up, and returns a [`CryptoConfig`] with both halves
//! populated so the results can be merged with [`combine_crypto_configs`].

use crate::config::Pkcs11Config;
use crate::error::{CryptError, CryptResult};

use super::{
    add_to_map, CryptoConfig, DecryptConfig, EncryptConfig, Parameters, GPG_PRIVATE_KEYS,
    GPG_PRIVATE_KEYS_PASSWORDS, GPG_PUB_RING_FILE, GPG_RECIPIENTS, PKCS11_CONFIG, PKCS11_PUBKEYS,
    PKCS11_YAMLS, PRIVKEYS, PRIVKEYS_PASSWORDS, PUBKEYS, X509S,
};

/// Value stored for a key provider named without arguments
const KEY_PROVIDER_ENABLED: &[u8] = b"Enabled";

fn single(name: &str, values: Vec<Vec<u8>>) -> Parameters {
    let mut p = Parameters::new();
    p.insert(name.to_string(), values);
    p
}

fn encrypt_only(parameters: Parameters) -> CryptoConfig {
    CryptoConfig::from_parts(parameters, DecryptConfig::default())
}

fn decrypt_only(parameters: Parameters) -> CryptoConfig {
    CryptoConfig::from_parts(Parameters::new(), DecryptConfig::new(parameters))
}

fn pkcs11_config_yaml(config: &Pkcs11Config) -> CryptResult<Vec<u8>> {
    serde_yaml::to_string(config)
        .map(String::into_bytes)
        .map_err(|e| CryptError::Pkcs11(format!("could not serialize pkcs11 config: {}", e)))
}

/// Split `name:args` key provider specs into parameters
///
/// A spec without arguments is recorded as enabled.
fn key_provider_parameters(key_providers: &[Vec<u8>]) -> Parameters {
    let mut params = Parameters::new();
    for spec in key_providers {
        match spec.iter().position(|&b| b == b':') {
            Some(idx) if idx > 0 => {
                let name = String::from_utf8_lossy(&spec[..idx]).into_owned();
                params.entry(name).or_default().push(spec[idx + 1..].to_vec());
            }
            _ => {
                let name = String::from_utf8_lossy(spec).into_owned();
                params
                    .entry(name)
                    .or_default()
                    .push(KEY_PROVIDER_ENABLED.to_vec());
            }
        }
    }
    params
}

/// Encrypt for GPG recipients using the given public keyring
pub fn encrypt_with_gpg(
    gpg_recipients: Vec<Vec<u8>>,
    gpg_pub_ring_file: Vec<u8>,
) -> CryptResult<CryptoConfig> {
    let mut params = single(GPG_RECIPIENTS, gpg_recipients);
    params.insert(GPG_PUB_RING_FILE.to_string(), vec![gpg_pub_ring_file]);
    Ok(encrypt_only(params))
}

/// Encrypt for the owners of x509 certificates (PKCS7)
pub fn encrypt_with_pkcs7(x509s: Vec<Vec<u8>>) -> CryptResult<CryptoConfig> {
    Ok(encrypt_only(single(X509S, x509s)))
}

/// Encrypt for public keys (JWE)
pub fn encrypt_with_jwe(pubkeys: Vec<Vec<u8>>) -> CryptResult<CryptoConfig> {
    Ok(encrypt_only(single(PUBKEYS, pubkeys)))
}

/// Encrypt for PKCS11 public keys and PKCS11 key files
///
/// Key files need the module configuration at decryption time, so it is
/// stored in the decrypt half when any are given.
pub fn encrypt_with_pkcs11(
    config: Option<&Pkcs11Config>,
    pkcs11_pubkeys: Vec<Vec<u8>>,
    pkcs11_yamls: Vec<Vec<u8>>,
) -> CryptResult<CryptoConfig> {
    let mut params = Parameters::new();
    let mut dc = DecryptConfig::default();

    if !pkcs11_yamls.is_empty() {
        let config = config.ok_or_else(|| {
            CryptError::Pkcs11("pkcs11 config must not be missing for pkcs11 key files".into())
        })?;
        dc = DecryptConfig::new(single(PKCS11_CONFIG, vec![pkcs11_config_yaml(config)?]));
        params.insert(PKCS11_YAMLS.to_string(), pkcs11_yamls);
    }
    if !pkcs11_pubkeys.is_empty() {
        params.insert(PKCS11_PUBKEYS.to_string(), pkcs11_pubkeys);
    }

    Ok(CryptoConfig::from_parts(params, dc))
}

/// Encrypt through external key providers
pub fn encrypt_with_key_provider(key_providers: Vec<Vec<u8>>) -> CryptResult<CryptoConfig> {
    Ok(encrypt_only(key_provider_parameters(&key_providers)))
}

/// Decrypt through external key providers
pub fn decrypt_with_key_provider(key_providers: Vec<Vec<u8>>) -> CryptResult<CryptoConfig> {
    Ok(decrypt_only(key_provider_parameters(&key_providers)))
}

/// Decrypt with private keys and their passwords
pub fn decrypt_with_priv_keys(
    privkeys: Vec<Vec<u8>>,
    privkey_passwords: Vec<Vec<u8>>,
) -> CryptResult<CryptoConfig> {
    if privkeys.len() != privkey_passwords.len() {
        return Err(CryptError::Config(format!(
            "length of private keys ({}) should match length of private key passwords ({})",
            privkeys.len(),
            privkey_passwords.len()
        )));
    }

    let mut params = single(PRIVKEYS, privkeys);
    params.insert(PRIVKEYS_PASSWORDS.to_string(), privkey_passwords);
    Ok(decrypt_only(params))
}

/// Decrypt PKCS7 layers; the certificates identify the recipient
pub fn decrypt_with_x509s(x509s: Vec<Vec<u8>>) -> CryptResult<CryptoConfig> {
    Ok(decrypt_only(single(X509S, x509s)))
}

/// Decrypt with GPG private keys (or secret keyrings) and their passwords
pub fn decrypt_with_gpg_priv_keys(
    gpg_priv_keys: Vec<Vec<u8>>,
    gpg_priv_key_passwords: Vec<Vec<u8>>,
) -> CryptResult<CryptoConfig> {
    let mut params = single(GPG_PRIVATE_KEYS, gpg_priv_keys);
    params.insert(GPG_PRIVATE_KEYS_PASSWORDS.to_string(), gpg_priv_key_passwords);
    Ok(decrypt_only(params))
}

/// Decrypt with PKCS11 key files
pub fn decrypt_with_pkcs11_yaml(
    config: &Pkcs11Config,
    pkcs11_yamls: Vec<Vec<u8>>,
) -> CryptResult<CryptoConfig> {
    let mut params = single(PKCS11_YAMLS, pkcs11_yamls);
    params.insert(PKCS11_CONFIG.to_string(), vec![pkcs11_config_yaml(config)?]);
    Ok(decrypt_only(params))
}

/// Merge crypto configs parameter by parameter, in input order
///
/// The result always has both halves set, even when `configs` is empty.
pub fn combine_crypto_configs(configs: &[CryptoConfig]) -> CryptoConfig {
    let mut enc = Parameters::new();
    let mut enc_dec = Parameters::new();
    let mut dec = Parameters::new();

    for cc in configs {
        if let Some(ec) = &cc.encrypt_config {
            add_to_map(&mut enc, &ec.parameters);
            add_to_map(&mut enc_dec, &ec.decrypt_config.parameters);
        }
        if let Some(dc) = &cc.decrypt_config {
            add_to_map(&mut dec, &dc.parameters);
        }
    }

    CryptoConfig {
        encrypt_config: Some(EncryptConfig::new(enc, DecryptConfig::new(enc_dec))),
        decrypt_config: Some(DecryptConfig::new(dec)),
    }
}
