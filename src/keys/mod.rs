//! Key material classification
//!
//! Argument parsing only needs to know *what* a buffer is: a public key, a
//! certificate, a private key, a PKCS11 key file or a GPG secret keyring.
//! [`KeyInspector`] is that question; [`StandardInspector`] answers it by
//! looking at the structure of the data (PEM framing, DER decoding, JWK
//! members, YAML layout, OpenPGP packets). No key is ever decrypted or
//! used, so a wrong password on an encrypted key is only noticed by
//! whoever decrypts with it later.

pub(crate) mod der;
pub mod jwk;
pub mod openpgp;
pub mod pem;
pub mod pkcs11;

use crate::error::{CryptError, CryptResult};

pub use jwk::JwkKind;
pub use pkcs11::{parse_pkcs11_key_file, Pkcs11Uri};

/// PEM label of PKCS8 encrypted private keys
const ENCRYPTED_PRIVATE_KEY: &str = "ENCRYPTED PRIVATE KEY";

/// Classifies buffers of key material
pub trait KeyInspector {
    /// PKIX public key in PEM, or a public JWK
    fn is_public_key(&self, data: &[u8]) -> bool;

    /// X.509 certificate in PEM or DER
    fn is_certificate(&self, data: &[u8]) -> bool;

    /// Private key, possibly protected by `password`
    ///
    /// Returns a password error when the key is encrypted and no password
    /// was supplied; other errors just mean "not a private key".
    fn is_private_key(&self, data: &[u8], password: Option<&[u8]>) -> CryptResult<bool>;

    fn is_pkcs11_public_key(&self, data: &[u8]) -> bool;

    fn is_pkcs11_private_key(&self, data: &[u8]) -> bool;

    fn is_gpg_private_key_ring(&self, data: &[u8]) -> bool;
}

/// Structural classifier used by default
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardInspector;

impl KeyInspector for StandardInspector {
    fn is_public_key(&self, data: &[u8]) -> bool {
        is_public_key(data)
    }

    fn is_certificate(&self, data: &[u8]) -> bool {
        is_certificate(data)
    }

    fn is_private_key(&self, data: &[u8], password: Option<&[u8]>) -> CryptResult<bool> {
        is_private_key(data, password)
    }

    fn is_pkcs11_public_key(&self, data: &[u8]) -> bool {
        is_pkcs11_key_file(data)
    }

    fn is_pkcs11_private_key(&self, data: &[u8]) -> bool {
        is_pkcs11_key_file(data)
    }

    fn is_gpg_private_key_ring(&self, data: &[u8]) -> bool {
        openpgp::is_secret_keyring(data)
    }
}

pub fn is_public_key(data: &[u8]) -> bool {
    match pem::decode(data) {
        Some(block) => der::is_subject_public_key_info(&block.contents),
        None => jwk::classify(data) == Some(JwkKind::Public),
    }
}

pub fn is_certificate(data: &[u8]) -> bool {
    match pem::decode(data) {
        Some(block) => der::is_certificate(&block.contents),
        None => der::is_certificate(data),
    }
}

/// Check for a private key; see [`KeyInspector::is_private_key`]
pub fn is_private_key(data: &[u8], password: Option<&[u8]>) -> CryptResult<bool> {
    let Some(block) = pem::decode(data) else {
        return match jwk::classify(data) {
            Some(JwkKind::Private) => Ok(true),
            _ => Err(CryptError::Classification(
                "could not parse private key".into(),
            )),
        };
    };

    if block.is_legacy_encrypted() || block.label == ENCRYPTED_PRIVATE_KEY {
        if password.is_none() {
            return Err(CryptError::Password(
                "missing password for encrypted private key".into(),
            ));
        }
        // The payload is ciphertext; only its framing can be checked
        let framed = block.is_legacy_encrypted()
            || der::is_encrypted_private_key_info(&block.contents);
        return if framed {
            Ok(true)
        } else {
            Err(CryptError::Classification(
                "could not parse encrypted private key".into(),
            ))
        };
    }

    if der::is_private_key(&block.contents) {
        Ok(true)
    } else {
        Err(CryptError::Classification(
            "could not parse private key".into(),
        ))
    }
}

/// Same test as [`CryptError::is_password_error`], for `Result`s
pub fn is_password_error<T>(result: &CryptResult<T>) -> bool {
    matches!(result, Err(e) if e.is_password_error())
}

/// PKCS11 key files reference both halves of a key pair the same way
pub fn is_pkcs11_key_file(data: &[u8]) -> bool {
    parse_pkcs11_key_file(data).is_ok()
}
