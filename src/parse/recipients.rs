//! Recipient strings
//!
//! Each recipient is `<protocol>:<value>`:
//!
//! | protocol   | value                                   |
//! |------------|-----------------------------------------|
//! | `pgp`      | gpg user ID or key ID                   |
//! | `jwe`      | public key file                         |
//! | `pkcs7`    | x509 certificate file                   |
//! | `pkcs11`   | PKCS11 key file or public key file      |
//! | `provider` | key provider name and optional argument |

use std::fs;

use crate::error::{CryptError, CryptResult};
use crate::keys::KeyInspector;

/// Recipient material sorted by protocol
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientKeys {
    pub gpg_recipients: Vec<Vec<u8>>,
    pub pubkeys: Vec<Vec<u8>>,
    pub x509s: Vec<Vec<u8>>,
    pub pkcs11_pubkeys: Vec<Vec<u8>>,
    pub pkcs11_yamls: Vec<Vec<u8>>,
    pub key_providers: Vec<Vec<u8>>,
}

impl RecipientKeys {
    pub fn is_empty(&self) -> bool {
        self.gpg_recipients.is_empty()
            && self.pubkeys.is_empty()
            && self.x509s.is_empty()
            && self.pkcs11_pubkeys.is_empty()
            && self.pkcs11_yamls.is_empty()
            && self.key_providers.is_empty()
    }
}

/// Sort recipients by protocol, reading and checking referenced files
pub fn process_recipient_keys(
    recipients: &[String],
    inspector: &dyn KeyInspector,
) -> CryptResult<RecipientKeys> {
    let mut keys = RecipientKeys::default();

    for recipient in recipients {
        let (protocol, value) = recipient
            .split_once(':')
            .ok_or_else(|| CryptError::InvalidFormat("invalid recipient format".into()))?;

        match protocol {
            "pgp" => keys.gpg_recipients.push(value.as_bytes().to_vec()),
            "jwe" => {
                let data = fs::read(value).map_err(|e| CryptError::read_failed(value, e))?;
                if !inspector.is_public_key(&data) {
                    return Err(CryptError::Classification(
                        "file provided is not a public key".into(),
                    ));
                }
                keys.pubkeys.push(data);
            }
            "pkcs7" => {
                let data = fs::read(value).map_err(|e| CryptError::read_failed(value, e))?;
                if !inspector.is_certificate(&data) {
                    return Err(CryptError::Classification(
                        "file provided is not an x509 cert".into(),
                    ));
                }
                keys.x509s.push(data);
            }
            "pkcs11" => {
                let data = fs::read(value).map_err(|e| CryptError::read_failed(value, e))?;
                if inspector.is_pkcs11_public_key(&data) {
                    keys.pkcs11_yamls.push(data);
                } else if inspector.is_public_key(&data) {
                    keys.pkcs11_pubkeys.push(data);
                } else {
                    return Err(CryptError::Classification(
                        "provided file is not a public key".into(),
                    ));
                }
            }
            "provider" => keys.key_providers.push(value.as_bytes().to_vec()),
            _ => {
                return Err(CryptError::UnknownProtocol(
                    "provided protocol not recognized".into(),
                ))
            }
        }
        tracing::debug!(protocol, "accepted recipient");
    }

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::tests::{certificate_pem, public_key_pem, PKCS11_KEY_FILE};
    use crate::keys::StandardInspector;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, data: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, data).unwrap();
        path.display().to_string()
    }

    fn process(recipients: &[String]) -> CryptResult<RecipientKeys> {
        process_recipient_keys(recipients, &StandardInspector)
    }

    #[test]
    fn test_sorts_by_protocol() {
        let temp_dir = TempDir::new().unwrap();
        let pubkey = write(temp_dir.path(), "pub.pem", &public_key_pem());
        let cert = write(temp_dir.path(), "cert.pem", &certificate_pem());
        let p11 = write(temp_dir.path(), "p11.yaml", PKCS11_KEY_FILE);

        let keys = process(&[
            "pgp:alice@example.com".to_string(),
            format!("jwe:{}", pubkey),
            format!("pkcs7:{}", cert),
            format!("pkcs11:{}", p11),
            format!("pkcs11:{}", pubkey),
            "provider:kms:arg".to_string(),
        ])
        .unwrap();

        assert_eq!(keys.gpg_recipients, vec![b"alice@example.com".to_vec()]);
        assert_eq!(keys.pubkeys, vec![public_key_pem().into_bytes()]);
        assert_eq!(keys.x509s, vec![certificate_pem().into_bytes()]);
        assert_eq!(keys.pkcs11_yamls, vec![PKCS11_KEY_FILE.as_bytes().to_vec()]);
        assert_eq!(keys.pkcs11_pubkeys, vec![public_key_pem().into_bytes()]);
        assert_eq!(keys.key_providers, vec![b"kms:arg".to_vec()]);
    }

    #[test]
    fn test_empty_input() {
        let keys = process(&[]).unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn test_order_preserved() {
        let keys = process(&["pgp:b".to_string(), "pgp:a".to_string()]).unwrap();
        assert_eq!(keys.gpg_recipients, vec![b"b".to_vec(), b"a".to_vec()]);
    }

    #[test]
    fn test_format_errors() {
        let err = process(&["alice@example.com".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid format: invalid recipient format");

        let err = process(&["smtp:alice@example.com".to_string()]).unwrap_err();
        assert!(matches!(err, CryptError::UnknownProtocol(_)));
        assert!(err.to_string().contains("provided protocol not recognized"));
    }

    #[test]
    fn test_wrong_file_types() {
        let temp_dir = TempDir::new().unwrap();
        let pubkey = write(temp_dir.path(), "pub.pem", &public_key_pem());
        let cert = write(temp_dir.path(), "cert.pem", &certificate_pem());

        let err = process(&[format!("jwe:{}", cert)]).unwrap_err();
        assert!(err.to_string().contains("file provided is not a public key"));

        let err = process(&[format!("pkcs7:{}", pubkey)]).unwrap_err();
        assert!(err.to_string().contains("file provided is not an x509 cert"));

        let err = process(&[format!("pkcs11:{}", cert)]).unwrap_err();
        assert!(err.to_string().contains("provided file is not a public key"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.pem").display().to_string();
        let err = process(&[format!("pkcs7:{}", missing)]).unwrap_err();
        assert!(matches!(err, CryptError::Io(_)));
        assert!(err.to_string().contains(&missing));
    }

    #[test]
    fn test_first_error_aborts() {
        let err = process(&["pgp:ok".to_string(), "bad".to_string(), "pgp:later".to_string()]);
        assert!(err.is_err());
    }
}
