//! Private key file strings
//!
//! A key is given as one of
//!
//! - `<file>`
//! - `<file>:<password string>` (see [`process_pwd_string`]); a spec
//!   with more than one `:` names `<file>` and carries no password
//! - `provider:<name>[:<argument>]`
//!
//! Key files may hold a private key, a PKCS11 key file or a GPG secret
//! keyring.

use std::fs;

use super::password::process_pwd_string;
use crate::error::{CryptError, CryptResult};
use crate::keys::KeyInspector;

const PROVIDER_PREFIX: &str = "provider:";

/// Private key material sorted by kind
///
/// Password lists run parallel to their key lists; a key given without a
/// password has an empty entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivateKeyFiles {
    pub gpg_secret_keyrings: Vec<Vec<u8>>,
    pub gpg_secret_keyring_passwords: Vec<Vec<u8>>,
    pub privkeys: Vec<Vec<u8>>,
    pub privkey_passwords: Vec<Vec<u8>>,
    pub pkcs11_yamls: Vec<Vec<u8>>,
    pub key_providers: Vec<Vec<u8>>,
}

/// Sort private key files by kind
pub fn process_private_key_files(
    keys: &[String],
    inspector: &dyn KeyInspector,
) -> CryptResult<PrivateKeyFiles> {
    let mut files = PrivateKeyFiles::default();

    for key in keys {
        if let Some(provider) = key.strip_prefix(PROVIDER_PREFIX) {
            files.key_providers.push(provider.as_bytes().to_vec());
            continue;
        }

        // Only `<file>:<password>` carries a password; with more colons the
        // first field is still the file and the rest is ignored
        let parts: Vec<&str> = key.split(':').collect();
        let keyfile = parts[0];
        let password = match parts.as_slice() {
            [_, pwd] => Some(process_pwd_string(pwd)?),
            [_] => None,
            _ => {
                tracing::debug!(keyfile, "key spec has several ':', ignoring password");
                None
            }
        };

        let data = fs::read(keyfile).map_err(|e| CryptError::read_failed(keyfile, e))?;
        let password_bytes = password.as_ref().map(|p| p.as_bytes());

        let is_priv_key = match inspector.is_private_key(&data, password_bytes) {
            Ok(is_key) => is_key,
            Err(e) if e.is_password_error() => return Err(e),
            Err(_) => false,
        };
        let password = password.map(|p| p.to_vec()).unwrap_or_default();

        if inspector.is_pkcs11_private_key(&data) {
            tracing::debug!(keyfile, "pkcs11 key file");
            files.pkcs11_yamls.push(data);
        } else if is_priv_key {
            tracing::debug!(keyfile, "private key");
            files.privkeys.push(data);
            files.privkey_passwords.push(password);
        } else if inspector.is_gpg_private_key_ring(&data) {
            tracing::debug!(keyfile, "gpg secret keyring");
            files.gpg_secret_keyrings.push(data);
            files.gpg_secret_keyring_passwords.push(password);
        } else {
            return Err(CryptError::Classification(format!(
                "unidentified private key in file {}",
                keyfile
            )));
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::openpgp::tests::secret_keyring;
    use crate::keys::tests::{
        encrypted_private_key_pem, private_key_pem, public_key_pem, PKCS11_KEY_FILE,
    };
    use crate::keys::StandardInspector;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, data: &[u8]) -> String {
        let path = dir.join(name);
        fs::write(&path, data).unwrap();
        path.display().to_string()
    }

    fn process(keys: &[String]) -> CryptResult<PrivateKeyFiles> {
        process_private_key_files(keys, &StandardInspector)
    }

    #[test]
    fn test_sorts_by_kind() {
        let temp_dir = TempDir::new().unwrap();
        let privkey = write(temp_dir.path(), "priv.pem", private_key_pem().as_bytes());
        let p11 = write(temp_dir.path(), "p11.yaml", PKCS11_KEY_FILE.as_bytes());
        let ring = write(temp_dir.path(), "secring.gpg", &secret_keyring());

        let files = process(&[
            privkey.clone(),
            p11,
            format!("{}:pass=ringpwd", ring),
            "provider:kms:arg".to_string(),
        ])
        .unwrap();

        assert_eq!(files.privkeys, vec![private_key_pem().into_bytes()]);
        assert_eq!(files.privkey_passwords, vec![Vec::<u8>::new()]);
        assert_eq!(files.pkcs11_yamls, vec![PKCS11_KEY_FILE.as_bytes().to_vec()]);
        assert_eq!(files.gpg_secret_keyrings, vec![secret_keyring()]);
        assert_eq!(files.gpg_secret_keyring_passwords, vec![b"ringpwd".to_vec()]);
        assert_eq!(files.key_providers, vec![b"kms:arg".to_vec()]);
    }

    #[test]
    fn test_encrypted_key_with_password() {
        let temp_dir = TempDir::new().unwrap();
        let key = write(temp_dir.path(), "enc.pem", encrypted_private_key_pem().as_bytes());
        let pwd = write(temp_dir.path(), "pwd", b"secret");

        let files = process(&[format!("{}:file={}", key, pwd)]).unwrap();
        assert_eq!(files.privkeys.len(), 1);
        assert_eq!(files.privkey_passwords, vec![b"secret".to_vec()]);

        let files = process(&[format!("{}:literal", key)]).unwrap();
        assert_eq!(files.privkey_passwords, vec![b"literal".to_vec()]);
    }

    #[test]
    fn test_encrypted_key_without_password_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let key = write(temp_dir.path(), "enc.pem", encrypted_private_key_pem().as_bytes());

        let err = process(&[key]).unwrap_err();
        assert!(err.is_password_error());
    }

    #[test]
    fn test_several_colons_drop_password() {
        let temp_dir = TempDir::new().unwrap();
        let key = write(temp_dir.path(), "priv.pem", private_key_pem().as_bytes());

        let files = process(&[format!("{}:pass=a:b", key)]).unwrap();
        assert_eq!(files.privkeys.len(), 1);
        assert_eq!(files.privkey_passwords, vec![Vec::<u8>::new()]);

        // the password string is not decoded, so a bad one is not an error
        let files = process(&[format!("{}:fd=xyz:extra", key)]).unwrap();
        assert_eq!(files.privkey_passwords, vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_unidentified_key() {
        let temp_dir = TempDir::new().unwrap();
        let pubkey = write(temp_dir.path(), "pub.pem", public_key_pem().as_bytes());

        let err = process(&[pubkey.clone()]).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Classification error: unidentified private key in file {}", pubkey)
        );
    }

    #[test]
    fn test_missing_file_and_bad_password_spec() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.pem").display().to_string();
        assert!(matches!(process(&[missing]), Err(CryptError::Io(_))));

        let key = write(temp_dir.path(), "priv.pem", private_key_pem().as_bytes());
        assert!(matches!(
            process(&[format!("{}:fd=xyz", key)]),
            Err(CryptError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_provider_reads_nothing() {
        let files = process(&["provider:/does/not/exist".to_string()]).unwrap();
        assert_eq!(files.key_providers, vec![b"/does/not/exist".to_vec()]);
        assert!(files.privkeys.is_empty());
    }
}
