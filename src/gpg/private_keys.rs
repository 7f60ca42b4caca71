//! GPG private key lookup for encrypted layers
//!
//! Each encrypted layer lists the OpenPGP key IDs its content key was
//! wrapped for. The first key ID we hold a secret key for wins; secret keys
//! come from the vault when one was given, otherwise from the local gpg
//! installation after asking the user for the passphrase.

use std::collections::HashSet;

use base64::{engine::general_purpose::STANDARD, Engine};

use super::{format_key_id, GpgClient, GpgVault};
use crate::descriptor::Descriptor;
use crate::error::{CryptError, CryptResult};
use crate::keys::openpgp;
use crate::secure_memory::SecureBytes;

/// Asks the user for the passphrase of a gpg key
pub trait PassphrasePrompt {
    fn passphrase(&self, key_id: u64, key_info: &[u8]) -> CryptResult<SecureBytes>;
}

/// Prompts on the terminal with hidden input
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl PassphrasePrompt for TerminalPrompt {
    fn passphrase(&self, key_id: u64, key_info: &[u8]) -> CryptResult<SecureBytes> {
        let id = format_key_id(key_id);
        eprintln!(
            "Passphrase required for Key id {}:\n{}",
            id,
            String::from_utf8_lossy(key_info)
        );
        rpassword::prompt_password(format!("Enter passphrase for key with Id {}: ", id))
            .map(SecureBytes::from)
            .map_err(|e| CryptError::Password(format!("Failed to read passphrase: {}", e)))
    }
}

/// Secret keys and their passwords, in matching order
///
/// Keys appear in the order the layers first needed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpgPrivateKeys {
    pub keys: Vec<Vec<u8>>,
    pub passwords: Vec<Vec<u8>>,
}

/// Key IDs addressed by a list of base64 encoded packet lists
fn wrapped_key_ids(wrapped: &[&str]) -> CryptResult<Vec<u64>> {
    let mut ids = Vec::new();
    for b64 in wrapped {
        let packets = STANDARD
            .decode(b64)
            .map_err(|e| CryptError::Gpg(format!("could not decode base64 pgp packets: {}", e)))?;
        ids.extend(openpgp::pkesk_key_ids(&packets)?);
    }
    Ok(ids)
}

/// Find secret keys for the layers in `descs`
///
/// With `must_find`, a layer wrapped only for keys we do not have is an
/// error naming the key IDs it needs.
pub fn gpg_get_private_key(
    descs: &[Descriptor],
    client: Option<&dyn GpgClient>,
    vault: Option<&dyn GpgVault>,
    prompt: &dyn PassphrasePrompt,
    must_find: bool,
) -> CryptResult<GpgPrivateKeys> {
    let mut found_keys = GpgPrivateKeys::default();
    let mut seen: HashSet<u64> = HashSet::new();

    for desc in descs {
        let wrapped = desc.pgp_wrapped_keys();
        if wrapped.is_empty() {
            continue;
        }
        let key_ids = wrapped_key_ids(&wrapped)?;

        let mut found = false;
        for &key_id in &key_ids {
            if let Some(vault) = vault {
                if let Some(keyring) = vault.get_gpg_private_key(key_id) {
                    tracing::debug!(key = %format_key_id(key_id), "secret key found in vault");
                    if seen.insert(key_id) {
                        found_keys.keys.push(keyring.to_vec());
                        found_keys.passwords.push(Vec::new());
                    }
                    found = true;
                    break;
                }
            } else if let Some(client) = client {
                // an error here only means gpg does not know the key
                let (key_info, have_key) = client
                    .get_secret_key_details(key_id)
                    .unwrap_or_default();
                if !have_key {
                    continue;
                }
                if !seen.contains(&key_id) {
                    let password = prompt.passphrase(key_id, &key_info)?;
                    let key = client.get_gpg_private_key(key_id, &password)?;
                    seen.insert(key_id);
                    found_keys.keys.push(key);
                    found_keys.passwords.push(password.to_vec());
                }
                found = true;
                break;
            } else {
                return Err(CryptError::Gpg("no GPGVault or GPGClient passed".into()));
            }
        }

        if !found && must_find {
            let ids: Vec<String> = key_ids.iter().map(|&id| format_key_id(id)).collect();
            return Err(CryptError::MissingKey(format!(
                "missing key for decryption of layer {} of {}. Need one of the following keys: {}",
                desc.digest,
                desc.platform_name(),
                ids.join(", ")
            )));
        }
    }

    Ok(found_keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PGP_KEYS_ANNOTATION;
    use crate::gpg::KeyringVault;
    use crate::keys::openpgp::tests::{pkesk, secret_keyring, ENCRYPTION_KEY_ID};
    use std::cell::Cell;

    struct FakeClient {
        known: u64,
        exports: Cell<usize>,
    }

    impl GpgClient for FakeClient {
        fn read_gpg_pub_ring_file(&self) -> CryptResult<Vec<u8>> {
            Ok(b"pubring".to_vec())
        }

        fn get_gpg_private_key(&self, key_id: u64, passphrase: &[u8]) -> CryptResult<Vec<u8>> {
            self.exports.set(self.exports.get() + 1);
            assert_eq!(passphrase, b"hunter2");
            Ok(format!("secret-{:x}", key_id).into_bytes())
        }

        fn get_secret_key_details(&self, key_id: u64) -> CryptResult<(Vec<u8>, bool)> {
            if key_id == self.known {
                Ok((b"sec rsa2048".to_vec(), true))
            } else {
                Err(CryptError::Gpg("not found".into()))
            }
        }

        fn get_key_details(&self, key_id: u64) -> CryptResult<(Vec<u8>, bool)> {
            self.get_secret_key_details(key_id)
        }
    }

    struct FixedPrompt;

    impl PassphrasePrompt for FixedPrompt {
        fn passphrase(&self, _key_id: u64, _key_info: &[u8]) -> CryptResult<SecureBytes> {
            Ok(SecureBytes::from("hunter2"))
        }
    }

    fn layer(digest: &str, key_ids: &[u64]) -> Descriptor {
        let mut packets = Vec::new();
        for id in key_ids {
            packets.extend(pkesk(*id));
        }
        let mut desc = Descriptor {
            digest: digest.to_string(),
            ..Default::default()
        };
        desc.annotations
            .insert(PGP_KEYS_ANNOTATION.to_string(), STANDARD.encode(packets));
        desc
    }

    #[test]
    fn test_vault_key_has_empty_password() {
        let mut vault = KeyringVault::new();
        vault.add_secret_keyring_data(&secret_keyring()).unwrap();

        let descs = vec![layer("sha256:aa", &[0x1234, ENCRYPTION_KEY_ID])];
        let keys = gpg_get_private_key(&descs, None, Some(&vault), &FixedPrompt, true).unwrap();
        assert_eq!(keys.keys, vec![secret_keyring()]);
        assert_eq!(keys.passwords, vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_client_key_prompts_once() {
        let client = FakeClient {
            known: 0xabc,
            exports: Cell::new(0),
        };
        let descs = vec![layer("sha256:aa", &[0x1, 0xabc]), layer("sha256:bb", &[0xabc])];

        let keys = gpg_get_private_key(&descs, Some(&client), None, &FixedPrompt, true).unwrap();
        assert_eq!(keys.keys, vec![b"secret-abc".to_vec()]);
        assert_eq!(keys.passwords, vec![b"hunter2".to_vec()]);
        assert_eq!(client.exports.get(), 1);
    }

    struct TwoKeyClient;

    impl GpgClient for TwoKeyClient {
        fn read_gpg_pub_ring_file(&self) -> CryptResult<Vec<u8>> {
            Ok(Vec::new())
        }

        fn get_gpg_private_key(&self, key_id: u64, _passphrase: &[u8]) -> CryptResult<Vec<u8>> {
            Ok(format!("secret-{:x}", key_id).into_bytes())
        }

        fn get_secret_key_details(&self, key_id: u64) -> CryptResult<(Vec<u8>, bool)> {
            Ok((Vec::new(), key_id == 0x10 || key_id == 0xf0))
        }

        fn get_key_details(&self, key_id: u64) -> CryptResult<(Vec<u8>, bool)> {
            self.get_secret_key_details(key_id)
        }
    }

    #[test]
    fn test_keys_keep_layer_order() {
        let descs = vec![
            layer("sha256:aa", &[0xf0]),
            layer("sha256:bb", &[0x10]),
            layer("sha256:cc", &[0xf0]),
        ];

        let keys =
            gpg_get_private_key(&descs, Some(&TwoKeyClient), None, &FixedPrompt, true).unwrap();
        assert_eq!(keys.keys, vec![b"secret-f0".to_vec(), b"secret-10".to_vec()]);
        assert_eq!(keys.passwords.len(), 2);
    }

    #[test]
    fn test_missing_key_error_lists_ids() {
        let client = FakeClient {
            known: 0xabc,
            exports: Cell::new(0),
        };
        let descs = vec![layer("sha256:cc", &[0x10, 0x20])];

        let err = gpg_get_private_key(&descs, Some(&client), None, &FixedPrompt, true).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, CryptError::MissingKey(_)));
        assert!(msg.contains("layer sha256:cc of unknown"));
        assert!(msg.contains("0x10, 0x20"));

        let keys = gpg_get_private_key(&descs, Some(&client), None, &FixedPrompt, false).unwrap();
        assert!(keys.keys.is_empty());
    }

    #[test]
    fn test_layers_without_pgp_keys_are_skipped() {
        let descs = vec![Descriptor::default()];
        let keys = gpg_get_private_key(&descs, None, None, &FixedPrompt, true).unwrap();
        assert_eq!(keys, GpgPrivateKeys::default());
    }

    #[test]
    fn test_no_client_or_vault() {
        let descs = vec![layer("sha256:aa", &[0x1])];
        assert!(gpg_get_private_key(&descs, None, None, &FixedPrompt, true).is_err());
    }

    #[test]
    fn test_bad_base64_annotation() {
        let mut desc = Descriptor::default();
        desc.annotations
            .insert(PGP_KEYS_ANNOTATION.to_string(), "!!".to_string());
        let client = FakeClient {
            known: 0,
            exports: Cell::new(0),
        };
        assert!(gpg_get_private_key(&[desc], Some(&client), None, &FixedPrompt, true).is_err());
    }
}
