//! Secret keyrings supplied on the command line

use crate::error::{CryptError, CryptResult};
use crate::keys::openpgp;

/// A store of secret keyrings
pub trait GpgVault {
    /// Add one keyring (binary or ASCII armored)
    fn add_secret_keyring_data(&mut self, data: &[u8]) -> CryptResult<()>;

    /// Add several keyrings; the first bad one aborts
    fn add_secret_keyring_data_array(&mut self, keyrings: &[Vec<u8>]) -> CryptResult<()> {
        keyrings
            .iter()
            .try_for_each(|data| self.add_secret_keyring_data(data))
    }

    /// Raw data of the keyring holding secret key `key_id`
    fn get_gpg_private_key(&self, key_id: u64) -> Option<&[u8]>;
}

struct Keyring {
    key_ids: Vec<u64>,
    data: Vec<u8>,
}

/// In-memory [`GpgVault`]
#[derive(Default)]
pub struct KeyringVault {
    keyrings: Vec<Keyring>,
}

impl KeyringVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keyrings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyrings.is_empty()
    }
}

impl GpgVault for KeyringVault {
    fn add_secret_keyring_data(&mut self, data: &[u8]) -> CryptResult<()> {
        let certs = openpgp::read_keyring(data)?;
        if certs.is_empty() {
            return Err(CryptError::Gpg("no keys found".into()));
        }

        let key_ids = openpgp::cert_secret_key_ids(&certs)?;
        tracing::debug!(
            certs = certs.len(),
            keys = key_ids.len(),
            "added secret keyring to vault"
        );
        self.keyrings.push(Keyring {
            key_ids,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn get_gpg_private_key(&self, key_id: u64) -> Option<&[u8]> {
        self.keyrings
            .iter()
            .find(|k| k.key_ids.contains(&key_id))
            .map(|k| k.data.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::openpgp::tests::{
        secret_keyring, ENCRYPTION_KEY_ID, PRIMARY_KEY_ID, PUBLIC_KEYRING,
    };

    #[test]
    fn test_lookup_by_key_id() {
        let mut vault = KeyringVault::new();
        vault.add_secret_keyring_data(&secret_keyring()).unwrap();

        assert_eq!(vault.len(), 1);
        assert_eq!(
            vault.get_gpg_private_key(ENCRYPTION_KEY_ID),
            Some(secret_keyring().as_slice())
        );
        assert_eq!(
            vault.get_gpg_private_key(PRIMARY_KEY_ID),
            Some(secret_keyring().as_slice())
        );
        assert_eq!(vault.get_gpg_private_key(ENCRYPTION_KEY_ID ^ 1), None);
    }

    #[test]
    fn test_public_keyring_holds_no_secret_keys() {
        let mut vault = KeyringVault::new();
        vault.add_secret_keyring_data(PUBLIC_KEYRING).unwrap();
        assert_eq!(vault.len(), 1);
        assert_eq!(vault.get_gpg_private_key(ENCRYPTION_KEY_ID), None);
    }

    #[test]
    fn test_rejects_data_without_keys() {
        let mut vault = KeyringVault::new();
        assert!(matches!(
            vault.add_secret_keyring_data(&[]),
            Err(CryptError::Gpg(_))
        ));
        assert!(vault.add_secret_keyring_data(b"not a keyring").is_err());
        assert!(vault.is_empty());
    }

    #[test]
    fn test_array_stops_at_first_error() {
        let mut vault = KeyringVault::new();
        let rings = vec![secret_keyring(), b"not a keyring".to_vec(), secret_keyring()];
        assert!(vault.add_secret_keyring_data_array(&rings).is_err());
        assert_eq!(vault.len(), 1);
    }
}
