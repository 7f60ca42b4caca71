//! Crypto configuration builder
//!
//! Combines the sorted command line material into the [`CryptoConfig`]
//! used to encrypt or decrypt image layers.

use crate::config::{Pkcs11ConfigSource, UserPkcs11Config};
use crate::cryptoconfig::{
    combine_crypto_configs, decrypt_with_gpg_priv_keys, decrypt_with_key_provider,
    decrypt_with_pkcs11_yaml, decrypt_with_priv_keys, decrypt_with_x509s, encrypt_with_gpg,
    encrypt_with_jwe, encrypt_with_key_provider, encrypt_with_pkcs11, encrypt_with_pkcs7,
    CryptoConfig,
};
use crate::descriptor::Descriptor;
use crate::error::CryptResult;
use crate::gpg::{
    gpg_get_private_key, GpgClient, GpgPrivateKeys, GpgProvider, PassphrasePrompt, SystemGpg,
    TerminalPrompt,
};
use crate::keys::{KeyInspector, StandardInspector};
use crate::parse::{process_private_key_files, process_recipient_keys, EncArgs};

/// Builds crypto configs from [`EncArgs`]
///
/// The collaborators default to the real system: structural key
/// inspection, the installed gpg, `ocicrypt.conf` and terminal prompts.
pub struct CryptoConfigBuilder {
    inspector: Box<dyn KeyInspector>,
    gpg: Box<dyn GpgProvider>,
    pkcs11: Box<dyn Pkcs11ConfigSource>,
    prompt: Box<dyn PassphrasePrompt>,
}

impl Default for CryptoConfigBuilder {
    fn default() -> Self {
        Self {
            inspector: Box::new(StandardInspector),
            gpg: Box::new(SystemGpg),
            pkcs11: Box::new(UserPkcs11Config::default()),
            prompt: Box::new(TerminalPrompt),
        }
    }
}

impl CryptoConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inspector(mut self, inspector: impl KeyInspector + 'static) -> Self {
        self.inspector = Box::new(inspector);
        self
    }

    pub fn with_gpg_provider(mut self, gpg: impl GpgProvider + 'static) -> Self {
        self.gpg = Box::new(gpg);
        self
    }

    pub fn with_pkcs11_config(mut self, source: impl Pkcs11ConfigSource + 'static) -> Self {
        self.pkcs11 = Box::new(source);
        self
    }

    pub fn with_prompt(mut self, prompt: impl PassphrasePrompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    /// Client for the gpg selected by `--gpg-version` and `--gpg-homedir`
    pub fn create_gpg_client(&self, args: &EncArgs) -> CryptResult<Box<dyn GpgClient>> {
        self.gpg.new_client(&args.gpg_version, &args.gpg_homedir)
    }

    /// Look up gpg secret keys for `descs`
    ///
    /// Secret keyrings given on the command line are searched first; without
    /// any, the local gpg installation is asked.
    pub fn get_gpg_private_keys(
        &self,
        args: &EncArgs,
        keyrings: &[Vec<u8>],
        descs: &[Descriptor],
        must_find: bool,
    ) -> CryptResult<GpgPrivateKeys> {
        let client = self.create_gpg_client(args)?;
        self.gpg_private_keys_with(client.as_ref(), keyrings, descs, must_find)
    }

    fn gpg_private_keys_with(
        &self,
        client: &dyn GpgClient,
        keyrings: &[Vec<u8>],
        descs: &[Descriptor],
        must_find: bool,
    ) -> CryptResult<GpgPrivateKeys> {
        let vault = if keyrings.is_empty() {
            None
        } else {
            let mut vault = self.gpg.new_vault();
            vault.add_secret_keyring_data_array(keyrings)?;
            Some(vault)
        };

        gpg_get_private_key(
            descs,
            Some(client),
            vault.as_deref(),
            self.prompt.as_ref(),
            must_find,
        )
    }

    /// Config holding everything needed to decrypt layers
    ///
    /// `descs` are the layers to decrypt. When neither keys nor key
    /// providers were given, gpg secret keys for them are looked up.
    pub fn create_decrypt_crypto_config(
        &self,
        args: &EncArgs,
        descs: &[Descriptor],
    ) -> CryptResult<CryptoConfig> {
        let mut ccs = Vec::new();

        // only the certificates matter for PKCS7 decryption
        let x509s = process_recipient_keys(&args.dec_recipient, self.inspector.as_ref())?.x509s;
        let keys = process_private_key_files(&args.key, self.inspector.as_ref())?;

        match self.create_gpg_client(args) {
            Ok(client) => {
                let no_keys_given = keys.gpg_secret_keyrings.is_empty()
                    && keys.privkeys.is_empty()
                    && keys.pkcs11_yamls.is_empty()
                    && keys.key_providers.is_empty();

                if no_keys_given && !descs.is_empty() {
                    let gpg_keys = self.gpg_private_keys_with(client.as_ref(), &[], descs, true)?;
                    ccs.push(decrypt_with_gpg_priv_keys(gpg_keys.keys, gpg_keys.passwords)?);
                } else if !keys.gpg_secret_keyrings.is_empty() {
                    ccs.push(decrypt_with_gpg_priv_keys(
                        keys.gpg_secret_keyrings,
                        keys.gpg_secret_keyring_passwords,
                    )?);
                }
            }
            Err(e) => tracing::debug!("gpg not available: {}", e),
        }

        if !x509s.is_empty() {
            ccs.push(decrypt_with_x509s(x509s)?);
        }
        if !keys.privkeys.is_empty() {
            ccs.push(decrypt_with_priv_keys(keys.privkeys, keys.privkey_passwords)?);
        }
        if !keys.pkcs11_yamls.is_empty() {
            let config = self.pkcs11.pkcs11_config()?;
            ccs.push(decrypt_with_pkcs11_yaml(&config, keys.pkcs11_yamls)?);
        }
        if !keys.key_providers.is_empty() {
            ccs.push(decrypt_with_key_provider(keys.key_providers)?);
        }

        Ok(combine_crypto_configs(&ccs))
    }

    /// Config for encrypting to `--recipient`s
    ///
    /// With `--key`s the decrypt config is built as well and attached, so
    /// recipients can be added to layers that are already encrypted.
    /// Without keys and recipients the result is an empty config.
    pub fn create_crypto_config(
        &self,
        args: &EncArgs,
        descs: &[Descriptor],
    ) -> CryptResult<CryptoConfig> {
        let mut ccs = Vec::new();
        let mut decrypt_cc = None;

        if !args.key.is_empty() {
            let dcc = self.create_decrypt_crypto_config(args, descs)?;
            ccs.push(dcc.clone());
            decrypt_cc = Some(dcc);
        }

        if !args.recipient.is_empty() {
            let recipients = process_recipient_keys(&args.recipient, self.inspector.as_ref())?;
            let mut encrypt_ccs = Vec::new();

            if !recipients.gpg_recipients.is_empty() {
                match self.create_gpg_client(args) {
                    Ok(client) => {
                        let pub_ring = client.read_gpg_pub_ring_file()?;
                        encrypt_ccs.push(encrypt_with_gpg(recipients.gpg_recipients, pub_ring)?);
                    }
                    Err(e) => tracing::warn!(
                        recipients = recipients.gpg_recipients.len(),
                        "skipping gpg recipients, gpg not available: {}",
                        e
                    ),
                }
            }

            if !recipients.x509s.is_empty() {
                encrypt_ccs.push(encrypt_with_pkcs7(recipients.x509s)?);
            }
            if !recipients.pubkeys.is_empty() {
                encrypt_ccs.push(encrypt_with_jwe(recipients.pubkeys)?);
            }
            if !recipients.pkcs11_pubkeys.is_empty() || !recipients.pkcs11_yamls.is_empty() {
                let config = self.pkcs11.pkcs11_config()?;
                encrypt_ccs.push(encrypt_with_pkcs11(
                    Some(&config),
                    recipients.pkcs11_pubkeys,
                    recipients.pkcs11_yamls,
                )?);
            }
            if !recipients.key_providers.is_empty() {
                encrypt_ccs.push(encrypt_with_key_provider(recipients.key_providers)?);
            }

            let mut ecc = combine_crypto_configs(&encrypt_ccs);
            if let (Some(ec), Some(dcc)) = (ecc.encrypt_config.as_mut(), decrypt_cc.as_ref()) {
                if let Some(dc) = &dcc.decrypt_config {
                    ec.attach_decrypt_config(dc);
                }
            }
            ccs.push(ecc);
        }

        if ccs.is_empty() {
            return Ok(CryptoConfig::default());
        }
        Ok(combine_crypto_configs(&ccs))
    }
}

/// [`CryptoConfigBuilder::create_gpg_client`] with the system gpg
pub fn create_gpg_client(args: &EncArgs) -> CryptResult<Box<dyn GpgClient>> {
    CryptoConfigBuilder::default().create_gpg_client(args)
}

/// [`CryptoConfigBuilder::get_gpg_private_keys`] with the default collaborators
pub fn get_gpg_private_keys(
    args: &EncArgs,
    keyrings: &[Vec<u8>],
    descs: &[Descriptor],
    must_find: bool,
) -> CryptResult<GpgPrivateKeys> {
    CryptoConfigBuilder::default().get_gpg_private_keys(args, keyrings, descs, must_find)
}

/// [`CryptoConfigBuilder::create_decrypt_crypto_config`] with the default collaborators
pub fn create_decrypt_crypto_config(
    args: &EncArgs,
    descs: &[Descriptor],
) -> CryptResult<CryptoConfig> {
    CryptoConfigBuilder::default().create_decrypt_crypto_config(args, descs)
}

/// [`CryptoConfigBuilder::create_crypto_config`] with the default collaborators
pub fn create_crypto_config(args: &EncArgs, descs: &[Descriptor]) -> CryptResult<CryptoConfig> {
    CryptoConfigBuilder::default().create_crypto_config(args, descs)
}
