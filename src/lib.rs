//! ocicrypt-args - command line helpers for OCI image layer encryption
//!
//! This library turns the strings given to image encryption tools
//! (`--recipient`, `--dec-recipient`, `--key`, `--gpg-version`,
//! `--gpg-homedir`) into a [`CryptoConfig`] holding the key material the
//! layer encryption code needs.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `parse`: Decoding of recipient, key file and password strings
//! - `builder`: Assembling encrypt and decrypt configs
//! - `cryptoconfig`: Crypto config objects and per-protocol constructors
//! - `keys`: Structural classification of key material
//! - `gpg`: gpg client, secret keyring vault and layer key lookup
//! - `descriptor`: OCI descriptors of encrypted layers
//! - `config`: ocicrypt configuration file and PKCS11 settings
//! - `display`: Redacted config summaries for terminal output
//! - `error`: Custom error types
//!
//! # Example
//!
//! ```rust,ignore
//! use ocicrypt_args::{create_crypto_config, EncArgs};
//!
//! let args = EncArgs::new().with_recipients(["jwe:/keys/pub.pem"]);
//! let cc = create_crypto_config(&args, &[])?;
//! ```

pub mod builder;
pub mod config;
pub mod cryptoconfig;
pub mod descriptor;
pub mod display;
pub mod error;
pub mod gpg;
pub mod keys;
pub mod parse;
pub mod secure_memory;

pub use builder::{
    create_crypto_config, create_decrypt_crypto_config, create_gpg_client, get_gpg_private_keys,
    CryptoConfigBuilder,
};
pub use cryptoconfig::{CryptoConfig, DecryptConfig, EncryptConfig};
pub use descriptor::Descriptor;
pub use error::{CryptError, CryptResult};
pub use parse::EncArgs;
