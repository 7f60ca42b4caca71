//! Configuration module for ocicrypt-args
//!
//! This module provides:
//! - ocicrypt configuration file resolution
//! - The user PKCS11 module configuration

pub mod paths;
pub mod pkcs11;

pub use paths::OcicryptPaths;
pub use pkcs11::{
    default_module_directories, get_user_pkcs11_config, Pkcs11Config, Pkcs11ConfigSource,
    UserPkcs11Config,
};
