//! User PKCS11 module configuration
//!
//! PKCS11 key files only name a token object; which shared libraries may be
//! loaded to reach it comes from the `pkcs11` section of `ocicrypt.conf`:
//!
//! ```yaml
//! pkcs11:
//!   module-directories:
//!     - /usr/lib64/pkcs11/
//!   allowed-module-paths:
//!     - /usr/lib64/pkcs11/libsofthsm2.so
//! ```

use serde::{Deserialize, Serialize};

use super::paths::OcicryptPaths;
use crate::error::{CryptError, CryptResult};

/// Directories searched for PKCS11 modules and the modules allowed to load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pkcs11Config {
    #[serde(rename = "module-directories", default)]
    pub module_directories: Vec<String>,

    #[serde(rename = "allowed-module-paths", default)]
    pub allowed_module_paths: Vec<String>,
}

impl Pkcs11Config {
    /// Configuration used when no file provides one
    pub fn with_defaults() -> Self {
        let dirs = default_module_directories();
        Self {
            module_directories: dirs.clone(),
            allowed_module_paths: dirs,
        }
    }

    /// Fill empty lists with the default module directories
    fn fill_defaults(mut self) -> Self {
        if self.module_directories.is_empty() {
            self.module_directories = default_module_directories();
        }
        if self.allowed_module_paths.is_empty() {
            self.allowed_module_paths = default_module_directories();
        }
        self
    }
}

/// Top level layout of `ocicrypt.conf`
#[derive(Debug, Clone, Default, Deserialize)]
struct OcicryptConfigFile {
    #[serde(default)]
    pkcs11: Option<Pkcs11Config>,
}

/// Well known PKCS11 module directories for this platform
pub fn default_module_directories() -> Vec<String> {
    let mut dirs: Vec<String> = [
        "/usr/lib64/pkcs11/",     // Fedora, RHEL, openSUSE
        "/usr/lib/pkcs11/",       // Fedora armhf, macOS
        "/usr/local/lib/pkcs11/",
        "/usr/lib/softhsm/",      // Debian, Ubuntu
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    // Debian multiarch: /usr/lib/<arch>-linux-gnu/
    if cfg!(target_os = "linux") {
        dirs.push(format!("/usr/lib/{}-linux-gnu/", std::env::consts::ARCH));
    }

    dirs
}

/// Parse the `pkcs11` section out of an ocicrypt configuration document
pub fn parse_pkcs11_config(yaml: &[u8]) -> CryptResult<Pkcs11Config> {
    let file: OcicryptConfigFile = serde_yaml::from_slice(yaml)
        .map_err(|e| CryptError::Config(format!("could not parse ocicrypt config: {}", e)))?;
    Ok(file.pkcs11.unwrap_or_default().fill_defaults())
}

/// Load the user's PKCS11 configuration
///
/// Missing configuration files yield the defaults; an explicitly named file
/// that cannot be read is an error.
pub fn get_user_pkcs11_config(paths: &OcicryptPaths) -> CryptResult<Pkcs11Config> {
    let Some(file) = paths.config_file() else {
        tracing::debug!("no ocicrypt config found, using default pkcs11 module directories");
        return Ok(Pkcs11Config::with_defaults());
    };

    let contents = std::fs::read(&file).map_err(|e| {
        CryptError::Config(format!("could not read {}: {}", file.display(), e))
    })?;
    tracing::debug!("loaded pkcs11 config from {}", file.display());
    parse_pkcs11_config(&contents)
}

/// Supplies the PKCS11 configuration when PKCS11 material is used
pub trait Pkcs11ConfigSource {
    fn pkcs11_config(&self) -> CryptResult<Pkcs11Config>;
}

/// Reads the configuration from `ocicrypt.conf`
#[derive(Debug, Clone, Default)]
pub struct UserPkcs11Config {
    paths: OcicryptPaths,
}

impl UserPkcs11Config {
    pub fn new(paths: OcicryptPaths) -> Self {
        Self { paths }
    }
}

impl Pkcs11ConfigSource for UserPkcs11Config {
    fn pkcs11_config(&self) -> CryptResult<Pkcs11Config> {
        get_user_pkcs11_config(&self.paths)
    }
}
