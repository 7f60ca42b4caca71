//! Configuration file resolution for ocicrypt
//!
//! ## Path Resolution Order
//!
//! 1. `OCICRYPT_CONFIG` environment variable (if set); the value `internal`
//!    selects the built-in defaults and no file is read
//! 2. `$XDG_CONFIG_HOME/ocicrypt.conf`, or the platform user config directory
//! 3. `/etc/ocicrypt.conf` (Unix only)
//!
//! A configuration that cannot be found is not an error; callers fall back
//! to defaults.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "OCICRYPT_CONFIG";

/// `OCICRYPT_CONFIG` value that forces the built-in defaults
pub const INTERNAL_CONFIG: &str = "internal";

/// Name of the configuration file in the searched directories
pub const CONFIG_FILE_NAME: &str = "ocicrypt.conf";

/// Where the ocicrypt configuration comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Use built-in defaults, read nothing
    Internal,
    /// Explicitly named by `OCICRYPT_CONFIG`; must exist
    Explicit(PathBuf),
    /// Candidate locations searched in order; the first existing one wins
    Search(Vec<PathBuf>),
}

/// Resolves the ocicrypt configuration file
#[derive(Debug, Clone)]
pub struct OcicryptPaths {
    source: ConfigSource,
}

impl OcicryptPaths {
    /// Resolve from the environment and the platform directories
    pub fn new() -> Self {
        let source = match std::env::var(CONFIG_ENV_VAR) {
            Ok(value) if value == INTERNAL_CONFIG => ConfigSource::Internal,
            Ok(value) if !value.is_empty() => ConfigSource::Explicit(PathBuf::from(value)),
            _ => ConfigSource::Search(default_search_dirs()),
        };

        Self { source }
    }

    /// Use a specific configuration file (useful for testing)
    pub fn with_config_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: ConfigSource::Explicit(path.into()),
        }
    }

    /// Search only the given directories for `ocicrypt.conf`
    pub fn with_search_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            source: ConfigSource::Search(
                dirs.into_iter().map(|d| d.join(CONFIG_FILE_NAME)).collect(),
            ),
        }
    }

    /// Always use the built-in defaults
    pub fn internal() -> Self {
        Self {
            source: ConfigSource::Internal,
        }
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// The configuration file to read, if any
    ///
    /// An explicit file is returned even when missing so the read reports it.
    pub fn config_file(&self) -> Option<PathBuf> {
        match &self.source {
            ConfigSource::Internal => None,
            ConfigSource::Explicit(path) => Some(path.clone()),
            ConfigSource::Search(candidates) => candidates
                .iter()
                .find(|p| Path::new(p).is_file())
                .cloned(),
        }
    }
}

impl Default for OcicryptPaths {
    fn default() -> Self {
        Self::new()
    }
}

/// Candidate configuration files, most specific first
fn default_search_dirs() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            candidates.push(PathBuf::from(xdg).join(CONFIG_FILE_NAME));
        }
    }
    if let Some(base) = BaseDirs::new() {
        let user = base.config_dir().join(CONFIG_FILE_NAME);
        if !candidates.contains(&user) {
            candidates.push(user);
        }
    }
    #[cfg(unix)]
    candidates.push(PathBuf::from("/etc").join(CONFIG_FILE_NAME));

    candidates
}
