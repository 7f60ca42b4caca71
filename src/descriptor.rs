//! OCI descriptors
//!
//! Only the fields needed to find the wrapped keys of an encrypted layer
//! are modelled.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CryptError, CryptResult};

/// Annotation holding the OpenPGP wrapped keys of a layer
pub const PGP_KEYS_ANNOTATION: &str = "org.opencontainers.image.enc.keys.pgp";

/// Target platform of an image manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub architecture: String,
    pub os: String,
    #[serde(rename = "os.version", default, skip_serializing_if = "String::is_empty")]
    pub os_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub variant: String,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)?;
        if !self.variant.is_empty() {
            write!(f, "/{}", self.variant)?;
        }
        Ok(())
    }
}

/// A content descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub media_type: String,
    pub digest: String,
    pub size: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

impl Descriptor {
    /// Load a descriptor from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> CryptResult<Self> {
        let path = path.as_ref();
        let data =
            fs::read(path).map_err(|e| CryptError::read_failed(path.display().to_string(), e))?;
        serde_json::from_slice(&data).map_err(|e| {
            CryptError::Json(format!("invalid descriptor {}: {}", path.display(), e))
        })
    }

    pub fn annotation(&self, name: &str) -> Option<&str> {
        self.annotations.get(name).map(String::as_str)
    }

    /// Base64 encoded packet lists of the PGP wrapped keys
    pub fn pgp_wrapped_keys(&self) -> Vec<&str> {
        self.annotation(PGP_KEYS_ANNOTATION)
            .map(|v| v.split(',').filter(|k| !k.is_empty()).collect())
            .unwrap_or_default()
    }

    /// Platform in `os/arch[/variant]` form, or `unknown`
    pub fn platform_name(&self) -> String {
        self.platform
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LAYER: &str = r#"{
        "mediaType": "application/vnd.oci.image.layer.v1.tar+gzip+encrypted",
        "digest": "sha256:0123",
        "size": 42,
        "annotations": {
            "org.opencontainers.image.enc.keys.pgp": "AAAA,BBBB"
        },
        "platform": {"architecture": "arm64", "os": "linux", "variant": "v8"}
    }"#;

    #[test]
    fn test_load_descriptor() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("layer.json");
        fs::write(&path, LAYER).unwrap();

        let desc = Descriptor::from_json_file(&path).unwrap();
        assert_eq!(desc.digest, "sha256:0123");
        assert_eq!(desc.size, 42);
        assert_eq!(desc.pgp_wrapped_keys(), vec!["AAAA", "BBBB"]);
        assert_eq!(desc.platform_name(), "linux/arm64/v8");
    }

    #[test]
    fn test_descriptor_without_annotations() {
        let desc: Descriptor =
            serde_json::from_str(r#"{"mediaType":"m","digest":"d","size":1}"#).unwrap();
        assert!(desc.pgp_wrapped_keys().is_empty());
        assert_eq!(desc.platform_name(), "unknown");
    }

    #[test]
    fn test_invalid_descriptor_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, "{").unwrap();
        assert!(matches!(
            Descriptor::from_json_file(&path),
            Err(CryptError::Json(_))
        ));
        assert!(matches!(
            Descriptor::from_json_file(temp_dir.path().join("missing.json")),
            Err(CryptError::Io(_))
        ));
    }
}
