//! PKCS11 key files and URIs
//!
//! A PKCS11 key file is a small YAML document pointing at a token object:
//!
//! ```yaml
//! pkcs11:
//!   uri: pkcs11:token=enc;object=key1?module-name=softhsm2&pin-value=1234
//! module:
//!   env:
//!     SOFTHSM2_CONF: /etc/softhsm2.conf
//! ```
//!
//! The same format serves as public and private key reference; the token
//! decides which half is used.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;

use crate::error::{CryptError, CryptResult};

const SCHEME: &str = "pkcs11:";

/// A parsed RFC 7512 PKCS11 URI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pkcs11Uri {
    path_attributes: BTreeMap<String, String>,
    query_attributes: BTreeMap<String, String>,
    env: BTreeMap<String, String>,
}

impl Pkcs11Uri {
    pub fn path_attribute(&self, name: &str) -> Option<&str> {
        self.path_attributes.get(name).map(String::as_str)
    }

    pub fn query_attribute(&self, name: &str) -> Option<&str> {
        self.query_attributes.get(name).map(String::as_str)
    }

    pub fn module_name(&self) -> Option<&str> {
        self.query_attribute("module-name")
    }

    pub fn module_path(&self) -> Option<&str> {
        self.query_attribute("module-path")
    }

    /// Environment the module is loaded with
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn set_env(&mut self, env: BTreeMap<String, String>) {
        self.env = env;
    }
}

/// Characters escaped in attribute values; the rest of RFC 7512 `pchar`
/// and `qchar` passes through unchanged
const ATTRIBUTE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b';')
    .add(b'=')
    .add(b'?');

/// `percent_decode_str` passes malformed escapes through; RFC 7512 values
/// must not contain a bare `%`
fn percent_decode(s: &str) -> CryptResult<String> {
    let bytes = s.as_bytes();
    for (i, _) in s.match_indices('%') {
        let valid = bytes
            .get(i + 1..i + 3)
            .map_or(false, |hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(CryptError::Pkcs11(format!("invalid percent encoding in '{}'", s)));
        }
    }

    percent_decode_str(s)
        .decode_utf8()
        .map(|v| v.into_owned())
        .map_err(|_| CryptError::Pkcs11(format!("percent encoding in '{}' is not UTF-8", s)))
}

fn parse_attributes(part: &str, separator: char) -> CryptResult<BTreeMap<String, String>> {
    let mut attrs = BTreeMap::new();
    for attr in part.split(separator).filter(|a| !a.is_empty()) {
        let (name, value) = attr.split_once('=').ok_or_else(|| {
            CryptError::Pkcs11(format!("malformed pkcs11 URI attribute '{}'", attr))
        })?;
        if name.is_empty() {
            return Err(CryptError::Pkcs11(format!(
                "malformed pkcs11 URI attribute '{}'",
                attr
            )));
        }
        if attrs
            .insert(name.to_string(), percent_decode(value)?)
            .is_some()
        {
            return Err(CryptError::Pkcs11(format!(
                "duplicate pkcs11 URI attribute '{}'",
                name
            )));
        }
    }
    Ok(attrs)
}

impl FromStr for Pkcs11Uri {
    type Err = CryptError;

    fn from_str(uri: &str) -> CryptResult<Self> {
        let rest = uri.strip_prefix(SCHEME).ok_or_else(|| {
            CryptError::Pkcs11("malformed pkcs11 URI: missing pkcs11: prefix".into())
        })?;

        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        Ok(Self {
            path_attributes: parse_attributes(path, ';')?,
            query_attributes: parse_attributes(query, '&')?,
            env: BTreeMap::new(),
        })
    }
}

impl fmt::Display for Pkcs11Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |attrs: &BTreeMap<String, String>, sep: &str| {
            attrs
                .iter()
                .map(|(k, v)| format!("{}={}", k, utf8_percent_encode(v, ATTRIBUTE_VALUE)))
                .collect::<Vec<_>>()
                .join(sep)
        };
        write!(f, "{}{}", SCHEME, join(&self.path_attributes, ";"))?;
        if !self.query_attributes.is_empty() {
            write!(f, "?{}", join(&self.query_attributes, "&"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Pkcs11KeyFile {
    pkcs11: Pkcs11Section,
    #[serde(default)]
    module: ModuleSection,
}

#[derive(Debug, Deserialize)]
struct Pkcs11Section {
    uri: String,
}

#[derive(Debug, Default, Deserialize)]
struct ModuleSection {
    #[serde(default)]
    env: BTreeMap<String, String>,
}

/// Parse a PKCS11 key file; the module environment is attached to the URI
pub fn parse_pkcs11_key_file(yaml: &[u8]) -> CryptResult<Pkcs11Uri> {
    let file: Pkcs11KeyFile = serde_yaml::from_slice(yaml)
        .map_err(|e| CryptError::Pkcs11(format!("could not unmarshal pkcs11 keyfile: {}", e)))?;

    let mut uri: Pkcs11Uri = file.pkcs11.uri.parse()?;
    uri.set_env(file.module.env);
    Ok(uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_FILE: &str = "pkcs11:\n  uri: pkcs11:token=enc;object=key1?module-name=softhsm2&pin-value=12%334\nmodule:\n  env:\n    SOFTHSM2_CONF: /etc/softhsm2.conf\n";

    #[test]
    fn test_parse_uri() {
        let uri: Pkcs11Uri =
            "pkcs11:token=my%20token;object=key?module-path=/usr/lib/softhsm/libsofthsm2.so"
                .parse()
                .unwrap();
        assert_eq!(uri.path_attribute("token"), Some("my token"));
        assert_eq!(uri.path_attribute("object"), Some("key"));
        assert_eq!(uri.module_path(), Some("/usr/lib/softhsm/libsofthsm2.so"));
        assert_eq!(uri.module_name(), None);
    }

    #[test]
    fn test_parse_uri_errors() {
        assert!("token=x".parse::<Pkcs11Uri>().is_err());
        assert!("pkcs11:token".parse::<Pkcs11Uri>().is_err());
        assert!("pkcs11:=x".parse::<Pkcs11Uri>().is_err());
        assert!("pkcs11:token=%zz".parse::<Pkcs11Uri>().is_err());
        assert!("pkcs11:token=ab%4".parse::<Pkcs11Uri>().is_err());
        assert!("pkcs11:token=%ff".parse::<Pkcs11Uri>().is_err());
        assert!("pkcs11:token=a;token=b".parse::<Pkcs11Uri>().is_err());
    }

    #[test]
    fn test_empty_uri_is_valid() {
        let uri: Pkcs11Uri = "pkcs11:".parse().unwrap();
        assert_eq!(uri.to_string(), "pkcs11:");
    }

    #[test]
    fn test_display_reencodes_values() {
        let uri: Pkcs11Uri = "pkcs11:token=a%3Bb;object=my%20key?pin-value=1%262"
            .parse()
            .unwrap();
        assert_eq!(uri.path_attribute("token"), Some("a;b"));
        assert_eq!(uri.query_attribute("pin-value"), Some("1&2"));

        let displayed = uri.to_string();
        assert_eq!(displayed, "pkcs11:object=my%20key;token=a%3Bb?pin-value=1%262");
        assert_eq!(displayed.parse::<Pkcs11Uri>().unwrap(), uri);
    }

    #[test]
    fn test_display_keeps_paths_readable() {
        let uri: Pkcs11Uri = "pkcs11:object=k?module-path=/usr/lib/softhsm/libsofthsm2.so"
            .parse()
            .unwrap();
        assert_eq!(
            uri.to_string(),
            "pkcs11:object=k?module-path=/usr/lib/softhsm/libsofthsm2.so"
        );
    }

    #[test]
    fn test_parse_key_file() {
        let uri = parse_pkcs11_key_file(KEY_FILE.as_bytes()).unwrap();
        assert_eq!(uri.path_attribute("token"), Some("enc"));
        assert_eq!(uri.query_attribute("pin-value"), Some("1234"));
        assert_eq!(
            uri.env().get("SOFTHSM2_CONF").map(String::as_str),
            Some("/etc/softhsm2.conf")
        );
    }

    #[test]
    fn test_key_file_without_module() {
        let uri = parse_pkcs11_key_file(b"pkcs11:\n  uri: pkcs11:object=k\n").unwrap();
        assert!(uri.env().is_empty());
    }

    #[test]
    fn test_not_a_key_file() {
        let pem = b"-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----\n";
        assert!(parse_pkcs11_key_file(pem).is_err());
        assert!(parse_pkcs11_key_file(b"pkcs11:\n  uri: file:///etc/passwd\n").is_err());
        assert!(parse_pkcs11_key_file(&[0x99, 0x01, 0x0d]).is_err());
    }
}
