//! JSON Web Key recognition
//!
//! Asymmetric JWKs (`RSA`, `EC`, `OKP`) are accepted as JWE recipients and
//! private keys. A key is private when it carries the `d` member.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::{Map, Value};

/// Visibility of a parsed JWK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwkKind {
    Public,
    Private,
}

/// Members that must be present, base64url encoded, for each key type
fn required_members(kty: &str) -> Option<&'static [&'static str]> {
    match kty {
        "RSA" => Some(&["n", "e"]),
        "EC" => Some(&["x", "y"]),
        "OKP" => Some(&["x"]),
        _ => None,
    }
}

fn b64_member(obj: &Map<String, Value>, name: &str) -> bool {
    obj.get(name)
        .and_then(Value::as_str)
        .map(|v| !v.is_empty() && URL_SAFE_NO_PAD.decode(v).is_ok())
        .unwrap_or(false)
}

/// Classify `data` as a public or private asymmetric JWK
pub fn classify(data: &[u8]) -> Option<JwkKind> {
    let obj: Map<String, Value> = serde_json::from_slice(data).ok()?;
    let kty = obj.get("kty")?.as_str()?;
    let required = required_members(kty)?;

    if kty != "RSA" && obj.get("crv").and_then(Value::as_str).is_none() {
        return None;
    }
    if !required.iter().all(|m| b64_member(&obj, m)) {
        return None;
    }

    if obj.contains_key("d") {
        b64_member(&obj, "d").then_some(JwkKind::Private)
    } else {
        Some(JwkKind::Public)
    }
}
