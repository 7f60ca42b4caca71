//! PEM block decoding
//!
//! Finds the first `-----BEGIN <label>-----` block in a buffer, collects its
//! RFC 1421 headers and base64-decodes the body. Leading and trailing text
//! is ignored.

use base64::{engine::general_purpose::STANDARD, Engine};

const BEGIN: &str = "-----BEGIN ";
const END: &str = "-----END ";
const DASHES: &str = "-----";

/// A decoded PEM block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PemBlock {
    pub label: String,
    pub headers: Vec<(String, String)>,
    pub contents: Vec<u8>,
}

impl PemBlock {
    /// Value of a header, if present
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// OpenSSL legacy encryption (`Proc-Type: 4,ENCRYPTED` plus `DEK-Info`)
    pub fn is_legacy_encrypted(&self) -> bool {
        self.header("Proc-Type")
            .map(|v| v.contains("ENCRYPTED"))
            .unwrap_or(false)
    }
}

/// Decode the first PEM block in `data`
pub fn decode(data: &[u8]) -> Option<PemBlock> {
    let text = String::from_utf8_lossy(data);
    let mut lines = text.lines().map(str::trim_end);

    let label = loop {
        let line = lines.next()?;
        if let Some(rest) = line.trim_start().strip_prefix(BEGIN) {
            if let Some(label) = rest.strip_suffix(DASHES) {
                break label.to_string();
            }
        }
    };
    let end_marker = format!("{}{}{}", END, label, DASHES);

    let mut headers = Vec::new();
    let mut body = String::new();
    let mut in_headers = true;
    let mut terminated = false;

    for line in lines {
        let line = line.trim();
        if line == end_marker {
            terminated = true;
            break;
        }
        if in_headers {
            if line.is_empty() {
                in_headers = false;
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                headers.push((key.trim().to_string(), value.trim().to_string()));
                continue;
            }
            in_headers = false;
        }
        body.push_str(line);
    }

    if !terminated {
        return None;
    }
    let contents = STANDARD.decode(body.as_bytes()).ok()?;

    Some(PemBlock {
        label,
        headers,
        contents,
    })
}

/// Encode DER as a PEM block with 64 column lines
#[cfg(test)]
pub(crate) fn encode(label: &str, headers: &[(&str, &str)], der: &[u8]) -> String {
    let mut out = format!("{}{}{}\n", BEGIN, label, DASHES);
    for (k, v) in headers {
        out.push_str(&format!("{}: {}\n", k, v));
    }
    if !headers.is_empty() {
        out.push('\n');
    }
    let b64 = STANDARD.encode(der);
    for chunk in b64.as_bytes().chunks(64) {
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        out.push('\n');
    }
    out.push_str(&format!("{}{}{}\n", END, label, DASHES));
    out
}
