//! Crypto config summary formatting

use std::collections::BTreeMap;

use crate::config::Pkcs11Config;
use crate::cryptoconfig::ConfigSummary;
use crate::error::CryptResult;

use super::OutputFormat;

/// Format a config summary as a table of section, parameter and count
pub fn format_summary_table(summary: &ConfigSummary) -> String {
    let sections: [(&str, &Option<BTreeMap<String, usize>>); 3] = [
        ("encrypt", &summary.encrypt),
        ("encrypt.decrypt", &summary.encrypt_decrypt),
        ("decrypt", &summary.decrypt),
    ];

    let rows: Vec<(&str, &str, usize)> = sections
        .iter()
        .filter_map(|(name, params)| params.as_ref().map(|p| (*name, p)))
        .flat_map(|(name, params)| params.iter().map(move |(k, v)| (name, k.as_str(), *v)))
        .collect();

    if rows.is_empty() {
        return "Empty crypto config.".to_string();
    }

    let section_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(7).max(7);
    let param_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(9).max(9);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<section_width$}  {:<param_width$}  {:>7}\n",
        "Section",
        "Parameter",
        "Entries",
        section_width = section_width,
        param_width = param_width,
    ));
    output.push_str(&format!(
        "{:-<section_width$}  {:-<param_width$}  {:->7}\n",
        "",
        "",
        "",
        section_width = section_width,
        param_width = param_width,
    ));

    for (section, param, count) in rows {
        output.push_str(&format!(
            "{:<section_width$}  {:<param_width$}  {:>7}\n",
            section,
            param,
            count,
            section_width = section_width,
            param_width = param_width,
        ));
    }

    output
}

/// Format a config summary in the requested format
pub fn format_summary(summary: &ConfigSummary, format: OutputFormat) -> CryptResult<String> {
    Ok(match format {
        OutputFormat::Table => format_summary_table(summary),
        OutputFormat::Json => serde_json::to_string_pretty(summary)?,
        OutputFormat::Yaml => serde_yaml::to_string(summary)?,
    })
}

/// Format a PKCS11 configuration
pub fn format_pkcs11_config(config: &Pkcs11Config, format: OutputFormat) -> CryptResult<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(config)?,
        OutputFormat::Table | OutputFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> ConfigSummary {
        let mut enc = BTreeMap::new();
        enc.insert("pubkeys".to_string(), 2);
        let mut dec = BTreeMap::new();
        dec.insert("privkeys".to_string(), 1);
        ConfigSummary {
            encrypt: Some(enc),
            encrypt_decrypt: Some(BTreeMap::new()),
            decrypt: Some(dec),
        }
    }

    #[test]
    fn test_table() {
        let table = format_summary_table(&summary());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Section"));
        assert!(lines[2].starts_with("encrypt "));
        assert!(lines[2].contains("pubkeys"));
        assert!(lines[2].trim_end().ends_with('2'));
        assert!(lines[3].starts_with("decrypt"));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(
            format_summary_table(&ConfigSummary::default()),
            "Empty crypto config."
        );
    }

    #[test]
    fn test_json_and_yaml() {
        let json = format_summary(&summary(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["encrypt"]["pubkeys"], 2);

        let yaml = format_summary(&summary(), OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("privkeys: 1"));
    }

    #[test]
    fn test_pkcs11_config_yaml() {
        let config = Pkcs11Config {
            module_directories: vec!["/usr/lib/softhsm/".into()],
            allowed_module_paths: vec![],
        };
        let yaml = format_pkcs11_config(&config, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("module-directories"));
        assert!(yaml.contains("/usr/lib/softhsm/"));
    }
}
