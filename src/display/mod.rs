//! Display formatting for terminal output
//!
//! Crypto configs hold key material, so only parameter names and entry
//! counts are ever printed.

pub mod summary;

use clap::ValueEnum;

pub use summary::{format_pkcs11_config, format_summary, format_summary_table};

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}
