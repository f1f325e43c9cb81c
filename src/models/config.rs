use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub default_payment_terms: i64,
    pub currency_symbol: String,
    pub invoice_prefix: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_payment_terms: 30,
            currency_symbol: "$".to_string(),
            invoice_prefix: "INV".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0..=365).contains(&self.default_payment_terms) {
            return Err(anyhow::anyhow!(
                "Default payment terms must be between 0 and 365 days"
            ));
        }

        if self.invoice_prefix.is_empty() || self.invoice_prefix.len() > 10 {
            return Err(anyhow::anyhow!(
                "Invoice prefix must be 1-10 characters"
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(anyhow::anyhow!(
                "Log level must be one of: {}",
                valid_levels.join(", ")
            ));
        }

        Ok(())
    }
}
