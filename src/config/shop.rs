//! Shop configuration loading from config.toml
//!
//! The file names the shop, tunes the sale retry policy and lists the starter
//! catalog that is seeded into an empty database. Every section is optional.

use crate::core::{catalog::NewProduct, retry::RetryPolicy};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Shop identity and display settings
    #[serde(default)]
    pub shop: ShopConfig,
    /// Sale retry tuning
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Starter products to seed
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// `[shop]` section
#[derive(Debug, Deserialize, Clone)]
pub struct ShopConfig {
    /// Display name of the shop
    pub name: String,
    /// Currency label used when formatting amounts
    pub currency: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            name: "Shopkeeper".to_string(),
            currency: "Bs".to_string(),
        }
    }
}

/// `[ledger]` section
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LedgerConfig {
    /// How many times a contended sale is attempted before giving up
    pub max_sale_attempts: u32,
    /// Backoff before the first retry, doubled on each further retry
    pub base_backoff_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_sale_attempts: policy.max_attempts,
            base_backoff_ms: policy.base_backoff_ms,
        }
    }
}

impl LedgerConfig {
    /// Converts the section into the ledger's retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_sale_attempts,
            base_backoff_ms: self.base_backoff_ms,
        }
    }
}

/// Configuration for a single starter product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    /// Product name
    pub name: String,
    /// Category label
    pub category: String,
    /// Opening stock
    pub initial_stock: i64,
    /// Unit cost
    pub cost_price: f64,
    /// Unit selling price
    pub sale_price: f64,
}

impl From<&ProductConfig> for NewProduct {
    fn from(config: &ProductConfig) -> Self {
        Self {
            name: config.name.clone(),
            category: config.category.clone(),
            initial_stock: config.initial_stock,
            cost_price: config.cost_price,
            sale_price: config.sale_price,
        }
    }
}

/// Loads the shop configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Field types do not match
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the configuration named by `SHOPKEEPER_CONFIG` (default `./config.toml`).
///
/// A missing file is not an error: the defaults are used and nothing is seeded.
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var("SHOPKEEPER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    if !Path::new(&path).exists() {
        tracing::info!("No config file at {}, using defaults", path);
        return Ok(Config::default());
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_shop_config() {
        let toml_str = r#"
            [shop]
            name = "Bazar Familiar"
            currency = "Bs"

            [ledger]
            max_sale_attempts = 8
            base_backoff_ms = 5

            [[products]]
            name = "Arroz"
            category = "Abarrotes"
            initial_stock = 50
            cost_price = 4.5
            sale_price = 5.5

            [[products]]
            name = "Aceite"
            category = "Abarrotes"
            initial_stock = 20
            cost_price = 10.0
            sale_price = 12.0
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.shop.name, "Bazar Familiar");
        assert_eq!(config.ledger.max_sale_attempts, 8);
        assert_eq!(config.ledger.retry_policy().base_backoff_ms, 5);
        assert_eq!(config.products.len(), 2);
        assert_eq!(config.products[0].name, "Arroz");
        assert_eq!(config.products[1].sale_price, 12.0);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.shop.currency, "Bs");
        assert!(config.products.is_empty());
        assert_eq!(
            config.ledger.max_sale_attempts,
            RetryPolicy::default().max_attempts
        );
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[shop]\nname = \"Corner\"\ncurrency = \"$\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.shop.name, "Corner");
        assert_eq!(config.shop.currency, "$");
    }

    #[test]
    fn test_load_config_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[products]]\nname = 42").unwrap();

        let result = load_config(file.path());
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("/nonexistent/shopkeeper/config.toml");
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }
}
