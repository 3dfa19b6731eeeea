use std::env;

use mtdynamo_core::mapping::{ScanColumns, DEFAULT_SCAN_TENANT_KEY, DEFAULT_SCAN_VIRTUAL_TABLE_KEY};
use mtdynamo_core::schema::DEFAULT_TABLE_PREFIX;
use thiserror::Error;

/// Delimiter between context, table name and value in qualified hash keys.
pub const DEFAULT_DELIMITER: char = '.';

/// Errors raised while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a single character, got {value:?}")]
    InvalidDelimiter { name: &'static str, value: String },
}

/// Layer configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Qualifier delimiter (default: '.')
    pub delimiter: char,
    /// Name prefix of the shared physical tables (default: "mt_sharedtable_")
    pub table_prefix: String,
    /// Column carrying the tenant of cross-tenant scan rows (default: "mt:context")
    pub scan_tenant_key: String,
    /// Column carrying the virtual table of cross-tenant scan rows (default: "mt:tableName")
    pub scan_virtual_table_key: String,
    /// Maximum number of built table mappings kept in memory (default: 1,000)
    pub mapping_cache_max_entries: usize,
    /// Custom DynamoDB endpoint, e.g. DynamoDB Local
    pub aws_endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1")
    pub aws_region: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `MT_DELIMITER` - Qualifier delimiter (default: '.')
    /// - `MT_TABLE_PREFIX` - Shared table prefix (default: "mt_sharedtable_")
    /// - `MT_SCAN_TENANT_KEY` - Cross-tenant scan context column (default: "mt:context")
    /// - `MT_SCAN_VIRTUAL_TABLE_KEY` - Cross-tenant scan table column (default: "mt:tableName")
    /// - `MT_MAPPING_CACHE_MAX_ENTRIES` - Mapping cache size (default: 1,000)
    /// - `AWS_ENDPOINT_URL` - Custom DynamoDB endpoint (default: none)
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let delimiter = match lookup("MT_DELIMITER") {
            None => DEFAULT_DELIMITER,
            Some(value) => {
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => {
                        return Err(ConfigError::InvalidDelimiter {
                            name: "MT_DELIMITER",
                            value,
                        })
                    }
                }
            }
        };

        Ok(Self {
            delimiter,
            table_prefix: lookup("MT_TABLE_PREFIX")
                .unwrap_or_else(|| DEFAULT_TABLE_PREFIX.to_string()),
            scan_tenant_key: lookup("MT_SCAN_TENANT_KEY")
                .unwrap_or_else(|| DEFAULT_SCAN_TENANT_KEY.to_string()),
            scan_virtual_table_key: lookup("MT_SCAN_VIRTUAL_TABLE_KEY")
                .unwrap_or_else(|| DEFAULT_SCAN_VIRTUAL_TABLE_KEY.to_string()),
            mapping_cache_max_entries: lookup("MT_MAPPING_CACHE_MAX_ENTRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1_000),
            aws_endpoint_url: lookup("AWS_ENDPOINT_URL"),
            aws_region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
        })
    }

    /// Output columns for cross-tenant scans.
    pub fn scan_columns(&self) -> ScanColumns {
        ScanColumns::new(&self.scan_tenant_key, &self.scan_virtual_table_key)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            scan_tenant_key: DEFAULT_SCAN_TENANT_KEY.to_string(),
            scan_virtual_table_key: DEFAULT_SCAN_VIRTUAL_TABLE_KEY.to_string(),
            mapping_cache_max_entries: 1_000,
            aws_endpoint_url: None,
            aws_region: "us-east-1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.scan_columns(), ScanColumns::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("MT_DELIMITER", "/"),
            ("MT_TABLE_PREFIX", "shared_"),
            ("MT_SCAN_TENANT_KEY", "tenant"),
            ("MT_SCAN_VIRTUAL_TABLE_KEY", "table"),
            ("MT_MAPPING_CACHE_MAX_ENTRIES", "16"),
            ("AWS_ENDPOINT_URL", "http://localhost:8000"),
            ("AWS_REGION", "eu-west-1"),
        ]))
        .unwrap();

        assert_eq!(config.delimiter, '/');
        assert_eq!(config.table_prefix, "shared_");
        assert_eq!(config.scan_columns(), ScanColumns::new("tenant", "table"));
        assert_eq!(config.mapping_cache_max_entries, 16);
        assert_eq!(config.aws_endpoint_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.aws_region, "eu-west-1");
    }

    #[test]
    fn test_unparseable_cache_size_falls_back() {
        let config =
            Config::from_lookup(lookup(&[("MT_MAPPING_CACHE_MAX_ENTRIES", "lots")])).unwrap();
        assert_eq!(config.mapping_cache_max_entries, 1_000);
    }

    #[test]
    fn test_multi_character_delimiter_is_rejected() {
        let err = Config::from_lookup(lookup(&[("MT_DELIMITER", "::")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "MT_DELIMITER must be a single character, got \"::\""
        );
    }
}
