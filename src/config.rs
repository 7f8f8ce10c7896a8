use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_ENTITIES: [&str; 3] = [
    "Rockefeller Capital Management",
    "Cascade Investment",
    "Blue Pool Capital",
];

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Names tracked when the caller supplies none
    #[serde(default = "default_entities")]
    pub entities: Vec<String>,
    /// Maximum entries taken from each entity's feed per run
    #[serde(default = "default_per_entity_cap")]
    pub per_entity_cap: usize,
    /// Length of the rolling window in days
    #[serde(default = "default_cutoff_days")]
    pub cutoff_days: i64,
    /// Rows shown on the page and written to the CSV export
    #[serde(default = "default_display_limit")]
    pub display_limit: i64,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub provider: ProviderConfig,
}

fn default_entities() -> Vec<String> {
    DEFAULT_ENTITIES.iter().map(|s| s.to_string()).collect()
}

fn default_per_entity_cap() -> usize {
    20
}

fn default_cutoff_days() -> i64 {
    60
}

fn default_display_limit() -> i64 {
    200
}

fn default_database_url() -> String {
    "sqlite:family_office_news.db?mode=rwc".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_hl")]
    pub hl: String,
    #[serde(default = "default_gl")]
    pub gl: String,
    #[serde(default = "default_ceid")]
    pub ceid: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://news.google.com/rss/search".to_string()
}

fn default_hl() -> String {
    "en-PH".to_string()
}

fn default_gl() -> String {
    "PH".to_string()
}

fn default_ceid() -> String {
    "PH:en".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            hl: default_hl(),
            gl: default_gl(),
            ceid: default_ceid(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entities: default_entities(),
            per_entity_cap: default_per_entity_cap(),
            cutoff_days: default_cutoff_days(),
            display_limit: default_display_limit(),
            database_url: default_database_url(),
            bind_addr: default_bind_addr(),
            provider: ProviderConfig::default(),
        }
    }
}

/// Upper bound on `cutoff_days` (about a century).
pub const MAX_CUTOFF_DAYS: i64 = 36_500;

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_CUTOFF_DAYS).contains(&self.cutoff_days) {
            anyhow::bail!(
                "cutoff_days must be between 1 and {}, got {}",
                MAX_CUTOFF_DAYS,
                self.cutoff_days
            );
        }
        if self.display_limit < 1 {
            anyhow::bail!("display_limit must be positive, got {}", self.display_limit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        assert_eq!(default_per_entity_cap(), 20);
        assert_eq!(default_cutoff_days(), 60);
        assert_eq!(default_display_limit(), 200);
        assert_eq!(default_entities().len(), 3);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
            entities = ["Acme Capital", "Bravo Holdings"]
            per_entity_cap = 5
            cutoff_days = 30
            display_limit = 50
            database_url = "sqlite:test.db?mode=rwc"

            [provider]
            base_url = "http://localhost:9000/rss/search"
            hl = "en-US"
            gl = "US"
            ceid = "US:en"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.entities, vec!["Acme Capital", "Bravo Holdings"]);
        assert_eq!(config.per_entity_cap, 5);
        assert_eq!(config.cutoff_days, 30);
        assert_eq!(config.display_limit, 50);
        assert_eq!(config.database_url, "sqlite:test.db?mode=rwc");
        assert_eq!(config.provider.base_url, "http://localhost:9000/rss/search");
        assert_eq!(config.provider.hl, "en-US");
        assert_eq!(config.provider.gl, "US");
        assert_eq!(config.provider.ceid, "US:en");
        assert_eq!(config.provider.timeout_secs, 30);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();

        assert_eq!(config.entities[0], "Rockefeller Capital Management");
        assert_eq!(config.entities[1], "Cascade Investment");
        assert_eq!(config.entities[2], "Blue Pool Capital");
        assert_eq!(config.per_entity_cap, 20);
        assert_eq!(config.cutoff_days, 60);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.provider.base_url, "https://news.google.com/rss/search");
        assert_eq!(config.provider.ceid, "PH:en");
    }

    #[test]
    fn test_partial_provider_table() {
        let content = r#"
            [provider]
            hl = "en-GB"
        "#;

        let config = Config::from_str(content).unwrap();
        assert_eq!(config.provider.hl, "en-GB");
        assert_eq!(config.provider.gl, "PH"); // Default value
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = Config::load("/nonexistent/path/tracker.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let content = "this is not valid toml {{{";

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let result = Config::load(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let result = Config::from_str("per_entity_cap = \"lots\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_entities_list() {
        let config = Config::from_str("entities = []").unwrap();
        assert!(config.entities.is_empty());
    }

    #[test]
    fn test_cutoff_days_out_of_range() {
        for value in ["0", "-5", "1000000000"] {
            let result = Config::from_str(&format!("cutoff_days = {}", value));
            assert!(result.is_err(), "cutoff_days = {} was accepted", value);
        }
        assert!(Config::from_str("cutoff_days = 36500").is_ok());
        assert!(Config::from_str("cutoff_days = 1").is_ok());
    }

    #[test]
    fn test_display_limit_must_be_positive() {
        assert!(Config::from_str("display_limit = 0").is_err());
        assert!(Config::from_str("display_limit = -1").is_err());
        assert!(Config::from_str("display_limit = 1").is_ok());
    }

    #[test]
    fn test_load_validates() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"cutoff_days = -60").unwrap();

        let err = Config::load(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("cutoff_days"));
    }
}
