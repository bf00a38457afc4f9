use serde::Deserialize;

use crate::models::irradiance::{SkyCondition, ZeroIrradiancePolicy};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "HELIO_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

fn default_port() -> u16 { 5000 }
fn default_static_dir() -> String { "static".to_string() }
fn default_parallel() -> bool { true }
fn default_timeout_secs() -> u64 { 120 }
fn default_csv_metadata_rows() -> usize { 2 }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Sky used for chart series when a request does not name one
    #[serde(default)]
    pub default_sky_condition: SkyCondition,
    #[serde(default)]
    pub zero_irradiance_policy: ZeroIrradiancePolicy,
    /// Evaluate the twelve arrangement/sky pairs on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Upper bound for one whole analysis request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Metadata lines preceding the header row of an hourly CSV export
    #[serde(default = "default_csv_metadata_rows")]
    pub csv_metadata_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_sky_condition: SkyCondition::default(),
            zero_irradiance_policy: ZeroIrradiancePolicy::default(),
            parallel: default_parallel(),
            timeout_secs: default_timeout_secs(),
            csv_metadata_rows: default_csv_metadata_rows(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Path from `HELIO_CONFIG`, falling back to `config.json`.
    pub fn path_from_env() -> String {
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.server.static_dir, "static");
        assert_eq!(cfg.analysis.default_sky_condition, SkyCondition::Cloudy);
        assert_eq!(cfg.analysis.zero_irradiance_policy, ZeroIrradiancePolicy::DropBothZero);
        assert!(cfg.analysis.parallel);
        assert_eq!(cfg.analysis.timeout_secs, 120);
        assert_eq!(cfg.analysis.csv_metadata_rows, 2);
    }

    #[test]
    fn test_partial_overrides() {
        let json = r#"{
            "server": { "port": 8080 },
            "analysis": { "zero_irradiance_policy": "keep_all", "default_sky_condition": "clear", "parallel": false }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.static_dir, "static");
        assert_eq!(cfg.analysis.zero_irradiance_policy, ZeroIrradiancePolicy::KeepAll);
        assert_eq!(cfg.analysis.default_sky_condition, SkyCondition::Clear);
        assert!(!cfg.analysis.parallel);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        assert!(Config::load("/nonexistent/helio/config.json").is_err());
    }
}
