use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::Platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub cache: CacheConfig,

    pub providers: ProvidersConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Emit one JSON object per log line instead of human-readable output.
    pub json_logs: bool,

    #[serde(default)]
    pub suppress_connection_errors: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/fanvault.db".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            suppress_connection_errors: false,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 6790,
            cors_allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a cached result page, and a watermark left untouched, stays live.
    pub ttl_hours: u32,

    /// Cron expression for the expiry sweep (seconds field included).
    pub sweep_cron: String,

    pub sweep_enabled: bool,

    /// Items requested per provider page before clamping to the provider maximum.
    pub page_size: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            sweep_cron: "0 0 4 * * *".to_string(),
            sweep_enabled: true,
            page_size: 20,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.ttl_hours))
    }
}

/// Settings shared by every provider adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub enabled: bool,

    /// Credential for API-backed providers. Scraped boards leave this empty.
    pub api_key: Option<String>,

    /// Overrides the provider's public endpoint (self-hosted scrapers, test servers).
    pub base_url: Option<String>,

    /// Request timeout in seconds (default: 8)
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: None,
            timeout_seconds: 8,
        }
    }
}

impl ProviderConfig {
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    #[must_use]
    pub fn base_url_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .unwrap_or(default)
    }

    #[must_use]
    pub const fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub youtube: ProviderConfig,

    pub twitter: ProviderConfig,

    pub instagram: ProviderConfig,

    pub tiktok: ProviderConfig,

    pub theqoo: ProviderConfig,

    pub instiz: ProviderConfig,

    pub kpopping: ProviderConfig,
}

impl ProvidersConfig {
    #[must_use]
    pub const fn get(&self, platform: Platform) -> &ProviderConfig {
        match platform {
            Platform::Youtube => &self.youtube,
            Platform::Twitter => &self.twitter,
            Platform::Instagram => &self.instagram,
            Platform::Tiktok => &self.tiktok,
            Platform::Theqoo => &self.theqoo,
            Platform::Instiz => &self.instiz,
            Platform::Kpopping => &self.kpopping,
        }
    }

    pub fn get_mut(&mut self, platform: Platform) -> &mut ProviderConfig {
        match platform {
            Platform::Youtube => &mut self.youtube,
            Platform::Twitter => &mut self.twitter,
            Platform::Instagram => &mut self.instagram,
            Platform::Tiktok => &mut self.tiktok,
            Platform::Theqoo => &mut self.theqoo,
            Platform::Instiz => &mut self.instiz,
            Platform::Kpopping => &mut self.kpopping,
        }
    }

    /// Pulls credentials from the environment when the file leaves them unset.
    fn apply_env(&mut self) {
        for platform in Platform::ALL {
            let var = format!("FANVAULT_{}_API_KEY", platform.as_str().to_ascii_uppercase());
            if let Ok(key) = std::env::var(&var) {
                let provider = self.get_mut(platform);
                if provider.api_key().is_none() {
                    provider.api_key = Some(key);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.providers.apply_env();

        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("fanvault").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".fanvault").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_hours == 0 {
            anyhow::bail!("cache.ttl_hours must be > 0");
        }

        if self.cache.page_size == 0 {
            anyhow::bail!("cache.page_size must be > 0");
        }

        if self.server.enabled && self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0 when the server is enabled");
        }

        for platform in Platform::ALL {
            if self.providers.get(platform).timeout_seconds == 0 {
                anyhow::bail!("providers.{platform}.timeout_seconds must be > 0");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_hours, 24);
        assert_eq!(config.cache.ttl(), chrono::Duration::hours(24));
        assert!(config.providers.youtube.api_key().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[cache]"));
        assert!(toml_str.contains("[providers.youtube]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [cache]
            ttl_hours = 6

            [providers.youtube]
            api_key = "  yt-key  "
            timeout_seconds = 5
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.cache.ttl_hours, 6);
        assert_eq!(config.cache.page_size, 20);
        assert_eq!(config.providers.youtube.api_key(), Some("yt-key"));
        assert_eq!(config.providers.youtube.timeout_seconds, 5);
        assert!(config.providers.tiktok.enabled);
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = Config::default();
        config.cache.ttl_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_url_override_strips_trailing_slash() {
        let provider = ProviderConfig {
            base_url: Some("http://127.0.0.1:9000/".to_string()),
            ..Default::default()
        };
        assert_eq!(provider.base_url_or("https://example.com"), "http://127.0.0.1:9000");
        assert_eq!(
            ProviderConfig::default().base_url_or("https://example.com"),
            "https://example.com"
        );
    }
}
