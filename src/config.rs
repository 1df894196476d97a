use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cache::{SUBTITLE_TTL_HOURS, VIDEO_INFO_TTL_HOURS};
use crate::subtitles::{ProviderConfig, ProviderType};

/// Reserved video that always has phrases, real or built-in
pub const DEFAULT_DEMO_VIDEO_ID: &str = "dQw4w9WgXcQ";

/// Configuration for the Phrase Loop backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Caption provider selection and credentials
    pub provider: ProviderConfig,

    /// On-disk cache settings
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Log filter used when RUST_LOG is not set
    pub log_level: String,

    /// Video id served from built-in phrases when no provider has captions
    pub demo_video_id: String,

    /// Dictionary lookup base URL; the word is appended
    pub dictionary_endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub subtitle_dir: PathBuf,
    pub video_info_dir: PathBuf,
    pub subtitle_ttl_hours: u64,
    pub video_info_ttl_hours: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            demo_video_id: DEFAULT_DEMO_VIDEO_ID.to_string(),
            dictionary_endpoint: "https://api.dictionaryapi.dev/api/v2/entries/en/".to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            subtitle_dir: PathBuf::from(".subtitle-cache"),
            video_info_dir: PathBuf::from(".video-info-cache"),
            subtitle_ttl_hours: SUBTITLE_TTL_HOURS,
            video_info_ttl_hours: VIDEO_INFO_TTL_HOURS,
        }
    }
}

impl Config {
    /// Load configuration from the first readable config file, falling back
    /// to defaults. Environment overrides are applied either way.
    pub fn load() -> Result<Self> {
        let config_paths = ["phrase-loop.toml", "config/phrase-loop.toml"];

        let mut config = None;
        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(loaded) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        config = Some(loaded);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        let mut config = config.unwrap_or_default();
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from an explicit file. Unlike [`Config::load`],
    /// a missing or malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Cannot parse config file {}", path.display()))?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());

        config.apply_env();
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from any variable source
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("SUBTITLE_PROVIDER") {
            match provider.parse::<ProviderType>() {
                Ok(provider) => self.provider.provider = provider,
                Err(e) => tracing::warn!("Ignoring SUBTITLE_PROVIDER: {}", e),
            }
        }

        if let Some(api_key) = lookup("SUPADATA_API_KEY") {
            self.provider.api_key = Some(api_key);
        }

        if let Some(path) = lookup("YT_DLP_PATH") {
            self.provider.ytdlp_path = path;
        }

        if let Some(port) = lookup("PHRASE_LOOP_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PHRASE_LOOP_PORT: {}", port),
            }
        }

        if let Some(cache_dir) = lookup("PHRASE_LOOP_CACHE_DIR") {
            let base = PathBuf::from(cache_dir);
            self.cache.subtitle_dir = base.join(".subtitle-cache");
            self.cache.video_info_dir = base.join(".video-info-cache");
        }

        if let Some(log_level) = lookup("PHRASE_LOOP_LOG_LEVEL") {
            self.server.log_level = log_level;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration. Provider credentials are checked when a
    /// provider is built, not here.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("port must be greater than 0"));
        }

        if self.server.demo_video_id.trim().is_empty() {
            return Err(anyhow!("demo_video_id must not be empty"));
        }

        if self.provider.timeout_seconds == 0 {
            return Err(anyhow!("timeout_seconds must be greater than 0"));
        }

        if self.cache.subtitle_ttl_hours == 0 || self.cache.video_info_ttl_hours == 0 {
            return Err(anyhow!("cache TTLs must be greater than 0"));
        }

        if self.cache.subtitle_dir == self.cache.video_info_dir {
            return Err(anyhow!("subtitle and video-info caches need separate directories"));
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Phrase Loop Configuration:\n\
            - Listen: {}\n\
            - Subtitle Provider: {}\n\
            - API Key Set: {}\n\
            - yt-dlp Path: {}\n\
            - Subtitle Cache: {} ({}h)\n\
            - Video Info Cache: {} ({}h)\n\
            - Demo Video: {}",
            self.bind_address(),
            self.provider.provider,
            self.provider.api_key.is_some(),
            self.provider.ytdlp_path,
            self.cache.subtitle_dir.display(),
            self.cache.subtitle_ttl_hours,
            self.cache.video_info_dir.display(),
            self.cache.video_info_ttl_hours,
            self.server.demo_video_id
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_provider(mut self, provider: ProviderType) -> Self {
        self.config.provider.provider = provider;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.provider.api_key = Some(api_key.into());
        self
    }

    pub fn with_ytdlp_path(mut self, path: impl Into<String>) -> Self {
        self.config.provider.ytdlp_path = path.into();
        self
    }

    /// Put both caches under one parent directory
    pub fn with_cache_root(mut self, root: &Path) -> Self {
        self.config.cache.subtitle_dir = root.join(".subtitle-cache");
        self.config.cache.video_info_dir = root.join(".video-info-cache");
        self
    }

    pub fn with_dictionary_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.server.dictionary_endpoint = endpoint.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.demo_video_id, "dQw4w9WgXcQ");
        assert_eq!(config.provider.provider, ProviderType::Supadata);
        assert_eq!(config.provider.ytdlp_path, "/usr/bin/yt-dlp");
        assert_eq!(config.cache.subtitle_ttl_hours, 168);
        assert_eq!(config.cache.video_info_ttl_hours, 720);
        assert_eq!(config.cache.subtitle_dir, PathBuf::from(".subtitle-cache"));
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_port(8080)
            .with_provider(ProviderType::YtDlp)
            .with_ytdlp_path("/opt/yt-dlp")
            .with_cache_root(Path::new("/var/cache/phrase-loop"))
            .build();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.provider.provider, ProviderType::YtDlp);
        assert_eq!(config.provider.ytdlp_path, "/opt/yt-dlp");
        assert_eq!(
            config.cache.video_info_dir,
            PathBuf::from("/var/cache/phrase-loop/.video-info-cache")
        );
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SUBTITLE_PROVIDER", "yt-dlp"),
            ("SUPADATA_API_KEY", "sd_test"),
            ("YT_DLP_PATH", "/usr/local/bin/yt-dlp"),
            ("PHRASE_LOOP_PORT", "4000"),
            ("PHRASE_LOOP_CACHE_DIR", "/tmp/pl"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.provider.provider, ProviderType::YtDlp);
        assert_eq!(config.provider.api_key.as_deref(), Some("sd_test"));
        assert_eq!(config.provider.ytdlp_path, "/usr/local/bin/yt-dlp");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.cache.subtitle_dir, PathBuf::from("/tmp/pl/.subtitle-cache"));
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|name| match name {
            "SUBTITLE_PROVIDER" => Some("whisper".to_string()),
            "PHRASE_LOOP_PORT" => Some("not-a-port".to_string()),
            _ => None,
        });

        assert_eq!(config.provider.provider, ProviderType::Supadata);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8081

            [provider]
            provider = "yt-dlp"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.provider.provider, ProviderType::YtDlp);
        assert_eq!(config.provider.timeout_seconds, 60);
        assert_eq!(config.cache.video_info_ttl_hours, 720);
    }

    #[test]
    fn test_save_and_load_from() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("phrase-loop.toml");
        let config = ConfigBuilder::new().with_port(3100).with_api_key("k").build();

        config.save(path.to_str().unwrap()).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server.port, 3100);

        assert!(Config::load_from(&temp_dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let mut shared_dirs = Config::default();
        shared_dirs.cache.video_info_dir = shared_dirs.cache.subtitle_dir.clone();
        assert!(shared_dirs.validate().is_err());

        // no API key is still a valid config; the provider rejects it later
        assert!(config.provider.api_key.is_none());
    }
}
