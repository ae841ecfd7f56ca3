use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::batch::{PacingTier, RateLimitPolicy};
use crate::retry::RetryPolicy;

/// Configuration for the YouTube extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Downloader and request settings
    pub youtube: YoutubeConfig,

    /// Transcript backend settings
    pub transcript: TranscriptConfig,

    /// Retry/backoff settings
    pub retry: RetryConfig,

    /// Batch pacing settings
    pub batch: BatchConfig,

    /// Output and logging settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Maximum URLs accepted by `/transcript`
    pub max_batch_size: usize,

    /// Maximum URLs accepted from one uploaded CSV
    pub max_csv_batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// Path or name of the yt-dlp executable
    pub ytdlp_path: String,

    /// Netscape cookie file handed to the downloader
    pub cookies_file: Option<PathBuf>,

    pub user_agent: String,
    pub accept_language: String,

    /// Socket timeout passed to yt-dlp (seconds)
    pub socket_timeout_secs: u64,

    /// Player clients tried by yt-dlp, in order
    pub player_clients: Vec<String>,

    /// Transcript languages used when a request names none
    pub default_languages: Vec<String>,

    /// Wall-clock limit for one downloader run (seconds)
    pub command_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Backends tried in order; first success wins
    pub backends: Vec<String>,

    /// Pause before downloading a manual subtitle track (ms)
    pub manual_delay_ms: u64,

    /// Pause before downloading an automatic caption track (ms)
    pub automatic_delay_ms: u64,

    /// HTTP timeout for caption and subtitle requests (seconds)
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Delay tiers keyed by batch size
    pub tiers: Vec<PacingTierConfig>,
    /// Tiers for `POST /transcript/csv`, which paces lighter than the other batch routes
    pub csv_upload_tiers: Vec<PacingTierConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingTierConfig {
    pub min_items: usize,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub log_level: String,

    /// Characters of transcript kept in compact CSV exports
    pub csv_preview_chars: usize,
}

impl Config {
    /// Load configuration from an explicit file or the default search locations,
    /// then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_default_locations(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse one TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    fn from_default_locations() -> Self {
        let config_paths = [
            "youtube-extractor.toml",
            "config/youtube-extractor.toml",
            "/etc/youtube-extractor/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::default()
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override settings from environment variables
    pub fn apply_env(&mut self) {
        if let Ok(cookies) = std::env::var("YOUTUBE_COOKIES_FILE") {
            let path = PathBuf::from(cookies.trim());
            if path.exists() {
                self.youtube.cookies_file = Some(path);
            } else {
                tracing::warn!("YOUTUBE_COOKIES_FILE points to a missing file: {}", path.display());
            }
        }

        if let Ok(host) = std::env::var("YOUTUBE_EXTRACTOR_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("YOUTUBE_EXTRACTOR_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid YOUTUBE_EXTRACTOR_PORT: {}", port),
            }
        }

        if let Ok(languages) = std::env::var("YOUTUBE_EXTRACTOR_LANGUAGES") {
            let languages = parse_language_list(&languages);
            if !languages.is_empty() {
                self.youtube.default_languages = languages;
            }
        }

        if let Ok(ytdlp) = std::env::var("YOUTUBE_EXTRACTOR_YTDLP") {
            self.youtube.ytdlp_path = ytdlp;
        }

        if let Ok(log_level) = std::env::var("YOUTUBE_EXTRACTOR_LOG_LEVEL") {
            self.output.log_level = log_level;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(anyhow!("retry.max_attempts must be greater than 0"));
        }

        if self.transcript.backends.is_empty() {
            return Err(anyhow!("transcript.backends must name at least one backend"));
        }

        if self.youtube.default_languages.is_empty() {
            return Err(anyhow!("youtube.default_languages must not be empty"));
        }

        if self.server.max_batch_size == 0 || self.server.max_csv_batch_size == 0 {
            return Err(anyhow!("server batch limits must be greater than 0"));
        }

        if self.youtube.ytdlp_path.trim().is_empty() {
            return Err(anyhow!("youtube.ytdlp_path must not be empty"));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Cookie file to hand to the downloader, if it exists
    pub fn cookies_file(&self) -> Option<&Path> {
        self.youtube
            .cookies_file
            .as_deref()
            .filter(|path| path.exists())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        pacing_policy(&self.batch.tiers)
    }

    /// Pacing for CSV uploads answered inline
    pub fn csv_upload_policy(&self) -> RateLimitPolicy {
        pacing_policy(&self.batch.csv_upload_tiers)
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "YouTube Extractor Configuration:\n\
            - Listen Address: {}:{}\n\
            - yt-dlp: {}\n\
            - Cookie File: {}\n\
            - Default Languages: {}\n\
            - Transcript Backends: {}\n\
            - Retry: {} attempts, {}ms base, {}ms cap\n\
            - Batch Limits: {} (JSON), {} (CSV)",
            self.server.host,
            self.server.port,
            self.youtube.ytdlp_path,
            self.cookies_file()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string()),
            self.youtube.default_languages.join(", "),
            self.transcript.backends.join(" -> "),
            self.retry.max_attempts,
            self.retry.base_delay_ms,
            self.retry.max_delay_ms,
            self.server.max_batch_size,
            self.server.max_csv_batch_size,
        )
    }
}

fn pacing_policy(tiers: &[PacingTierConfig]) -> RateLimitPolicy {
    RateLimitPolicy::new(
        tiers
            .iter()
            .map(|tier| PacingTier {
                min_items: tier.min_items,
                delay: Duration::from_millis(tier.delay_ms),
            })
            .collect(),
    )
}

/// Split a comma-separated language list, dropping blanks
pub fn parse_language_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            youtube: YoutubeConfig::default(),
            transcript: TranscriptConfig::default(),
            retry: RetryConfig::default(),
            batch: BatchConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_batch_size: 50,
            max_csv_batch_size: 200,
        }
    }
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            cookies_file: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept_language: "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
            socket_timeout_secs: 30,
            player_clients: ["android", "ios", "web", "mweb"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_languages: vec!["ko".to_string()],
            command_timeout_secs: 120,
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            backends: vec!["captions".to_string(), "ytdlp".to_string()],
            manual_delay_ms: 500,
            automatic_delay_ms: 1000,
            http_timeout_secs: 15,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                PacingTierConfig { min_items: 0, delay_ms: 2000 },
                PacingTierConfig { min_items: 51, delay_ms: 3000 },
                PacingTierConfig { min_items: 100, delay_ms: 5000 },
            ],
            csv_upload_tiers: vec![
                PacingTierConfig { min_items: 0, delay_ms: 1000 },
                PacingTierConfig { min_items: 51, delay_ms: 2000 },
                PacingTierConfig { min_items: 100, delay_ms: 3000 },
            ],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            csv_preview_chars: 500,
        }
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

    pub fn with_address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config.server.host = host.into();
        self.config.server.port = port;
        self
    }

    pub fn with_ytdlp_path(mut self, path: impl Into<String>) -> Self {
        self.config.youtube.ytdlp_path = path.into();
        self
    }

    pub fn with_cookies_file(mut self, path: PathBuf) -> Self {
        self.config.youtube.cookies_file = Some(path);
        self
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.config.youtube.default_languages = languages;
        self
    }

    pub fn with_backends(mut self, backends: Vec<String>) -> Self {
        self.config.transcript.backends = backends;
        self
    }

    pub fn with_retry(mut self, max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        self.config.retry = RetryConfig {
            max_attempts,
            base_delay_ms: base_delay.as_millis() as u64,
            max_delay_ms: max_delay.as_millis() as u64,
        };
        self
    }

    pub fn with_batch_limits(mut self, max_batch_size: usize, max_csv_batch_size: usize) -> Self {
        self.config.server.max_batch_size = max_batch_size;
        self.config.server.max_csv_batch_size = max_csv_batch_size;
        self
    }

    /// Remove all pacing between batch items
    pub fn without_pacing(mut self) -> Self {
        self.config.batch.tiers.clear();
        self.config.batch.csv_upload_tiers.clear();
        self
    }

    pub fn with_subtitle_delays(mut self, manual: Duration, automatic: Duration) -> Self {
        self.config.transcript.manual_delay_ms = manual.as_millis() as u64;
        self.config.transcript.automatic_delay_ms = automatic.as_millis() as u64;
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

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.max_batch_size, 50);
        assert_eq!(config.youtube.default_languages, vec!["ko"]);
        assert_eq!(config.transcript.backends, vec!["captions", "ytdlp"]);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_address("127.0.0.1", 9000)
            .with_languages(vec!["en".to_string()])
            .with_retry(5, Duration::from_millis(10), Duration::from_millis(50))
            .without_pacing()
            .build();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.youtube.default_languages, vec!["en"]);
        assert_eq!(config.retry_policy().max_attempts, 5);
        assert_eq!(config.retry_policy().max_delay, Duration::from_millis(50));
        assert!(config.rate_limit_policy().delay_for(500).is_zero());
        assert!(config.csv_upload_policy().delay_for(500).is_zero());
    }

    #[test]
    fn test_csv_upload_pacing_is_lighter() {
        let config = Config::default();
        let batch = config.rate_limit_policy();
        let upload = config.csv_upload_policy();

        assert_eq!(batch.delay_for(10), Duration::from_secs(2));
        assert_eq!(upload.delay_for(10), Duration::from_secs(1));
        assert_eq!(upload.delay_for(51), Duration::from_secs(2));
        assert_eq!(upload.delay_for(100), Duration::from_secs(3));
        assert_eq!(batch.delay_for(100), Duration::from_secs(5));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let config = ConfigBuilder::new().with_backends(Vec::new()).build();
        assert!(config.validate().is_err());

        let config = ConfigBuilder::new().with_batch_limits(0, 10).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[server]\nport = 9100\n\n[retry]\nmax_attempts = 4\n").unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.base_delay_ms, 1000);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("youtube-extractor.toml");
        let config = ConfigBuilder::new().with_address("127.0.0.1", 8123).build();
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 8123);
        assert_eq!(loaded.batch.tiers.len(), 3);
        assert_eq!(loaded.batch.csv_upload_tiers[0].delay_ms, 1000);
    }

    #[test]
    fn test_missing_cookie_file_is_ignored() {
        let config = ConfigBuilder::new()
            .with_cookies_file(PathBuf::from("/definitely/not/here/cookies.txt"))
            .build();
        assert!(config.cookies_file().is_none());
        assert!(config.summary().contains("Cookie File: none"));
    }

    #[test]
    fn test_parse_language_list() {
        assert_eq!(parse_language_list(" ko, en ,,ja"), vec!["ko", "en", "ja"]);
        assert!(parse_language_list(" , ").is_empty());
    }
}
