use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener settings
    pub server: ServerConfig,

    /// Host allowlist and CORS
    pub security: SecurityConfig,

    /// Batch, timeout and rate-limit settings
    pub limits: LimitsConfig,

    /// Upstream YouTube settings
    pub youtube: YoutubeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    /// Verbose logging and direct (proxy-less) upstream access
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Accepted `Host` header values; `*` accepts any
    pub allowed_hosts: Vec<String>,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum number of videos in one batch request
    pub max_batch_size: usize,

    /// Batch items fetched at the same time (1 = sequential)
    pub batch_concurrency: usize,

    /// Bound on each individual upstream call; 0 disables it
    pub upstream_timeout_secs: u64,

    /// Length of the rate-limit window
    pub rate_window_secs: u64,

    /// Requests per client per window
    pub rate_limits: RateLimits,
}

/// Per-route request budgets; 0 disables limiting for the route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimits {
    pub transcript: u32,
    pub languages: u32,
    pub batch: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// Preferred transcript languages, in order
    pub languages: Vec<String>,

    /// Rotating residential proxy, used unless `server.debug` is set
    pub proxy: Option<ProxyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub username: String,

    pub password: String,

    #[serde(default = "default_proxy_url")]
    pub url: String,
}

fn default_proxy_url() -> String {
    "http://p.webshare.io:80".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            debug: false,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: vec!["*".to_string()],
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 10,
            batch_concurrency: 3,
            upstream_timeout_secs: 30,
            rate_window_secs: 60,
            rate_limits: RateLimits::default(),
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            transcript: 20,
            languages: 20,
            batch: 5,
        }
    }
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            proxy: None,
        }
    }
}

impl Config {
    /// Load configuration from file (or defaults) and apply environment overrides
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::config_path(explicit_path)? {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Get configuration file path, if one exists
    fn config_path(explicit_path: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit_path {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            return Ok(Some(path.to_path_buf()));
        }

        // Current directory first for easy local runs
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(Some(local_config));
        }

        Ok(dirs::config_dir()
            .map(|dir| dir.join("transcript-server").join("config.yaml"))
            .filter(|path| path.exists()))
    }

    /// Apply environment-style overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(debug) = lookup("DEBUG") {
            self.server.debug = matches!(debug.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(hosts) = lookup("ALLOWED_HOSTS") {
            self.security.allowed_hosts = split_list(&hosts);
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.security.cors_origins = split_list(&origins);
        }
        if let Some(size) = lookup("MAX_BATCH_SIZE").and_then(|s| s.parse().ok()) {
            self.limits.max_batch_size = size;
        }

        if let (Some(username), Some(password)) = (lookup("PROXY_USERNAME"), lookup("PROXY_PASSWORD")) {
            let url = self
                .youtube
                .proxy
                .as_ref()
                .map(|proxy| proxy.url.clone())
                .unwrap_or_else(default_proxy_url);
            self.youtube.proxy = Some(ProxyConfig {
                username,
                password,
                url,
            });
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_batch_size == 0 {
            anyhow::bail!("limits.max_batch_size must be at least 1");
        }

        if self.limits.batch_concurrency == 0 {
            anyhow::bail!("limits.batch_concurrency must be at least 1");
        }

        if self.youtube.languages.is_empty() {
            anyhow::bail!("youtube.languages must name at least one language");
        }

        if self.limits.rate_window_secs == 0 {
            anyhow::bail!("limits.rate_window_secs must be at least 1");
        }

        Ok(())
    }

    /// Proxy to use for upstream requests, if any
    pub fn active_proxy(&self) -> Option<&ProxyConfig> {
        if self.server.debug {
            return None;
        }
        self.youtube.proxy.as_ref()
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        match self.limits.upstream_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Listen: {}", self.bind_address());
        println!("  Debug: {}", self.server.debug);
        println!("  Allowed Hosts: {}", self.security.allowed_hosts.join(", "));
        println!("  CORS Origins: {}", self.security.cors_origins.join(", "));
        println!("  Max Batch Size: {}", self.limits.max_batch_size);
        println!("  Batch Concurrency: {}", self.limits.batch_concurrency);
        match self.upstream_timeout() {
            Some(timeout) => println!("  Upstream Timeout: {}s", timeout.as_secs()),
            None => println!("  Upstream Timeout: none"),
        }
        println!(
            "  Rate Limits (per {}s): transcript={}, languages={}, batch={}",
            self.limits.rate_window_secs,
            self.limits.rate_limits.transcript,
            self.limits.rate_limits.languages,
            self.limits.rate_limits.batch
        );
        println!("  Languages: {}", self.youtube.languages.join(", "));
        match &self.youtube.proxy {
            Some(proxy) => println!("  Proxy: {} (user {}, password ****)", proxy.url, proxy.username),
            None => println!("  Proxy: none"),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.limits.max_batch_size, 10);
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.upstream_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str(
            "server:\n  port: 9000\nlimits:\n  max_batch_size: 5\n",
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.limits.max_batch_size, 5);
        assert_eq!(config.limits.batch_concurrency, 3);
        assert_eq!(config.youtube.languages, vec!["en"]);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            ("PORT", "8080"),
            ("DEBUG", "true"),
            ("ALLOWED_HOSTS", "example.com, *.example.org"),
            ("CORS_ORIGINS", "https://app.example.com"),
            ("PROXY_USERNAME", "user"),
            ("PROXY_PASSWORD", "secret"),
        ]));

        assert_eq!(config.server.port, 8080);
        assert!(config.server.debug);
        assert_eq!(config.security.allowed_hosts, vec!["example.com", "*.example.org"]);
        assert_eq!(config.security.cors_origins, vec!["https://app.example.com"]);

        let proxy = config.youtube.proxy.as_ref().unwrap();
        assert_eq!(proxy.username, "user");
        assert_eq!(proxy.url, "http://p.webshare.io:80");

        // debug bypasses the proxy
        assert!(config.active_proxy().is_none());
        config.server.debug = false;
        assert!(config.active_proxy().is_some());
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[("PORT", "not-a-port"), ("PROXY_USERNAME", "only-user")]));
        assert_eq!(config.server.port, 8000);
        assert!(config.youtube.proxy.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let mut config = Config::default();
        config.limits.max_batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.limits.batch_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.youtube.languages.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        assert!(Config::load(Some(Path::new("/definitely/not/here.yaml"))).is_err());
    }
}
