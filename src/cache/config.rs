//! Configuration for the response cache

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the maximum total cost in bytes
pub const ENV_MAX_SIZE_BYTES: &str = "REPLY_CACHE_MAX_SIZE_BYTES";
/// Environment variable holding the maximum tracked-key count
pub const ENV_MAX_KEYS: &str = "REPLY_CACHE_MAX_KEYS";
/// Environment variable holding the default ttl in seconds
pub const ENV_TTL_SECS: &str = "REPLY_CACHE_TTL_SECS";
/// Environment variable holding the ttl jitter factor
pub const ENV_TTL_JITTER: &str = "REPLY_CACHE_TTL_JITTER";

/// Configuration for the response cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum total cost of cached sequences in bytes
    pub max_size_bytes: u64,

    /// Maximum number of keys the store tracks
    pub max_keys: u64,

    /// Time-to-live for entries; `None` keeps entries until evicted or cleared
    pub default_ttl: Option<Duration>,

    /// TTL jitter factor (0.0 - 1.0)
    /// Spreads expiry of entries recorded at the same moment
    pub ttl_jitter: f64,

    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            // 64 MB default
            max_size_bytes: 64 * 1024 * 1024,
            max_keys: 100_000,
            default_ttl: None,
            ttl_jitter: 0.0,
            enable_metrics: true,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_keys == 0 {
            return Err("max_keys must be greater than 0".to_string());
        }

        if self.max_size_bytes == 0 {
            return Err("max_size_bytes must be greater than 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err("ttl_jitter must be between 0.0 and 1.0".to_string());
        }

        if self.default_ttl == Some(Duration::ZERO) {
            return Err("default_ttl must be greater than 0 when set".to_string());
        }

        Ok(())
    }

    /// Calculate the ttl for a new entry with jitter applied
    pub fn ttl_with_jitter(&self) -> Option<Duration> {
        let ttl = self.default_ttl?;
        if self.ttl_jitter == 0.0 {
            return Some(ttl);
        }

        let base_secs = ttl.as_secs_f64();
        let jitter_range = base_secs * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_secs = (base_secs + jitter).max(0.001);

        Some(Duration::from_secs_f64(final_secs))
    }

    /// Load configuration from the environment (and a `.env` file if present)
    ///
    /// Unset variables keep their defaults; malformed values are an error.
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let mut builder = Self::builder();
        if let Some(size) = env_parse::<u64>(ENV_MAX_SIZE_BYTES)? {
            builder = builder.max_size_bytes(size);
        }
        if let Some(keys) = env_parse::<u64>(ENV_MAX_KEYS)? {
            builder = builder.max_keys(keys);
        }
        if let Some(secs) = env_parse::<u64>(ENV_TTL_SECS)? {
            builder = builder.default_ttl(Duration::from_secs(secs));
        }
        if let Some(jitter) = env_parse::<f64>(ENV_TTL_JITTER)? {
            builder = builder.ttl_jitter(jitter);
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>, String> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(None),
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    max_size_bytes: Option<u64>,
    max_keys: Option<u64>,
    default_ttl: Option<Duration>,
    ttl_jitter: Option<f64>,
    enable_metrics: Option<bool>,
}

impl CacheConfigBuilder {
    /// Set maximum cache size in bytes
    pub fn max_size_bytes(mut self, size: u64) -> Self {
        self.max_size_bytes = Some(size);
        self
    }

    /// Set maximum number of tracked keys
    pub fn max_keys(mut self, max: u64) -> Self {
        self.max_keys = Some(max);
        self
    }

    /// Set the time-to-live for entries
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Set TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Enable or disable metrics collection
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            max_size_bytes: self.max_size_bytes.unwrap_or(defaults.max_size_bytes),
            max_keys: self.max_keys.unwrap_or(defaults.max_keys),
            default_ttl: self.default_ttl.or(defaults.default_ttl),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
            enable_metrics: self.enable_metrics.unwrap_or(defaults.enable_metrics),
        }
    }
}

/// Preset configurations for common use cases
impl CacheConfig {
    /// Configuration for memory-constrained clients
    pub fn small() -> Self {
        Self {
            max_size_bytes: 1024 * 1024, // 1 MB
            max_keys: 1_000,
            ..Default::default()
        }
    }

    /// Configuration for clients caching many large replies
    pub fn large() -> Self {
        Self {
            max_size_bytes: 1024 * 1024 * 1024, // 1 GB
            max_keys: 1_000_000,
            ..Default::default()
        }
    }

    /// Configuration for data that changes often on the server
    pub fn short_lived() -> Self {
        Self {
            default_ttl: Some(Duration::from_secs(30)),
            ttl_jitter: 0.1,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.max_size_bytes, 64 * 1024 * 1024);
        assert_eq!(config.max_keys, 100_000);
        assert!(config.default_ttl.is_none());
        assert!(config.enable_metrics);
    }

    #[test]
    fn test_config_validation() {
        let valid_config = CacheConfig::default();
        assert!(valid_config.validate().is_ok());

        let mut invalid_config = CacheConfig::default();
        invalid_config.max_keys = 0;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = CacheConfig::default();
        invalid_config.max_size_bytes = 0;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = CacheConfig::default();
        invalid_config.ttl_jitter = 1.5;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = CacheConfig::default();
        invalid_config.default_ttl = Some(Duration::ZERO);
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::builder()
            .max_size_bytes(1 << 20)
            .max_keys(1000)
            .default_ttl(Duration::from_secs(600))
            .build();

        assert_eq!(config.max_size_bytes, 1 << 20);
        assert_eq!(config.max_keys, 1000);
        assert_eq!(config.default_ttl, Some(Duration::from_secs(600)));
        assert_eq!(config.ttl_jitter, 0.0);
    }

    #[test]
    fn test_ttl_with_jitter() {
        let config = CacheConfig {
            default_ttl: Some(Duration::from_secs(3600)),
            ttl_jitter: 0.1,
            ..Default::default()
        };

        let ttl = config.ttl_with_jitter().unwrap();
        let base_secs = 3600.0;
        let jitter_range = base_secs * 0.1;

        assert!(ttl.as_secs_f64() >= base_secs - jitter_range);
        assert!(ttl.as_secs_f64() <= base_secs + jitter_range);
    }

    #[test]
    fn test_no_ttl_means_no_expiry() {
        let config = CacheConfig::builder().ttl_jitter(0.5).build();
        assert!(config.ttl_with_jitter().is_none());
    }

    #[test]
    fn test_preset_configs() {
        assert_eq!(CacheConfig::small().max_keys, 1_000);
        assert_eq!(CacheConfig::large().max_keys, 1_000_000);
        assert_eq!(
            CacheConfig::short_lived().default_ttl,
            Some(Duration::from_secs(30))
        );
        assert!(CacheConfig::short_lived().validate().is_ok());
    }

    /// Sets variables for one test and restores the previous values on drop
    struct EnvGuard {
        saved: Vec<(&'static str, Option<String>)>,
    }

    impl EnvGuard {
        fn set(vars: &[(&'static str, Option<&str>)]) -> Self {
            let saved = vars
                .iter()
                .map(|(name, _)| (*name, std::env::var(name).ok()))
                .collect();
            for (name, value) in vars {
                match value {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
            }
            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
            }
        }
    }

    #[test]
    #[serial]
    fn test_from_env() {
        let _env = EnvGuard::set(&[
            (ENV_MAX_SIZE_BYTES, None),
            (ENV_MAX_KEYS, Some("250")),
            (ENV_TTL_SECS, Some("12")),
            (ENV_TTL_JITTER, None),
        ]);

        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config.max_keys, 250);
        assert_eq!(config.default_ttl, Some(Duration::from_secs(12)));
        assert_eq!(config.max_size_bytes, CacheConfig::default().max_size_bytes);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_malformed_values() {
        let _env = EnvGuard::set(&[
            (ENV_MAX_SIZE_BYTES, None),
            (ENV_MAX_KEYS, Some("many")),
            (ENV_TTL_SECS, None),
            (ENV_TTL_JITTER, None),
        ]);
        assert!(CacheConfig::from_env().is_err());

        let _env = EnvGuard::set(&[(ENV_MAX_KEYS, None), (ENV_TTL_JITTER, Some("1.5"))]);
        assert!(CacheConfig::from_env().is_err());
    }
}
