use std::fs;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{UpdaterError, UpdaterResult};

/// Default RPC endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.devnet.solana.com";

/// Default signing keypair location
pub const DEFAULT_WALLET_PATH: &str = "~/.config/solana/id.json";

/// Update run configuration, loaded from TOML and overridden by CLI flags
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// RPC endpoint of the Solana cluster
    pub endpoint: String,

    /// Path to the JSON-encoded secret key of the update authority
    pub wallet_path: String,

    /// Maximum number of update instructions per transaction
    pub max_batch_size: usize,

    /// Pause between successful batches in milliseconds
    pub inter_batch_delay_ms: u64,

    /// Per-request RPC timeout in seconds
    pub request_timeout_secs: u64,

    /// Time allowed for the cluster to confirm a submitted transaction
    pub confirm_timeout_secs: u64,

    /// Build instructions without submitting them
    pub dry_run: bool,

    /// Retry configuration for batch submission
    pub retry: RetryConfig,
}

/// Retry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt; `None` retries forever
    pub max_retries: Option<u32>,

    /// Base delay between retries in milliseconds
    pub base_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,

    /// Backoff multiplier, 1.0 keeps the delay fixed
    pub backoff_multiplier: f64,
}

impl UpdaterConfig {
    /// Load and validate configuration from TOML file
    pub fn load(path: &str) -> UpdaterResult<Self> {
        let config = Self::from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without validating it, so overrides can be applied first
    pub fn from_file(path: &str) -> UpdaterResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            UpdaterError::InvalidConfig(format!("Failed to read config file {}: {}", path, e))
        })?;

        let config: UpdaterConfig = toml::from_str(&content).map_err(|e| {
            UpdaterError::InvalidConfig(format!("Failed to parse config file {}: {}", path, e))
        })?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> UpdaterResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| UpdaterError::Serialization(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content).map_err(|e| {
            UpdaterError::InvalidConfig(format!("Failed to write config file {}: {}", path, e))
        })?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> UpdaterResult<()> {
        if self.endpoint.is_empty() {
            return Err(UpdaterError::InvalidConfig("endpoint must not be empty".into()));
        }

        if self.wallet_path.is_empty() {
            return Err(UpdaterError::InvalidConfig("wallet_path must not be empty".into()));
        }

        if self.max_batch_size == 0 {
            return Err(UpdaterError::InvalidConfig(
                "max_batch_size must be greater than 0".into(),
            ));
        }

        if self.request_timeout_secs == 0 || self.confirm_timeout_secs == 0 {
            return Err(UpdaterError::InvalidConfig(
                "timeouts must be greater than 0".into(),
            ));
        }

        self.retry.validate()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }
}

impl RetryConfig {
    /// Validate retry configuration
    fn validate(&self) -> UpdaterResult<()> {
        if self.max_delay_ms < self.base_delay_ms {
            return Err(UpdaterError::InvalidConfig(format!(
                "max_delay_ms ({}) must be greater than or equal to base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }

        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(UpdaterError::InvalidConfig(format!(
                "backoff_multiplier ({}) must be at least 1.0",
                self.backoff_multiplier
            )));
        }

        Ok(())
    }

    /// Calculate delay before retry number `attempt` (zero-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        if attempt == 0 {
            return self.base_delay_ms;
        }

        let exponential_delay =
            self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        (exponential_delay as u64).min(self.max_delay_ms)
    }

    /// Whether another attempt is allowed after `failed_attempts` failures
    pub fn allows_retry(&self, failed_attempts: u32) -> bool {
        match self.max_retries {
            Some(max) => failed_attempts <= max,
            None => true,
        }
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            wallet_path: DEFAULT_WALLET_PATH.to_string(),
            max_batch_size: 10,
            inter_batch_delay_ms: 1,
            request_timeout_secs: 30,
            confirm_timeout_secs: 120,
            dry_run: false,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            base_delay_ms: 100,
            max_delay_ms: 30_000,
            backoff_multiplier: 1.0,
        }
    }
}
