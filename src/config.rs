//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the solver service.
//! Configuration includes loop timing, ledger connection, aggregator settings and
//! the solver's margin policy.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/solver.toml";

// Environment variables consulted when building or overriding the configuration.
pub const ENV_CONFIG_PATH: &str = "SOLVER_CONFIG_PATH";
pub const ENV_RPC_URL: &str = "SOLANA_RPC_URL";
pub const ENV_PROGRAM_ID: &str = "SOLANA_CONTRACT_PUBLIC_KEY";
pub const ENV_AGGREGATOR_URL: &str = "JUPITER_URL";
pub const ENV_MIN_MARGIN_PERCENT: &str = "SOLVER_MIN_MARGIN_PERCENT";

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all solver service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Loop timing
    #[serde(default)]
    pub service: ServiceConfig,
    /// Ledger connection and settlement program
    pub ledger: LedgerConfig,
    /// Swap aggregator connection
    pub aggregator: AggregatorConfig,
    /// Signing credential location and margin policy
    #[serde(default)]
    pub solver: SolverPolicyConfig,
}

/// Service-level configuration for the scan loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Delay between two scans in milliseconds
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
    /// Delay after a successful settlement before the next intent, in milliseconds
    #[serde(default = "default_settlement_delay_ms")]
    pub settlement_delay_ms: u64,
    /// Delay after a scan-level failure, in milliseconds
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
    /// Intents created before this unix timestamp are ignored
    #[serde(default)]
    pub min_creation_ts: Option<i64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: default_scan_interval_ms(),
            settlement_delay_ms: default_settlement_delay_ms(),
            error_backoff_ms: default_error_backoff_ms(),
            min_creation_ts: None,
        }
    }
}

/// Configuration for the ledger connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint URL
    pub rpc_url: String,
    /// Settlement program id (base58)
    pub program_id: String,
    /// Commitment level for reads, simulation and preflight
    #[serde(default = "default_commitment")]
    pub commitment: String,
    /// Maximum time to wait for a submitted transaction to confirm, in milliseconds
    #[serde(default = "default_confirm_timeout_ms")]
    pub confirm_timeout_ms: u64,
    /// Interval between confirmation status polls, in milliseconds
    #[serde(default = "default_confirm_poll_interval_ms")]
    pub confirm_poll_interval_ms: u64,
}

impl LedgerConfig {
    /// Parses the configured program id.
    pub fn program_pubkey(&self) -> anyhow::Result<Pubkey> {
        Pubkey::from_str(&self.program_id).context("Invalid ledger program_id")
    }

    /// Parses the configured commitment level.
    pub fn commitment_config(&self) -> anyhow::Result<CommitmentConfig> {
        match self.commitment.as_str() {
            "processed" => Ok(CommitmentConfig::processed()),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            other => anyhow::bail!("Unknown commitment level '{}'", other),
        }
    }
}

/// Configuration for the swap aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Aggregator API base URL (e.g., "https://lite-api.jup.ag/swap/v1")
    #[serde(default = "default_aggregator_url")]
    pub base_url: String,
    /// Slippage tolerance in basis points
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u16,
    /// Restrict routes to liquid intermediate tokens
    #[serde(default = "default_true")]
    pub restrict_intermediate_tokens: bool,
}

/// Solver signing and margin configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverPolicyConfig {
    /// Environment variable name containing the solver private key (base58)
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
    /// Minimum share of the route output kept as profit, in percent
    #[serde(default = "default_min_margin_percent")]
    pub min_margin_percent: u8,
}

impl Default for SolverPolicyConfig {
    fn default() -> Self {
        Self {
            private_key_env: default_private_key_env(),
            min_margin_percent: default_min_margin_percent(),
        }
    }
}

fn default_scan_interval_ms() -> u64 {
    15_000
}

fn default_settlement_delay_ms() -> u64 {
    1_000
}

fn default_error_backoff_ms() -> u64 {
    30_000
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_confirm_timeout_ms() -> u64 {
    60_000
}

fn default_confirm_poll_interval_ms() -> u64 {
    1_000
}

fn default_aggregator_url() -> String {
    "https://lite-api.jup.ag/swap/v1".to_string()
}

fn default_slippage_bps() -> u16 {
    100
}

fn default_true() -> bool {
    true
}

fn default_private_key_env() -> String {
    "SOLVER_BOT_PRIVATE_KEY".to_string()
}

fn default_min_margin_percent() -> u8 {
    1
}

// ============================================================================
// LOADING
// ============================================================================

impl SolverConfig {
    /// Loads configuration from a TOML file, falling back to environment variables.
    ///
    /// This function:
    /// 1. Resolves the path (argument, then SOLVER_CONFIG_PATH, then config/solver.toml)
    /// 2. If the file exists, parses it; otherwise builds the config from the environment
    /// 3. Applies environment overrides
    /// 4. Validates the result
    ///
    /// # Arguments
    ///
    /// * `path` - Optional path to config file. If None, uses SOLVER_CONFIG_PATH env var or default.
    ///
    /// # Returns
    ///
    /// * `Ok(SolverConfig)` - Successfully loaded and validated configuration
    /// * `Err(anyhow::Error)` - Unreadable file, missing required settings, or validation failure
    pub fn load_from_path(path: Option<&str>) -> anyhow::Result<Self> {
        let config_path = path
            .map(|p| p.to_string())
            .or_else(|| std::env::var(ENV_CONFIG_PATH).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let env = |key: &str| std::env::var(key).ok();

        let mut config = if std::path::Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file '{}'", config_path))?;
            Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config file '{}'", config_path))?
        } else {
            Self::from_env(env).with_context(|| {
                format!(
                    "Configuration file '{}' not found and environment is incomplete. \
                    Either copy config/solver.template.toml to config/solver.toml \
                    or set {}, {} and {}.",
                    config_path, ENV_RPC_URL, ENV_PROGRAM_ID, ENV_AGGREGATOR_URL
                )
            })?
        };

        config.apply_env_overrides(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from the default location.
    ///
    /// This is equivalent to calling `load_from_path(None)`.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from_path(None)
    }

    /// Parses a TOML document without applying overrides or validation.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Invalid solver configuration TOML")
    }

    /// Builds a configuration purely from environment lookups.
    ///
    /// `SOLANA_RPC_URL`, `SOLANA_CONTRACT_PUBLIC_KEY` and `JUPITER_URL` are required;
    /// everything else takes its default.
    pub fn from_env<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("Missing required environment variable {}", key))
        };

        Ok(Self {
            service: ServiceConfig::default(),
            ledger: LedgerConfig {
                rpc_url: required(ENV_RPC_URL)?,
                program_id: required(ENV_PROGRAM_ID)?,
                commitment: default_commitment(),
                confirm_timeout_ms: default_confirm_timeout_ms(),
                confirm_poll_interval_ms: default_confirm_poll_interval_ms(),
            },
            aggregator: AggregatorConfig {
                base_url: required(ENV_AGGREGATOR_URL)?,
                slippage_bps: default_slippage_bps(),
                restrict_intermediate_tokens: true,
            },
            solver: SolverPolicyConfig::default(),
        })
    }

    /// Applies environment overrides on top of the current values.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Overrides applied
    /// * `Err(anyhow::Error)` - SOLVER_MIN_MARGIN_PERCENT is not an integer
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.ledger.rpc_url = url;
        }
        if let Some(program_id) = lookup(ENV_PROGRAM_ID) {
            self.ledger.program_id = program_id;
        }
        if let Some(url) = lookup(ENV_AGGREGATOR_URL) {
            self.aggregator.base_url = url;
        }
        if let Some(margin) = lookup(ENV_MIN_MARGIN_PERCENT) {
            self.solver.min_margin_percent = margin.trim().parse().with_context(|| {
                format!("{} must be an integer percentage, got '{}'", ENV_MIN_MARGIN_PERCENT, margin)
            })?;
        }
        Ok(())
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// Checks:
    /// - Program id is a valid base58 pubkey
    /// - RPC and aggregator URLs are non-empty
    /// - Margin is at most 100 percent and slippage at most 10000 bps
    /// - Scan interval and confirmation timeout are non-zero
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Configuration is valid
    /// * `Err(anyhow::Error)` - Validation failed with error message
    pub fn validate(&self) -> anyhow::Result<()> {
        self.ledger
            .program_pubkey()
            .map_err(|_| anyhow::anyhow!("Configuration error: ledger.program_id '{}' is not a valid base58 pubkey", self.ledger.program_id))?;

        self.ledger
            .commitment_config()
            .map_err(|e| anyhow::anyhow!("Configuration error: ledger.commitment: {}", e))?;

        if self.ledger.rpc_url.trim().is_empty() {
            anyhow::bail!("Configuration error: ledger.rpc_url must not be empty");
        }
        if self.aggregator.base_url.trim().is_empty() {
            anyhow::bail!("Configuration error: aggregator.base_url must not be empty");
        }
        if self.solver.min_margin_percent > 100 {
            anyhow::bail!(
                "Configuration error: solver.min_margin_percent {} exceeds 100",
                self.solver.min_margin_percent
            );
        }
        if self.aggregator.slippage_bps > 10_000 {
            anyhow::bail!(
                "Configuration error: aggregator.slippage_bps {} exceeds 10000",
                self.aggregator.slippage_bps
            );
        }
        if self.service.scan_interval_ms == 0 {
            anyhow::bail!("Configuration error: service.scan_interval_ms must be greater than zero");
        }
        if self.ledger.confirm_timeout_ms == 0 {
            anyhow::bail!("Configuration error: ledger.confirm_timeout_ms must be greater than zero");
        }

        Ok(())
    }
}
