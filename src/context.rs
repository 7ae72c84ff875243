//! Solver Context
//!
//! Everything the pipeline needs, constructed once at startup and passed by
//! reference into each stage: ledger and aggregator handles, the signing
//! keypair, the settlement program binding and the policy knobs.

use anyhow::{Context, Result};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::sync::Arc;

use crate::aggregator_client::{JupiterClient, SwapAggregator};
use crate::chains::{LedgerClient, RpcLedgerClient};
use crate::config::SolverConfig;
use crate::program::intent_authority_pda;

/// Process-wide solver state.
pub struct SolverContext {
    /// Settlement program id
    pub program_id: Pubkey,
    /// Settlement authority PDA, derived once from the program id
    pub authority: Pubkey,
    /// Solver signing keypair (fee payer and swap executor)
    pub keypair: Keypair,
    pub ledger: Arc<dyn LedgerClient>,
    pub aggregator: Arc<dyn SwapAggregator>,
    /// Minimum share of the route output kept as profit, in percent
    pub min_margin_percent: u8,
    pub slippage_bps: u16,
    pub restrict_intermediate_tokens: bool,
}

impl SolverContext {
    /// Assembles a context from explicit collaborators.
    pub fn new(
        program_id: Pubkey,
        keypair: Keypair,
        ledger: Arc<dyn LedgerClient>,
        aggregator: Arc<dyn SwapAggregator>,
        min_margin_percent: u8,
        slippage_bps: u16,
    ) -> Self {
        Self {
            program_id,
            authority: intent_authority_pda(&program_id),
            keypair,
            ledger,
            aggregator,
            min_margin_percent,
            slippage_bps,
            restrict_intermediate_tokens: true,
        }
    }

    /// Builds the production context: RPC ledger client and Jupiter aggregator.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated solver configuration
    /// * `keypair` - Solver signing keypair
    ///
    /// # Returns
    ///
    /// * `Ok(SolverContext)` - Ready-to-use context
    /// * `Err(anyhow::Error)` - Invalid program id or HTTP client failure
    pub fn from_config(config: &SolverConfig, keypair: Keypair) -> Result<Self> {
        let program_id = config.ledger.program_pubkey()?;
        let ledger: Arc<dyn LedgerClient> = Arc::new(RpcLedgerClient::new(&config.ledger)?);
        let aggregator: Arc<dyn SwapAggregator> =
            Arc::new(JupiterClient::new(&config.aggregator)?);

        let mut context = Self::new(
            program_id,
            keypair,
            ledger,
            aggregator,
            config.solver.min_margin_percent,
            config.aggregator.slippage_bps,
        );
        context.restrict_intermediate_tokens = config.aggregator.restrict_intermediate_tokens;
        Ok(context)
    }

    /// Solver public key.
    pub fn solver(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

/// Loads the solver keypair from an env var holding a base58 private key.
///
/// # Arguments
///
/// * `env_var` - Name of the environment variable
///
/// # Returns
///
/// * `Ok(Keypair)` - Loaded keypair
/// * `Err(anyhow::Error)` - Missing env var or invalid private key
pub fn load_solver_keypair(env_var: &str) -> Result<Keypair> {
    let private_key_b58 = std::env::var(env_var)
        .with_context(|| format!("Missing solver private key env var: {}", env_var))?;
    keypair_from_base58(private_key_b58.trim())
        .context("Failed to decode solver private key from base58")
}

/// Decodes a base58 private key string into a Keypair.
///
/// Solana private keys are 64 bytes (seed + public key) encoded as base58.
pub fn keypair_from_base58(b58: &str) -> Result<Keypair> {
    let bytes = bs58::decode(b58)
        .into_vec()
        .context("Invalid base58 encoding")?;
    Keypair::try_from(bytes.as_slice()).map_err(|e| anyhow::anyhow!("Invalid keypair bytes: {}", e))
}
