//! Swap Aggregator Client
//!
//! HTTP client for the Jupiter swap aggregator. Provides exact-in quotes and the
//! executable instruction groups for a quoted route.
//!
//! A [`Quote`] is consumed by [`SwapAggregator::swap_instructions`]; it cannot be
//! cloned, so a failed settlement has to request a fresh one.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AggregatorConfig;

// ============================================================================
// QUOTE
// ============================================================================

/// Parameters of an exact-in quote request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    /// Exact input amount in the input mint's smallest unit
    pub amount: u64,
    pub slippage_bps: u16,
    pub restrict_intermediate_tokens: bool,
}

/// A priced route for one exchange. Single use.
#[derive(Debug)]
pub struct Quote {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub in_amount: u64,
    /// Expected total output in the output mint's smallest unit
    pub out_amount: i128,
    pub slippage_bps: u16,
    /// Raw quote response, echoed back when requesting instructions
    route: serde_json::Value,
}

impl Quote {
    pub fn new(
        input_mint: Pubkey,
        output_mint: Pubkey,
        in_amount: u64,
        out_amount: i128,
        slippage_bps: u16,
        route: serde_json::Value,
    ) -> Self {
        Self {
            input_mint,
            output_mint,
            in_amount,
            out_amount,
            slippage_bps,
            route,
        }
    }

    /// The opaque route description the aggregator returned.
    pub fn route(&self) -> &serde_json::Value {
        &self.route
    }

    /// Parses an aggregator quote response body.
    ///
    /// # Returns
    ///
    /// * `Ok(Quote)` - Parsed quote keeping the full body as the route description
    /// * `Err(anyhow::Error)` - Missing or malformed mint/amount fields
    pub fn from_response(route: serde_json::Value) -> Result<Self> {
        let fields: QuoteFields =
            serde_json::from_value(route.clone()).context("Malformed quote response")?;

        Ok(Self {
            input_mint: Pubkey::from_str(&fields.input_mint).context("Invalid inputMint in quote")?,
            output_mint: Pubkey::from_str(&fields.output_mint)
                .context("Invalid outputMint in quote")?,
            in_amount: fields.in_amount.parse().context("Invalid inAmount in quote")?,
            out_amount: fields.out_amount.parse().context("Invalid outAmount in quote")?,
            slippage_bps: fields.slippage_bps,
            route,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteFields {
    input_mint: String,
    output_mint: String,
    in_amount: String,
    out_amount: String,
    #[serde(default)]
    slippage_bps: u16,
}

// ============================================================================
// SWAP INSTRUCTIONS
// ============================================================================

/// Instruction groups for executing a quoted route.
#[derive(Debug, Clone)]
pub struct SwapInstructions {
    pub compute_budget: Vec<Instruction>,
    pub setup: Vec<Instruction>,
    pub swap: Instruction,
    pub cleanup: Vec<Instruction>,
    /// Lookup tables the route was built for (unused by legacy transactions)
    pub address_lookup_tables: Vec<Pubkey>,
}

impl SwapInstructions {
    /// Flattens the groups in execution order: compute budget, setup, swap, cleanup.
    pub fn into_ordered(self) -> Vec<Instruction> {
        let mut instructions = self.compute_budget;
        instructions.extend(self.setup);
        instructions.push(self.swap);
        instructions.extend(self.cleanup);
        instructions
    }
}

/// Generic instruction descriptor as returned by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionDescriptor {
    pub program_id: String,
    pub accounts: Vec<AccountDescriptor>,
    /// Base64-encoded instruction data
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDescriptor {
    pub pubkey: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl InstructionDescriptor {
    /// Converts to a native instruction.
    pub fn to_instruction(&self) -> Result<Instruction> {
        let program_id = Pubkey::from_str(&self.program_id)
            .with_context(|| format!("Invalid instruction programId {}", self.program_id))?;
        let accounts = self
            .accounts
            .iter()
            .map(|meta| {
                let pubkey = Pubkey::from_str(&meta.pubkey)
                    .with_context(|| format!("Invalid account pubkey {}", meta.pubkey))?;
                Ok(AccountMeta {
                    pubkey,
                    is_signer: meta.is_signer,
                    is_writable: meta.is_writable,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let data = STANDARD
            .decode(&self.data)
            .context("Invalid base64 instruction data")?;

        Ok(Instruction {
            program_id,
            accounts,
            data,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapInstructionsResponse {
    #[serde(default)]
    compute_budget_instructions: Vec<InstructionDescriptor>,
    #[serde(default)]
    setup_instructions: Vec<InstructionDescriptor>,
    swap_instruction: InstructionDescriptor,
    #[serde(default)]
    cleanup_instruction: Option<InstructionDescriptor>,
    #[serde(default)]
    address_lookup_table_addresses: Vec<String>,
}

/// Decodes a swap-instructions response body into native instruction groups.
///
/// # Returns
///
/// * `Ok(SwapInstructions)` - Decoded groups
/// * `Err(anyhow::Error)` - Missing swap instruction or malformed descriptor
pub fn decode_swap_instructions(body: serde_json::Value) -> Result<SwapInstructions> {
    let response: SwapInstructionsResponse =
        serde_json::from_value(body).context("Malformed swap-instructions response")?;

    let decode_all = |group: &[InstructionDescriptor], name: &str| {
        group
            .iter()
            .map(InstructionDescriptor::to_instruction)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Failed to decode {} instructions", name))
    };

    let address_lookup_tables = response
        .address_lookup_table_addresses
        .iter()
        .map(|addr| Pubkey::from_str(addr).context("Invalid lookup table address"))
        .collect::<Result<Vec<_>>>()?;

    Ok(SwapInstructions {
        compute_budget: decode_all(&response.compute_budget_instructions, "compute budget")?,
        setup: decode_all(&response.setup_instructions, "setup")?,
        swap: response
            .swap_instruction
            .to_instruction()
            .context("Failed to decode swap instruction")?,
        cleanup: response
            .cleanup_instruction
            .as_ref()
            .map(InstructionDescriptor::to_instruction)
            .transpose()
            .context("Failed to decode cleanup instruction")?
            .into_iter()
            .collect(),
        address_lookup_tables,
    })
}

// ============================================================================
// AGGREGATOR INTERFACE
// ============================================================================

/// Price and route source for swaps.
#[async_trait]
pub trait SwapAggregator: Send + Sync {
    /// Requests an exact-in quote.
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote>;

    /// Requests executable instructions for `quote`, executed and paid by `executor`.
    async fn swap_instructions(&self, quote: Quote, executor: &Pubkey) -> Result<SwapInstructions>;
}

/// Jupiter HTTP API client.
pub struct JupiterClient {
    /// Base URL of the swap API (e.g., "https://lite-api.jup.ag/swap/v1")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl JupiterClient {
    /// Create a new aggregator client.
    ///
    /// # Arguments
    ///
    /// * `config` - Aggregator configuration
    ///
    /// # Returns
    ///
    /// * `Ok(JupiterClient)` - New client instance
    /// * `Err(anyhow::Error)` - HTTP client could not be built
    pub fn new(config: &AggregatorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .no_proxy()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn read_json(response: reqwest::Response, what: &str) -> Result<serde_json::Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Aggregator {} failed with status {}: {}", what, status, body);
        }
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse aggregator {} response", what))
    }
}

#[async_trait]
impl SwapAggregator for JupiterClient {
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote> {
        let url = format!("{}/quote", self.base_url);
        let amount = request.amount.to_string();
        let slippage = request.slippage_bps.to_string();
        let restrict = request.restrict_intermediate_tokens.to_string();
        let input_mint = request.input_mint.to_string();
        let output_mint = request.output_mint.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("inputMint", input_mint.as_str()),
                ("outputMint", output_mint.as_str()),
                ("amount", amount.as_str()),
                ("slippageBps", slippage.as_str()),
                ("restrictIntermediateTokens", restrict.as_str()),
            ])
            .send()
            .await
            .context("Failed to send GET /quote request")?;

        let body = Self::read_json(response, "quote").await?;
        let quote = Quote::from_response(body)?;
        debug!(
            "Aggregator quote: {} {} -> {} {}",
            quote.in_amount, quote.input_mint, quote.out_amount, quote.output_mint
        );
        Ok(quote)
    }

    async fn swap_instructions(&self, quote: Quote, executor: &Pubkey) -> Result<SwapInstructions> {
        let url = format!("{}/swap-instructions", self.base_url);
        let request = serde_json::json!({
            "quoteResponse": quote.route,
            "userPublicKey": executor.to_string(),
            "dynamicComputeUnitLimit": true,
            "wrapAndUnwrapSol": true,
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send POST /swap-instructions request")?;

        let body = Self::read_json(response, "swap-instructions").await?;
        let instructions = decode_swap_instructions(body)?;
        if !instructions.address_lookup_tables.is_empty() {
            warn!(
                "Aggregator returned {} address lookup tables; legacy transactions cannot use them",
                instructions.address_lookup_tables.len()
            );
        }
        Ok(instructions)
    }
}
