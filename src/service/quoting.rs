//! Quote Oracle Client
//!
//! Wraps the aggregator quote call with the mint metadata lookups and the
//! "never fail" contract the scan loop relies on.

use anyhow::{Context, Result};
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};

use crate::aggregator_client::{Quote, QuoteRequest};
use crate::chains::token::{format_ui_amount, parse_mint_decimals};
use crate::chains::LedgerClient;
use crate::context::SolverContext;

/// Reads a mint's decimal precision from the ledger.
pub async fn fetch_mint_decimals(ledger: &dyn LedgerClient, mint: &Pubkey) -> Result<u8> {
    let data = ledger
        .get_account_data(mint)
        .await
        .with_context(|| format!("Failed to fetch mint {}", mint))?
        .with_context(|| format!("Mint {} does not exist", mint))?;
    parse_mint_decimals(&data).with_context(|| format!("Invalid mint account {}", mint))
}

/// Requests an exact-in quote for `amount` of `input_mint` into `output_mint`.
///
/// Returns `None` for a zero amount, unreadable mint metadata, or any
/// aggregator error. A quote with a non-positive output is returned as-is.
///
/// # Arguments
///
/// * `context` - Solver context (ledger, aggregator, slippage)
/// * `input_mint` - Mint being sold
/// * `output_mint` - Mint being bought
/// * `amount` - Exact input amount in the smallest unit
pub async fn request_quote(
    context: &SolverContext,
    input_mint: &Pubkey,
    output_mint: &Pubkey,
    amount: u64,
) -> Option<Quote> {
    if amount == 0 {
        warn!("Input amount is zero, skipping quote for {} -> {}", input_mint, output_mint);
        return None;
    }

    let ledger = context.ledger.as_ref();
    let (input_decimals, output_decimals) = match tokio::try_join!(
        fetch_mint_decimals(ledger, input_mint),
        fetch_mint_decimals(ledger, output_mint)
    ) {
        Ok(decimals) => decimals,
        Err(e) => {
            warn!("Failed to read mint decimals for quote: {:#}", e);
            return None;
        }
    };

    let request = QuoteRequest {
        input_mint: *input_mint,
        output_mint: *output_mint,
        amount,
        slippage_bps: context.slippage_bps,
        restrict_intermediate_tokens: context.restrict_intermediate_tokens,
    };

    info!(
        "Requesting quote: {} of {} -> {}",
        format_ui_amount(amount, input_decimals),
        input_mint,
        output_mint
    );

    match context.aggregator.quote(&request).await {
        Ok(quote) => {
            let out_display = u64::try_from(quote.out_amount)
                .map(|out| format_ui_amount(out, output_decimals))
                .unwrap_or_else(|_| quote.out_amount.to_string());
            info!(
                "Quote: {} {} -> {} {}",
                format_ui_amount(quote.in_amount, input_decimals),
                input_mint,
                out_display,
                output_mint
            );
            Some(quote)
        }
        Err(e) => {
            warn!("Quote request failed for {} -> {}: {:#}", input_mint, output_mint, e);
            None
        }
    }
}
