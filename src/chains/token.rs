//! SPL Token Helpers
//!
//! Associated token account derivation, SPL token account and mint decoding,
//! and exact ui-amount rendering.

use anyhow::{Context, Result};
use solana_program::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use spl_token::state::{Account as TokenAccount, Mint};

// Well-known program IDs from Solana mainnet/devnet docs.
const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// Returns the associated token account program id.
pub fn associated_token_program_id() -> Pubkey {
    ASSOCIATED_TOKEN_PROGRAM_ID
}

/// Derives the associated token account (ATA) for an owner and mint.
///
/// # Arguments
///
/// * `owner` - Token account owner
/// * `mint` - SPL token mint
///
/// # Returns
///
/// * `Pubkey` - Derived ATA address
pub fn get_associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[owner.as_ref(), spl_token::id().as_ref(), mint.as_ref()],
        &associated_token_program_id(),
    )
    .0
}

/// Decodes an SPL token account.
///
/// # Returns
///
/// * `Ok(TokenAccount)` - Initialized token account
/// * `Err(anyhow::Error)` - Wrong length, malformed or uninitialized
pub fn unpack_token_account(data: &[u8]) -> Result<TokenAccount> {
    TokenAccount::unpack(data).context("Failed to unpack SPL token account")
}

/// Reads the decimal precision of an initialized SPL mint.
pub fn parse_mint_decimals(data: &[u8]) -> Result<u8> {
    let mint = Mint::unpack(data).context("Failed to unpack SPL mint")?;
    Ok(mint.decimals)
}

/// Renders a smallest-unit amount as a decimal string without floating point.
///
/// `format_ui_amount(1_500_000, 6)` is `"1.5"`.
pub fn format_ui_amount(amount: u64, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = 10u128.pow(u32::from(decimals));
    let whole = u128::from(amount) / scale;
    let frac = u128::from(amount) % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = usize::from(decimals));
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
