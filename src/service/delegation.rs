//! Delegation Validator
//!
//! Confirms an intent owner has delegated enough of the input token to the
//! settlement authority for the program to pull it during settlement.

use solana_program::program_option::COption;
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};

use crate::chains::{get_associated_token_address, unpack_token_account, LedgerClient};
use crate::program::IntentRecord;

/// Returns true if the owner's input token account delegates at least
/// `input_amount` to `authority`.
///
/// Never fails: missing or uninitialized accounts, RPC errors, a foreign
/// delegate or an insufficient allowance all return false with a log line.
///
/// # Arguments
///
/// * `ledger` - Ledger client
/// * `intent` - Intent to check
/// * `authority` - Settlement authority PDA
pub async fn check_delegation(
    ledger: &dyn LedgerClient,
    intent: &IntentRecord,
    authority: &Pubkey,
) -> bool {
    let account = &intent.account;
    let holding = get_associated_token_address(&account.owner, &account.input_mint);

    let data = match ledger.get_account_data(&holding).await {
        Ok(Some(data)) => data,
        Ok(None) => {
            warn!(
                "Intent {}: owner input token account {} does not exist",
                intent.address, holding
            );
            return false;
        }
        Err(e) => {
            warn!(
                "Intent {}: failed to fetch owner input token account {}: {:#}",
                intent.address, holding, e
            );
            return false;
        }
    };

    let token_account = match unpack_token_account(&data) {
        Ok(token_account) => token_account,
        Err(e) => {
            warn!(
                "Intent {}: invalid token account {}: {:#}",
                intent.address, holding, e
            );
            return false;
        }
    };

    match token_account.delegate {
        COption::Some(delegate) if delegate == *authority => {}
        COption::Some(delegate) => {
            warn!(
                "Intent {}: delegate mismatch on {} (expected {}, found {})",
                intent.address, holding, authority, delegate
            );
            return false;
        }
        COption::None => {
            warn!("Intent {}: no delegate set on {}", intent.address, holding);
            return false;
        }
    }

    if token_account.delegated_amount < account.input_amount {
        warn!(
            "Intent {}: insufficient delegated amount on {} (required {}, delegated {})",
            intent.address, holding, account.input_amount, token_account.delegated_amount
        );
        return false;
    }

    info!(
        "Intent {}: delegation valid ({} delegated, {} required)",
        intent.address, token_account.delegated_amount, account.input_amount
    );
    true
}
