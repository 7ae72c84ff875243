//! Intent Scanner
//!
//! Enumerates open intent records owned by the settlement program.
//!
//! The ledger is asked for accounts of the intent record size whose `fulfilled`
//! byte is zero. Because `expiry_ts` is an optional field, `fulfilled` sits at
//! one of two offsets; one query is issued per variant, each pinned to the
//! matching expiry tag. Decoded records are re-checked client-side.

use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::chains::{AccountFilter, LedgerClient};
use crate::program::intent::{
    fulfilled_offset, EXPIRY_TAG_OFFSET, OPTION_NONE_TAG, OPTION_SOME_TAG,
};
use crate::program::{IntentAccount, IntentRecord, INTENT_ACCOUNT_SIZE};

/// Server-side filters selecting unfulfilled intents with or without an expiry.
pub fn open_intent_filters(has_expiry: bool) -> Vec<AccountFilter> {
    let expiry_tag = if has_expiry { OPTION_SOME_TAG } else { OPTION_NONE_TAG };
    vec![
        AccountFilter::DataSize(INTENT_ACCOUNT_SIZE as u64),
        AccountFilter::Memcmp {
            offset: EXPIRY_TAG_OFFSET,
            bytes: vec![expiry_tag],
        },
        AccountFilter::Memcmp {
            offset: fulfilled_offset(has_expiry),
            bytes: vec![0],
        },
    ]
}

/// Returns the currently open intents.
///
/// Records that fail to decode are logged and dropped. Records marked fulfilled
/// or expired before `now`, records of the other expiry variant than the query
/// that returned them, and repeated addresses are excluded. Any query failure
/// yields an empty list.
///
/// # Arguments
///
/// * `ledger` - Ledger client
/// * `program_id` - Settlement program id
/// * `now` - Current unix timestamp
pub async fn fetch_open_intents(
    ledger: &dyn LedgerClient,
    program_id: &Pubkey,
    now: i64,
) -> Vec<IntentRecord> {
    let mut raw_accounts = Vec::new();
    for has_expiry in [false, true] {
        match ledger
            .get_program_accounts(program_id, &open_intent_filters(has_expiry))
            .await
        {
            Ok(accounts) => {
                raw_accounts.extend(accounts.into_iter().map(|raw| (has_expiry, raw)))
            }
            Err(e) => {
                warn!("Failed to query open intents (expiry set: {}): {:#}", has_expiry, e);
                return Vec::new();
            }
        }
    }

    let mut seen = HashSet::new();
    let mut intents = Vec::with_capacity(raw_accounts.len());
    for (has_expiry, raw) in raw_accounts {
        let account = match IntentAccount::decode(&raw.data) {
            Ok(account) => account,
            Err(e) => {
                warn!("Dropping undecodable intent account {}: {:#}", raw.pubkey, e);
                continue;
            }
        };

        if account.expiry_ts.is_some() != has_expiry {
            debug!(
                "Intent {} returned for the wrong expiry variant, skipping",
                raw.pubkey
            );
            continue;
        }
        if !seen.insert(raw.pubkey) {
            debug!("Intent {} returned twice, skipping", raw.pubkey);
            continue;
        }

        if account.fulfilled {
            debug!("Intent {} already fulfilled, skipping", raw.pubkey);
            continue;
        }
        if account.is_expired(now) {
            debug!(
                "Intent {} expired at {:?} (now {}), skipping",
                raw.pubkey, account.expiry_ts, now
            );
            continue;
        }

        intents.push(IntentRecord {
            address: raw.pubkey,
            account,
        });
    }

    info!("Found {} open intents", intents.len());
    intents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_pin_fulfilled_offset_to_expiry_variant() {
        let without = open_intent_filters(false);
        let with = open_intent_filters(true);
        assert_eq!(without[0], AccountFilter::DataSize(198));
        assert_eq!(
            without[2],
            AccountFilter::Memcmp { offset: 137, bytes: vec![0] }
        );
        assert_eq!(with[1], AccountFilter::Memcmp { offset: 136, bytes: vec![1] });
        assert_eq!(with[2], AccountFilter::Memcmp { offset: 145, bytes: vec![0] });
    }
}
