//! Layout tests for the intent account codec
//!
//! The scanner filters on raw byte offsets, so these tests pin them against
//! real Borsh encodings instead of trusting the constants.

use intent_solver::program::intent::{
    fulfilled_offset, intent_discriminator, EXPIRY_TAG_OFFSET, FULFILLED_OFFSET_WITHOUT_EXPIRY,
    FULFILLED_OFFSET_WITH_EXPIRY,
};
use intent_solver::program::{IntentAccount, INTENT_ACCOUNT_SIZE};
use solana_sdk::pubkey::Pubkey;

#[path = "helpers.rs"]
mod test_helpers;
use test_helpers::{fulfilled, intent_account, NOW};

/// What is tested: layout constants resolve to 136 / 137 / 145 / 198
/// Why: These are the wire offsets the program's accounts actually use
#[test]
fn test_layout_constants() {
    assert_eq!(EXPIRY_TAG_OFFSET, 136);
    assert_eq!(FULFILLED_OFFSET_WITHOUT_EXPIRY, 137);
    assert_eq!(FULFILLED_OFFSET_WITH_EXPIRY, 145);
    assert_eq!(INTENT_ACCOUNT_SIZE, 198);
    assert_eq!(fulfilled_offset(false), 137);
    assert_eq!(fulfilled_offset(true), 145);
}

/// What is tested: the fulfilled byte sits at 137 when no expiry is set
/// Why: The scanner's memcmp filter must hit the flag, not neighbouring data
#[test]
fn test_fulfilled_offset_without_expiry() {
    let open = intent_account(1, 1_000, None);
    let data = open.encode().unwrap();
    assert_eq!(data.len(), INTENT_ACCOUNT_SIZE);
    assert_eq!(data[EXPIRY_TAG_OFFSET], 0);
    assert_eq!(data[137], 0);

    let done = fulfilled(open, Pubkey::new_unique()).encode().unwrap();
    assert_eq!(done[EXPIRY_TAG_OFFSET], 0);
    assert_eq!(done[137], 1);
}

/// What is tested: the fulfilled byte moves to 145 when an expiry is set
/// Why: Option payloads shift every later field by their width
#[test]
fn test_fulfilled_offset_with_expiry() {
    let open = intent_account(2, 1_000, Some(NOW + 3_600));
    let data = open.encode().unwrap();
    assert_eq!(data[EXPIRY_TAG_OFFSET], 1);
    assert_eq!(
        i64::from_le_bytes(data[137..145].try_into().unwrap()),
        NOW + 3_600
    );
    assert_eq!(data[145], 0);

    let done = fulfilled(open, Pubkey::new_unique()).encode().unwrap();
    assert_eq!(done[145], 1);
}

/// What is tested: the longest encoding fills the account exactly
/// Why: The data-size filter only matches if the allocated size is right
#[test]
fn test_fully_populated_record_fills_account() {
    let mut account = fulfilled(intent_account(3, 5, Some(NOW)), Pubkey::new_unique());
    account.category = u64::MAX;
    let body = borsh::to_vec(&account).unwrap();
    assert_eq!(body.len() + intent_discriminator().len(), INTENT_ACCOUNT_SIZE);
}

/// What is tested: decode(encode(x)) == x for padded accounts
/// Why: Open records are shorter than the allocation and carry zero padding
#[test]
fn test_decode_ignores_trailing_padding() {
    let account = intent_account(4, 77, None);
    let data = account.encode().unwrap();
    assert_eq!(IntentAccount::decode(&data).unwrap(), account);
}
