//! Intent Account Codec
//!
//! Borsh layout of the settlement program's `Intent` account and the byte
//! offsets the scanner filters on.
//!
//! The account is Anchor-encoded: an 8-byte discriminator followed by the
//! Borsh encoding of the fields. `Option<T>` is a one-byte tag plus the payload
//! only when present, so every field after `expiry_ts` moves by 8 bytes
//! depending on whether an expiry was set. The allocated account is always
//! sized for the longest encoding and zero-padded.

use anyhow::{Context, Result};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::hash::hashv;
use solana_sdk::pubkey::Pubkey;

// ============================================================================
// FIELD WIDTHS
// ============================================================================

pub const DISCRIMINATOR_LEN: usize = 8;
const PUBKEY_LEN: usize = 32;
const U64_LEN: usize = 8;
const I64_LEN: usize = 8;
const BOOL_LEN: usize = 1;
const U8_LEN: usize = 1;
const OPTION_TAG_LEN: usize = 1;

// ============================================================================
// LAYOUT
// ============================================================================

/// Offset of the `Option` tag of `expiry_ts` (0 = absent, 1 = present).
///
/// discriminator + owner + intent_id + input_mint + output_mint
/// + input_amount + category + creation_ts
pub const EXPIRY_TAG_OFFSET: usize = DISCRIMINATOR_LEN
    + PUBKEY_LEN
    + U64_LEN
    + PUBKEY_LEN
    + PUBKEY_LEN
    + U64_LEN
    + U64_LEN
    + I64_LEN;

/// Offset of `fulfilled` when `expiry_ts` is `None`.
pub const FULFILLED_OFFSET_WITHOUT_EXPIRY: usize = EXPIRY_TAG_OFFSET + OPTION_TAG_LEN;

/// Offset of `fulfilled` when `expiry_ts` is `Some`.
pub const FULFILLED_OFFSET_WITH_EXPIRY: usize = EXPIRY_TAG_OFFSET + OPTION_TAG_LEN + I64_LEN;

/// Allocated size of an intent account (discriminator + longest encoding).
pub const INTENT_ACCOUNT_SIZE: usize = EXPIRY_TAG_OFFSET
    + (OPTION_TAG_LEN + I64_LEN) // expiry_ts
    + BOOL_LEN // fulfilled
    + (OPTION_TAG_LEN + PUBKEY_LEN) // solver
    + (OPTION_TAG_LEN + U64_LEN) // output_amount_fulfilled
    + (OPTION_TAG_LEN + I64_LEN) // fulfilled_timestamp
    + U8_LEN; // bump

/// Tag byte written for `Option::None`.
pub const OPTION_NONE_TAG: u8 = 0;
/// Tag byte written for `Option::Some`.
pub const OPTION_SOME_TAG: u8 = 1;

/// Returns the offset of the `fulfilled` byte for a record with or without expiry.
pub fn fulfilled_offset(has_expiry: bool) -> usize {
    if has_expiry {
        FULFILLED_OFFSET_WITH_EXPIRY
    } else {
        FULFILLED_OFFSET_WITHOUT_EXPIRY
    }
}

/// Anchor account discriminator: `sha256("account:Intent")[..8]`.
pub fn intent_discriminator() -> [u8; DISCRIMINATOR_LEN] {
    let hash = hashv(&[b"account:Intent"]);
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&hash.to_bytes()[..DISCRIMINATOR_LEN]);
    out
}

// ============================================================================
// RECORD
// ============================================================================

/// Decoded intent record (fields after the discriminator, in wire order).
///
/// `owner` is called `user` by the on-chain program.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct IntentAccount {
    pub owner: Pubkey,
    pub intent_id: u64,
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub input_amount: u64,
    pub category: u64,
    pub creation_ts: i64,
    pub expiry_ts: Option<i64>,
    pub fulfilled: bool,
    pub solver: Option<Pubkey>,
    pub output_amount_fulfilled: Option<u64>,
    pub fulfilled_timestamp: Option<i64>,
    pub bump: u8,
}

impl IntentAccount {
    /// Decodes raw account data (discriminator included).
    ///
    /// Trailing zero padding after the encoded fields is ignored.
    ///
    /// # Returns
    ///
    /// * `Ok(IntentAccount)` - Decoded record
    /// * `Err(anyhow::Error)` - Data too short, wrong discriminator or bad Borsh
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < DISCRIMINATOR_LEN {
            anyhow::bail!("Intent account data too short: {} bytes", data.len());
        }
        let (discriminator, mut body) = data.split_at(DISCRIMINATOR_LEN);
        if discriminator != intent_discriminator() {
            anyhow::bail!("Account discriminator does not match Intent");
        }
        IntentAccount::deserialize(&mut body).context("Failed to decode Intent account")
    }

    /// Encodes the record as allocated on-chain: discriminator, fields, zero padding.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut data = intent_discriminator().to_vec();
        data.extend(borsh::to_vec(self).context("Failed to encode Intent account")?);
        if data.len() > INTENT_ACCOUNT_SIZE {
            anyhow::bail!("Encoded intent exceeds account size: {} bytes", data.len());
        }
        data.resize(INTENT_ACCOUNT_SIZE, 0);
        Ok(data)
    }

    /// True if the record has an expiry strictly before `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.expiry_ts, Some(expiry) if expiry < now)
    }
}

/// An intent record together with its account address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRecord {
    pub address: Pubkey,
    pub account: IntentAccount,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IntentAccount {
        IntentAccount {
            owner: Pubkey::new_from_array([1u8; 32]),
            intent_id: 7,
            input_mint: Pubkey::new_from_array([2u8; 32]),
            output_mint: Pubkey::new_from_array([3u8; 32]),
            input_amount: 1_000,
            category: 0,
            creation_ts: 1_700_000_000,
            expiry_ts: None,
            fulfilled: false,
            solver: None,
            output_amount_fulfilled: None,
            fulfilled_timestamp: None,
            bump: 254,
        }
    }

    #[test]
    fn test_decode_rejects_wrong_discriminator() {
        let mut data = sample().encode().unwrap();
        data[0] ^= 0xff;
        assert!(IntentAccount::decode(&data).is_err());
    }

    #[test]
    fn test_decode_rejects_short_data() {
        assert!(IntentAccount::decode(&[0u8; 4]).is_err());
    }

    #[test]
    fn test_is_expired_boundary() {
        let mut intent = sample();
        intent.expiry_ts = Some(100);
        assert!(intent.is_expired(101));
        assert!(!intent.is_expired(100));
        intent.expiry_ts = None;
        assert!(!intent.is_expired(i64::MAX));
    }
}
