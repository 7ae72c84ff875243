//! Settlement Program Interface
//!
//! Address derivation and instruction building for the intent settlement
//! program, plus its error table for decoding simulation failures.

use solana_sdk::hash::hashv;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk_ids::system_program;

/// Seed of the program-controlled settlement authority.
pub const INTENT_AUTHORITY_SEED: &[u8] = b"intent_authority";
/// Seed prefix of intent record addresses.
pub const INTENT_SEED: &[u8] = b"intent";

/// Derives the settlement authority PDA that users delegate their input tokens to.
pub fn intent_authority_pda(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[INTENT_AUTHORITY_SEED], program_id).0
}

/// Derives the intent record address for `owner` and `intent_id`.
///
/// # Returns
///
/// * `(Pubkey, u8)` - Record address and its bump
pub fn intent_pda(program_id: &Pubkey, owner: &Pubkey, intent_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[INTENT_SEED, owner.as_ref(), &intent_id.to_le_bytes()],
        program_id,
    )
}

/// Anchor instruction discriminator: `sha256("global:<name>")[..8]`.
fn instruction_discriminator(name: &str) -> [u8; 8] {
    let preimage = format!("global:{}", name);
    let hash = hashv(&[preimage.as_bytes()]);
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash.to_bytes()[..8]);
    out
}

/// Accounts referenced by `fulfill_intent`, in wire order.
#[derive(Debug, Clone)]
pub struct FulfillIntentAccounts {
    pub intent: Pubkey,
    pub user: Pubkey,
    pub solver: Pubkey,
    pub intent_authority: Pubkey,
    pub user_input_token_account: Pubkey,
    pub user_output_token_account: Pubkey,
    pub solver_input_token_account: Pubkey,
    pub solver_output_token_account: Pubkey,
}

/// Builds the `fulfill_intent(intent_id, output_amount_to_user)` instruction.
///
/// # Arguments
///
/// * `program_id` - Settlement program id
/// * `accounts` - Account set; token and system program ids are appended here
/// * `intent_id` - Owner-scoped intent identifier
/// * `output_amount_to_user` - Amount of output token forwarded to the owner
pub fn fulfill_intent_instruction(
    program_id: &Pubkey,
    accounts: &FulfillIntentAccounts,
    intent_id: u64,
    output_amount_to_user: u64,
) -> Instruction {
    let mut data = instruction_discriminator("fulfill_intent").to_vec();
    data.extend_from_slice(&intent_id.to_le_bytes());
    data.extend_from_slice(&output_amount_to_user.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(accounts.intent, false),
            AccountMeta::new_readonly(accounts.user, false),
            AccountMeta::new(accounts.solver, true),
            AccountMeta::new_readonly(accounts.intent_authority, false),
            AccountMeta::new(accounts.user_input_token_account, false),
            AccountMeta::new(accounts.user_output_token_account, false),
            AccountMeta::new(accounts.solver_input_token_account, false),
            AccountMeta::new(accounts.solver_output_token_account, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    }
}

// ============================================================================
// PROGRAM ERRORS
// ============================================================================

/// Custom error codes raised by the settlement program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentProgramError {
    Unauthorized,
    IntentAlreadyFulfilled,
    InputMintMismatch,
    OutputMintMismatch,
    UserTokenAccountMismatch,
    SolverTokenAccountMismatch,
    DelegateNotSet,
    InsufficientDelegatedAmount,
    InvalidOutputAmount,
    IntentExpired,
    ExpiryInPast,
    InvalidAuthorityPda,
    UserAccountMismatch,
    BumpMismatch,
}

const ERROR_CODE_OFFSET: u32 = 6000;

const PROGRAM_ERRORS: [IntentProgramError; 14] = [
    IntentProgramError::Unauthorized,
    IntentProgramError::IntentAlreadyFulfilled,
    IntentProgramError::InputMintMismatch,
    IntentProgramError::OutputMintMismatch,
    IntentProgramError::UserTokenAccountMismatch,
    IntentProgramError::SolverTokenAccountMismatch,
    IntentProgramError::DelegateNotSet,
    IntentProgramError::InsufficientDelegatedAmount,
    IntentProgramError::InvalidOutputAmount,
    IntentProgramError::IntentExpired,
    IntentProgramError::ExpiryInPast,
    IntentProgramError::InvalidAuthorityPda,
    IntentProgramError::UserAccountMismatch,
    IntentProgramError::BumpMismatch,
];

impl IntentProgramError {
    /// Maps an Anchor custom error code (6000..=6013) to the program error.
    pub fn from_code(code: u32) -> Option<Self> {
        let index = code.checked_sub(ERROR_CODE_OFFSET)? as usize;
        PROGRAM_ERRORS.get(index).copied()
    }

    pub fn code(self) -> u32 {
        // Discriminant order matches PROGRAM_ERRORS.
        ERROR_CODE_OFFSET + self as u32
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized: Signer is not the intent owner.",
            Self::IntentAlreadyFulfilled => "Intent has already been fulfilled.",
            Self::InputMintMismatch => "Provided token account does not match the intent's input mint.",
            Self::OutputMintMismatch => "Provided token account does not match the intent's output mint.",
            Self::UserTokenAccountMismatch => {
                "Provided user token account owner does not match the intent creator."
            }
            Self::SolverTokenAccountMismatch => {
                "Provided solver token account owner does not match the solver signer."
            }
            Self::DelegateNotSet => {
                "User's input token account does not have delegate set to the program authority."
            }
            Self::InsufficientDelegatedAmount => {
                "User's input token account has insufficient delegated amount."
            }
            Self::InvalidOutputAmount => "Output amount provided by solver must be greater than zero.",
            Self::IntentExpired => "Intent has expired.",
            Self::ExpiryInPast => "Expiry timestamp must be in the future.",
            Self::InvalidAuthorityPda => "Provided authority PDA derived address is incorrect.",
            Self::UserAccountMismatch => {
                "The user AccountInfo provided does not match the user stored in the intent."
            }
            Self::BumpMismatch => "Bump seed mismatch between context and derivation.",
        }
    }
}

impl std::fmt::Display for IntentProgramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} (code {}): {}", self, self.code(), self.message())
    }
}

/// Extracts custom error codes from a simulation error and its program logs.
///
/// Looks at `{"InstructionError": [idx, {"Custom": n}]}` in the error value and at
/// `custom program error: 0x..` lines in the logs. Codes are returned in the order
/// found, without duplicates.
pub fn custom_error_codes(err: &serde_json::Value, logs: &[String]) -> Vec<u32> {
    let mut codes = Vec::new();

    if let Some(code) = err
        .get("InstructionError")
        .and_then(|e| e.get(1))
        .and_then(|detail| detail.get("Custom"))
        .and_then(|c| c.as_u64())
        .and_then(|c| u32::try_from(c).ok())
    {
        codes.push(code);
    }

    const MARKER: &str = "custom program error: 0x";
    for line in logs {
        if let Some(pos) = line.find(MARKER) {
            let hex_digits: String = line[pos + MARKER.len()..]
                .chars()
                .take_while(|c| c.is_ascii_hexdigit())
                .collect();
            if let Ok(code) = u32::from_str_radix(&hex_digits, 16) {
                if !codes.contains(&code) {
                    codes.push(code);
                }
            }
        }
    }

    codes
}
