//! Settlement Program Module
//!
//! Client-side view of the on-chain intent settlement program: the intent
//! account layout and the instructions/addresses the solver needs.

pub mod instruction;
pub mod intent;

// Re-export for convenience
pub use instruction::{
    fulfill_intent_instruction, intent_authority_pda, intent_pda, FulfillIntentAccounts,
    IntentProgramError,
};
pub use intent::{IntentAccount, IntentRecord, INTENT_ACCOUNT_SIZE};
