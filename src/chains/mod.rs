//! Chain Access Module
//!
//! Ledger client interface, its RPC implementation, and SPL token helpers.

pub mod ledger;
pub mod rpc;
pub mod token;

// Re-export for convenience
pub use ledger::{AccountFilter, LedgerClient, ProgramAccount, SimulationOutcome};
pub use rpc::RpcLedgerClient;
pub use token::{get_associated_token_address, unpack_token_account};
