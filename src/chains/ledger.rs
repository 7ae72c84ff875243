//! Ledger Client Interface
//!
//! The read/write surface the solver needs from the chain. Production code uses
//! [`crate::chains::RpcLedgerClient`]; tests substitute in-memory fakes.

use anyhow::Result;
use async_trait::async_trait;
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

/// A program-owned account returned by a filtered program account query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramAccount {
    pub pubkey: Pubkey,
    pub data: Vec<u8>,
}

/// Server-side account filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountFilter {
    /// Account data length must equal this value.
    DataSize(u64),
    /// Account data at `offset` must equal `bytes`.
    Memcmp { offset: usize, bytes: Vec<u8> },
}

impl AccountFilter {
    /// Converts to the RPC filter representation (bytes are base58 on the wire).
    pub fn to_rpc_filter(&self) -> RpcFilterType {
        match self {
            AccountFilter::DataSize(size) => RpcFilterType::DataSize(*size),
            AccountFilter::Memcmp { offset, bytes } => {
                RpcFilterType::Memcmp(Memcmp::new_base58_encoded(*offset, bytes))
            }
        }
    }

    /// Returns true if `data` satisfies this filter.
    pub fn matches(&self, data: &[u8]) -> bool {
        match self {
            AccountFilter::DataSize(size) => data.len() as u64 == *size,
            AccountFilter::Memcmp { offset, bytes } => data
                .get(*offset..offset + bytes.len())
                .map(|window| window == bytes.as_slice())
                .unwrap_or(false),
        }
    }
}

/// Result of a transaction dry-run.
#[derive(Debug, Clone, Default)]
pub struct SimulationOutcome {
    /// Transaction error as returned by the node, `None` on success.
    pub err: Option<serde_json::Value>,
    /// Program log lines emitted during simulation.
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

/// Read/write access to chain state and transaction submission.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Returns all accounts owned by `program_id` that satisfy every filter.
    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<ProgramAccount>>;

    /// Returns the raw data of an account, or `None` if it does not exist.
    async fn get_account_data(&self, pubkey: &Pubkey) -> Result<Option<Vec<u8>>>;

    /// Returns true if the account exists and is marked executable.
    async fn is_executable(&self, pubkey: &Pubkey) -> Result<bool>;

    async fn get_latest_blockhash(&self) -> Result<Hash>;

    /// Dry-runs a transaction without signature verification.
    async fn simulate_transaction(&self, transaction: &Transaction) -> Result<SimulationOutcome>;

    /// Submits a signed transaction and returns its signature.
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature>;

    /// Waits until the transaction is confirmed.
    ///
    /// Returns `Err` if it landed with an error or was not confirmed in time.
    async fn confirm_transaction(&self, signature: &Signature) -> Result<()>;
}
