//! Solana RPC Ledger Client
//!
//! [`LedgerClient`] backed by the nonblocking `solana-client` RPC client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{
    RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSimulateTransactionConfig,
};
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::chains::ledger::{AccountFilter, LedgerClient, ProgramAccount, SimulationOutcome};
use crate::config::LedgerConfig;

/// RPC implementation of [`LedgerClient`].
pub struct RpcLedgerClient {
    rpc_client: RpcClient,
    commitment: CommitmentConfig,
    confirm_timeout: Duration,
    confirm_poll_interval: Duration,
}

impl RpcLedgerClient {
    /// Creates a new RPC ledger client.
    ///
    /// # Arguments
    ///
    /// * `config` - Ledger configuration (endpoint, commitment, confirmation timing)
    ///
    /// # Returns
    ///
    /// * `Ok(RpcLedgerClient)` - Initialized client
    /// * `Err(anyhow::Error)` - Unknown commitment level
    pub fn new(config: &LedgerConfig) -> Result<Self> {
        let commitment = config.commitment_config()?;
        let rpc_client = RpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            Duration::from_secs(30),
            commitment,
        );

        Ok(Self {
            rpc_client,
            commitment,
            confirm_timeout: Duration::from_millis(config.confirm_timeout_ms),
            confirm_poll_interval: Duration::from_millis(config.confirm_poll_interval_ms),
        })
    }

    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>> {
        let response = self
            .rpc_client
            .get_account_with_commitment(pubkey, self.commitment)
            .await
            .with_context(|| format!("Failed to fetch account {}", pubkey))?;
        Ok(response.value)
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<ProgramAccount>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(filters.iter().map(AccountFilter::to_rpc_filter).collect()),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };

        let accounts = self
            .rpc_client
            .get_program_accounts_with_config(program_id, config)
            .await
            .with_context(|| format!("Failed to query accounts of program {}", program_id))?;

        Ok(accounts
            .into_iter()
            .map(|(pubkey, account)| ProgramAccount {
                pubkey,
                data: account.data,
            })
            .collect())
    }

    async fn get_account_data(&self, pubkey: &Pubkey) -> Result<Option<Vec<u8>>> {
        Ok(self.get_account(pubkey).await?.map(|account| account.data))
    }

    async fn is_executable(&self, pubkey: &Pubkey) -> Result<bool> {
        Ok(self
            .get_account(pubkey)
            .await?
            .map(|account| account.executable)
            .unwrap_or(false))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        self.rpc_client
            .get_latest_blockhash()
            .await
            .context("Failed to get latest blockhash")
    }

    async fn simulate_transaction(&self, transaction: &Transaction) -> Result<SimulationOutcome> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: false,
            commitment: Some(self.commitment),
            ..RpcSimulateTransactionConfig::default()
        };
        let result = self
            .rpc_client
            .simulate_transaction_with_config(transaction, config)
            .await
            .context("Failed to simulate transaction")?
            .value;

        let err = result
            .err
            .map(|err| serde_json::to_value(&err))
            .transpose()
            .context("Failed to encode simulation error")?;

        Ok(SimulationOutcome {
            err,
            logs: result.logs.unwrap_or_default(),
            units_consumed: result.units_consumed,
        })
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        self.rpc_client
            .send_transaction(transaction)
            .await
            .context("Failed to send transaction")
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<()> {
        let started = Instant::now();

        loop {
            let statuses = self
                .rpc_client
                .get_signature_statuses(&[*signature])
                .await
                .context("Failed to get signature status")?
                .value;

            if let Some(Some(status)) = statuses.into_iter().next() {
                if let Some(err) = &status.err {
                    anyhow::bail!("Transaction {} failed on-chain: {:?}", signature, err);
                }
                if status.satisfies_commitment(CommitmentConfig::confirmed()) {
                    return Ok(());
                }
                debug!(
                    "Transaction {} status: {:?}",
                    signature, status.confirmation_status
                );
            }

            if started.elapsed() >= self.confirm_timeout {
                anyhow::bail!(
                    "Transaction {} not confirmed within {:?}",
                    signature,
                    self.confirm_timeout
                );
            }
            tokio::time::sleep(self.confirm_poll_interval).await;
        }
    }
}
