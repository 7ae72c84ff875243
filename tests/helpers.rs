//! Shared test helpers for solver tests
//!
//! In-memory fakes of the ledger, the aggregator and the clock, plus intent and
//! token account fixtures. Every fake call is appended to a shared event log so
//! tests can assert ordering across collaborators.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use intent_solver::aggregator_client::{Quote, QuoteRequest, SwapAggregator, SwapInstructions};
use intent_solver::chains::{
    get_associated_token_address, AccountFilter, LedgerClient, ProgramAccount, SimulationOutcome,
};
use intent_solver::context::SolverContext;
use intent_solver::program::{intent_authority_pda, intent_pda, IntentAccount, IntentRecord};
use intent_solver::service::scheduler::Clock;
use solana_program::program_option::COption;
use solana_program::program_pack::Pack;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::transaction::Transaction;
use spl_token::state::{Account as TokenAccount, AccountState, Mint};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Fixed "now" used by scans (unix seconds)
pub const NOW: i64 = 1_750_000_000;

pub const INPUT_DECIMALS: u8 = 9;
pub const OUTPUT_DECIMALS: u8 = 6;

pub fn program_id() -> Pubkey {
    Pubkey::new_from_array([0x11; 32])
}

pub fn owner() -> Pubkey {
    Pubkey::new_from_array([0x22; 32])
}

pub fn input_mint() -> Pubkey {
    Pubkey::new_from_array([0x33; 32])
}

pub fn output_mint() -> Pubkey {
    Pubkey::new_from_array([0x44; 32])
}

/// Program ids the fake aggregator uses for each instruction group.
pub fn compute_budget_program() -> Pubkey {
    Pubkey::new_from_array([0xc1; 32])
}

pub fn setup_program() -> Pubkey {
    Pubkey::new_from_array([0xc2; 32])
}

pub fn swap_program() -> Pubkey {
    Pubkey::new_from_array([0xc3; 32])
}

pub fn cleanup_program() -> Pubkey {
    Pubkey::new_from_array([0xc4; 32])
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Open intent of `owner()` selling `input_amount` of `input_mint()`.
pub fn intent_account(intent_id: u64, input_amount: u64, expiry_ts: Option<i64>) -> IntentAccount {
    let (_, bump) = intent_pda(&program_id(), &owner(), intent_id);
    IntentAccount {
        owner: owner(),
        intent_id,
        input_mint: input_mint(),
        output_mint: output_mint(),
        input_amount,
        category: 0,
        creation_ts: NOW - 600,
        expiry_ts,
        fulfilled: false,
        solver: None,
        output_amount_fulfilled: None,
        fulfilled_timestamp: None,
        bump,
    }
}

/// Marks an account fulfilled the way the program does.
pub fn fulfilled(mut account: IntentAccount, solver: Pubkey) -> IntentAccount {
    account.fulfilled = true;
    account.solver = Some(solver);
    account.output_amount_fulfilled = Some(1);
    account.fulfilled_timestamp = Some(NOW - 10);
    account
}

pub fn intent_record(account: IntentAccount) -> IntentRecord {
    let (address, _) = intent_pda(&program_id(), &account.owner, account.intent_id);
    IntentRecord { address, account }
}

pub fn program_account(account: &IntentAccount) -> ProgramAccount {
    let (pubkey, _) = intent_pda(&program_id(), &account.owner, account.intent_id);
    ProgramAccount {
        pubkey,
        data: account.encode().expect("encode intent"),
    }
}

/// Token account of `owner` for `mint` with the given delegation.
pub fn token_account(
    owner: &Pubkey,
    mint: &Pubkey,
    delegate: Option<Pubkey>,
    delegated_amount: u64,
) -> Vec<u8> {
    let account = TokenAccount {
        mint: *mint,
        owner: *owner,
        amount: delegated_amount,
        delegate: delegate.map(COption::Some).unwrap_or(COption::None),
        state: AccountState::Initialized,
        is_native: COption::None,
        delegated_amount,
        close_authority: COption::None,
    };
    let mut data = vec![0u8; TokenAccount::LEN];
    TokenAccount::pack(account, &mut data).expect("pack token account");
    data
}

/// Initialized mint with the given decimals.
pub fn mint_account(decimals: u8) -> Vec<u8> {
    let mint = Mint {
        mint_authority: COption::None,
        supply: 0,
        decimals,
        is_initialized: true,
        freeze_authority: COption::None,
    };
    let mut data = vec![0u8; Mint::LEN];
    Mint::pack(mint, &mut data).expect("pack mint");
    data
}

pub fn authority() -> Pubkey {
    intent_authority_pda(&program_id())
}

// ============================================================================
// EVENT LOG
// ============================================================================

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn new_event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

fn record(events: &EventLog, event: String) {
    events.lock().unwrap().push(event);
}

pub fn events_of(events: &EventLog) -> Vec<String> {
    events.lock().unwrap().clone()
}

// ============================================================================
// FAKE LEDGER
// ============================================================================

pub struct FakeLedger {
    events: EventLog,
    /// Accounts served by `get_account_data`
    pub accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    /// Accounts owned by the program, served through filters
    pub program_accounts: Mutex<Vec<ProgramAccount>>,
    /// Return program accounts without applying filters (stale node)
    pub ignore_filters: AtomicBool,
    pub fail_program_accounts: AtomicBool,
    pub simulation: Mutex<SimulationOutcome>,
    pub fail_send: AtomicBool,
    pub fail_confirm: AtomicBool,
    pub executable: AtomicBool,
    pub filters_seen: Mutex<Vec<Vec<AccountFilter>>>,
    pub simulated: Mutex<Vec<Transaction>>,
    pub sent: Mutex<Vec<Transaction>>,
}

impl FakeLedger {
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            accounts: Mutex::new(HashMap::new()),
            program_accounts: Mutex::new(Vec::new()),
            ignore_filters: AtomicBool::new(false),
            fail_program_accounts: AtomicBool::new(false),
            simulation: Mutex::new(SimulationOutcome::default()),
            fail_send: AtomicBool::new(false),
            fail_confirm: AtomicBool::new(false),
            executable: AtomicBool::new(true),
            filters_seen: Mutex::new(Vec::new()),
            simulated: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_account(&self, pubkey: Pubkey, data: Vec<u8>) {
        self.accounts.lock().unwrap().insert(pubkey, data);
    }

    pub fn add_intent(&self, account: &IntentAccount) {
        self.program_accounts.lock().unwrap().push(program_account(account));
    }

    /// Seeds both mints and a valid delegation covering `delegated_amount`.
    pub fn seed_market(&self, delegated_amount: u64) {
        self.set_account(input_mint(), mint_account(INPUT_DECIMALS));
        self.set_account(output_mint(), mint_account(OUTPUT_DECIMALS));
        self.set_account(
            get_associated_token_address(&owner(), &input_mint()),
            token_account(&owner(), &input_mint(), Some(authority()), delegated_amount),
        );
    }

    pub fn fail_simulation(&self, err: serde_json::Value, logs: Vec<String>) {
        *self.simulation.lock().unwrap() = SimulationOutcome {
            err: Some(err),
            logs,
            units_consumed: None,
        };
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<ProgramAccount>> {
        record(&self.events, format!("program_accounts:{}", program_id));
        self.filters_seen.lock().unwrap().push(filters.to_vec());
        if self.fail_program_accounts.load(Ordering::SeqCst) {
            anyhow::bail!("RPC unavailable");
        }
        let ignore = self.ignore_filters.load(Ordering::SeqCst);
        Ok(self
            .program_accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|account| ignore || filters.iter().all(|f| f.matches(&account.data)))
            .cloned()
            .collect())
    }

    async fn get_account_data(&self, pubkey: &Pubkey) -> Result<Option<Vec<u8>>> {
        record(&self.events, format!("account:{}", pubkey));
        Ok(self.accounts.lock().unwrap().get(pubkey).cloned())
    }

    async fn is_executable(&self, _pubkey: &Pubkey) -> Result<bool> {
        Ok(self.executable.load(Ordering::SeqCst))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        record(&self.events, "blockhash".to_string());
        Ok(Hash::new_from_array([7u8; 32]))
    }

    async fn simulate_transaction(&self, transaction: &Transaction) -> Result<SimulationOutcome> {
        record(&self.events, "simulate".to_string());
        self.simulated.lock().unwrap().push(transaction.clone());
        Ok(self.simulation.lock().unwrap().clone())
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        record(&self.events, "send".to_string());
        if self.fail_send.load(Ordering::SeqCst) {
            anyhow::bail!("send rejected");
        }
        self.sent.lock().unwrap().push(transaction.clone());
        Ok(transaction.signatures[0])
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<()> {
        record(&self.events, "confirm".to_string());
        if self.fail_confirm.load(Ordering::SeqCst) {
            anyhow::bail!("transaction {} failed on-chain", signature);
        }
        Ok(())
    }
}

// ============================================================================
// FAKE AGGREGATOR
// ============================================================================

pub struct FakeAggregator {
    events: EventLog,
    /// Output returned by `quote`; `None` makes `quote` fail
    pub out_amount: Mutex<Option<i128>>,
    /// Overrides the in_amount echoed back by `quote`
    pub in_amount_override: Mutex<Option<u64>>,
    pub fail_swap_instructions: AtomicBool,
    pub quote_requests: Mutex<Vec<QuoteRequest>>,
    pub executors: Mutex<Vec<Pubkey>>,
}

impl FakeAggregator {
    pub fn new(events: EventLog, out_amount: Option<i128>) -> Self {
        Self {
            events,
            out_amount: Mutex::new(out_amount),
            in_amount_override: Mutex::new(None),
            fail_swap_instructions: AtomicBool::new(false),
            quote_requests: Mutex::new(Vec::new()),
            executors: Mutex::new(Vec::new()),
        }
    }

    pub fn quote_count(&self) -> usize {
        self.quote_requests.lock().unwrap().len()
    }
}

fn marker_instruction(program_id: Pubkey, tag: u8) -> Instruction {
    Instruction {
        program_id,
        accounts: vec![],
        data: vec![tag],
    }
}

#[async_trait]
impl SwapAggregator for FakeAggregator {
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote> {
        record(&self.events, format!("quote:{}", request.amount));
        self.quote_requests.lock().unwrap().push(request.clone());
        let out_amount = self
            .out_amount
            .lock()
            .unwrap()
            .ok_or_else(|| anyhow::anyhow!("no route found"))?;
        let in_amount = self.in_amount_override.lock().unwrap().unwrap_or(request.amount);
        Ok(Quote::new(
            request.input_mint,
            request.output_mint,
            in_amount,
            out_amount,
            request.slippage_bps,
            serde_json::json!({ "inAmount": in_amount.to_string(), "outAmount": out_amount.to_string() }),
        ))
    }

    async fn swap_instructions(&self, quote: Quote, executor: &Pubkey) -> Result<SwapInstructions> {
        record(&self.events, format!("swap:{}", quote.in_amount));
        self.executors.lock().unwrap().push(*executor);
        if self.fail_swap_instructions.load(Ordering::SeqCst) {
            anyhow::bail!("route expired");
        }
        Ok(SwapInstructions {
            compute_budget: vec![
                marker_instruction(compute_budget_program(), 1),
                marker_instruction(compute_budget_program(), 2),
            ],
            setup: vec![marker_instruction(setup_program(), 3)],
            swap: Instruction {
                program_id: swap_program(),
                accounts: vec![AccountMeta::new(*executor, true)],
                data: vec![4],
            },
            cleanup: vec![marker_instruction(cleanup_program(), 5)],
            address_lookup_tables: vec![],
        })
    }
}

// ============================================================================
// MANUAL CLOCK
// ============================================================================

pub struct ManualClock {
    events: EventLog,
    pub now: Mutex<i64>,
    pub fail_now: AtomicBool,
    pub sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(events: EventLog, now: i64) -> Self {
        Self {
            events,
            now: Mutex::new(now),
            fail_now: AtomicBool::new(false),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn unix_timestamp(&self) -> Result<i64> {
        if self.fail_now.load(Ordering::SeqCst) {
            anyhow::bail!("clock unavailable");
        }
        Ok(*self.now.lock().unwrap())
    }

    async fn sleep(&self, duration: Duration) {
        record(&self.events, format!("sleep:{}", duration.as_millis()));
        self.sleeps.lock().unwrap().push(duration);
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// A solver context wired to the given fakes with a 1% margin.
pub fn test_context(ledger: Arc<FakeLedger>, aggregator: Arc<FakeAggregator>) -> SolverContext {
    SolverContext::new(program_id(), Keypair::new(), ledger, aggregator, 1, 100)
}
