//! Intent Status Utility
//!
//! Looks up one intent by owner and id, prints its state and whether its
//! delegation currently allows settlement.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin intent_status -- --owner <base58 pubkey> --intent-id 42
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use intent_solver::{
    chains::{LedgerClient, RpcLedgerClient},
    config::SolverConfig,
    program::{intent_authority_pda, intent_pda, IntentAccount, IntentRecord},
    service::{check_delegation, scheduler::{Clock, SystemClock}},
};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "intent_status")]
#[command(about = "Show the state of a single intent")]
struct Args {
    /// Intent owner (base58)
    #[arg(long)]
    owner: String,
    /// Owner-scoped intent id
    #[arg(long)]
    intent_id: u64,
    /// Path to solver configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt::init();

    let config = SolverConfig::load_from_path(args.config.as_deref())?;
    let program_id = config.ledger.program_pubkey()?;
    let owner = Pubkey::from_str(&args.owner).context("Invalid --owner pubkey")?;
    let ledger = RpcLedgerClient::new(&config.ledger)?;

    let (address, _bump) = intent_pda(&program_id, &owner, args.intent_id);
    let data = ledger
        .get_account_data(&address)
        .await?
        .with_context(|| format!("Intent account {} not found", address))?;
    let account = IntentAccount::decode(&data)?;

    let now = SystemClock.unix_timestamp()?;
    let status = if account.fulfilled {
        "fulfilled"
    } else if account.is_expired(now) {
        "expired"
    } else {
        "open"
    };

    println!("Intent:        {}", address);
    println!("Owner:         {}", account.owner);
    println!("Intent ID:     {}", account.intent_id);
    println!("Input:         {} of {}", account.input_amount, account.input_mint);
    println!("Output mint:   {}", account.output_mint);
    println!("Created:       {}", account.creation_ts);
    match account.expiry_ts {
        Some(expiry) => println!("Expires:       {}", expiry),
        None => println!("Expires:       never"),
    }
    println!("Status:        {}", status);

    if account.fulfilled {
        if let Some(solver) = account.solver {
            println!("Solver:        {}", solver);
        }
        if let Some(amount) = account.output_amount_fulfilled {
            println!("Output paid:   {}", amount);
        }
        if let Some(ts) = account.fulfilled_timestamp {
            println!("Fulfilled at:  {}", ts);
        }
        return Ok(());
    }

    let authority = intent_authority_pda(&program_id);
    let record = IntentRecord { address, account };
    let delegated = check_delegation(&ledger, &record, &authority).await;
    println!("Delegation:    {}", if delegated { "valid" } else { "missing or insufficient" });

    Ok(())
}
