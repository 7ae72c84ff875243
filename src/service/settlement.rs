//! Settlement Builder/Submitter
//!
//! Builds one transaction that runs the aggregator route from the solver's own
//! token accounts and then calls `fulfill_intent`, which pulls the owner's
//! delegated input and forwards `send_amount` of the output to the owner.
//! Either everything lands or nothing does.
//!
//! Flow:
//! 1. Fetch route instructions for the quote, executed by the solver
//! 2. Flatten them as compute budget, setup, swap, cleanup
//! 3. Derive the authority and the four token accounts
//! 4. Append the settlement instruction
//! 5. Assemble with the solver as fee payer and a fresh blockhash
//! 6. Simulate; abort on error
//! 7. Sign, submit and confirm

use anyhow::{Context, Result};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use tracing::{error, info};

use crate::aggregator_client::Quote;
use crate::chains::get_associated_token_address;
use crate::context::SolverContext;
use crate::program::instruction::custom_error_codes;
use crate::program::{fulfill_intent_instruction, FulfillIntentAccounts, IntentProgramError, IntentRecord};

/// Derives the account set of `fulfill_intent` for `intent` settled by `solver`.
pub fn fulfill_accounts(
    intent: &IntentRecord,
    solver: &Pubkey,
    authority: &Pubkey,
) -> FulfillIntentAccounts {
    let account = &intent.account;
    FulfillIntentAccounts {
        intent: intent.address,
        user: account.owner,
        solver: *solver,
        intent_authority: *authority,
        user_input_token_account: get_associated_token_address(&account.owner, &account.input_mint),
        user_output_token_account: get_associated_token_address(
            &account.owner,
            &account.output_mint,
        ),
        solver_input_token_account: get_associated_token_address(solver, &account.input_mint),
        solver_output_token_account: get_associated_token_address(solver, &account.output_mint),
    }
}

/// Builds the unsigned settlement transaction (steps 1 to 5).
///
/// # Arguments
///
/// * `context` - Solver context
/// * `intent` - Intent being settled
/// * `quote` - Route for the intent's input amount; consumed
/// * `send_amount` - Output amount forwarded to the owner
///
/// # Returns
///
/// * `Ok(Transaction)` - Unsigned transaction with fee payer and blockhash set
/// * `Err(anyhow::Error)` - Route instructions or blockhash unavailable
pub async fn build_settlement_transaction(
    context: &SolverContext,
    intent: &IntentRecord,
    quote: Quote,
    send_amount: u64,
) -> Result<Transaction> {
    let solver = context.solver();

    let swap = context
        .aggregator
        .swap_instructions(quote, &solver)
        .await
        .context("Failed to fetch swap instructions")?;
    let mut instructions = swap.into_ordered();

    let accounts = fulfill_accounts(intent, &solver, &context.authority);
    instructions.push(fulfill_intent_instruction(
        &context.program_id,
        &accounts,
        intent.account.intent_id,
        send_amount,
    ));

    let blockhash = context
        .ledger
        .get_latest_blockhash()
        .await
        .context("Failed to fetch recent blockhash")?;

    let mut transaction = Transaction::new_with_payer(&instructions, Some(&solver));
    transaction.message.recent_blockhash = blockhash;
    Ok(transaction)
}

/// Settles `intent` using `quote`.
///
/// Returns the confirmed transaction signature, or `None` if any step failed.
/// Nothing is submitted when simulation reports an error.
pub async fn settle_intent(
    context: &SolverContext,
    intent: &IntentRecord,
    quote: Quote,
    send_amount: u64,
) -> Option<Signature> {
    match try_settle(context, intent, quote, send_amount).await {
        Ok(signature) => {
            info!("Intent {} settled: {}", intent.address, signature);
            Some(signature)
        }
        Err(e) => {
            error!("Intent {} settlement failed: {:#}", intent.address, e);
            None
        }
    }
}

async fn try_settle(
    context: &SolverContext,
    intent: &IntentRecord,
    quote: Quote,
    send_amount: u64,
) -> Result<Signature> {
    let mut transaction = build_settlement_transaction(context, intent, quote, send_amount).await?;

    let simulation = context
        .ledger
        .simulate_transaction(&transaction)
        .await
        .context("Failed to simulate settlement transaction")?;
    if let Some(err) = &simulation.err {
        log_simulation_failure(intent, err, &simulation.logs);
        anyhow::bail!("Simulation failed: {}", err);
    }
    info!(
        "Intent {}: simulation ok ({} compute units)",
        intent.address,
        simulation
            .units_consumed
            .map(|units| units.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );

    let blockhash = transaction.message.recent_blockhash;
    transaction
        .try_sign(&[&context.keypair], blockhash)
        .context("Failed to sign settlement transaction")?;

    let signature = context
        .ledger
        .send_transaction(&transaction)
        .await
        .context("Failed to submit settlement transaction")?;
    info!("Intent {}: submitted {}", intent.address, signature);

    context
        .ledger
        .confirm_transaction(&signature)
        .await
        .with_context(|| format!("Settlement transaction {} did not confirm", signature))?;

    Ok(signature)
}

fn log_simulation_failure(intent: &IntentRecord, err: &serde_json::Value, logs: &[String]) {
    error!("Intent {}: simulation error: {}", intent.address, err);
    for line in logs {
        error!("Intent {}:   {}", intent.address, line);
    }
    for code in custom_error_codes(err, logs) {
        match IntentProgramError::from_code(code) {
            Some(program_error) => {
                error!("Intent {}: program error {}", intent.address, program_error)
            }
            None => error!("Intent {}: custom program error code {}", intent.address, code),
        }
    }
}
