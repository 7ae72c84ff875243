//! Scan Loop Scheduler
//!
//! Drives scanner, delegation check, quoting, profitability and settlement in
//! one sequential loop. Time is read and slept through an injectable [`Clock`].
//!
//! Intents in a scan are handled strictly one after another: the next intent's
//! attempt starts only after the previous one fully finished.

use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

use crate::config::ServiceConfig;
use crate::context::SolverContext;
use crate::program::IntentRecord;
use crate::service::delegation::check_delegation;
use crate::service::profitability::evaluate;
use crate::service::quoting::request_quote;
use crate::service::scanner::fetch_open_intents;
use crate::service::settlement::settle_intent;

// ============================================================================
// CLOCK
// ============================================================================

/// Source of wall-clock time and delays.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current unix timestamp in seconds.
    fn unix_timestamp(&self) -> Result<i64>;

    async fn sleep(&self, duration: Duration);
}

/// System time and tokio timers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn unix_timestamp(&self) -> Result<i64> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("System clock is before the unix epoch")?;
        i64::try_from(elapsed.as_secs()).context("Unix timestamp overflows i64")
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait]
impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn unix_timestamp(&self) -> Result<i64> {
        (**self).unix_timestamp()
    }

    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// What happened to one intent during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    Settled(Signature),
    /// Created before the configured cutoff
    SkippedCreationCutoff,
    SkippedDelegation,
    SkippedNoQuote,
    SkippedUnprofitable,
    SettlementFailed,
}

/// Summary of one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Per-intent outcomes in processing order
    pub outcomes: Vec<(Pubkey, IntentOutcome)>,
    /// Intents whose processing returned an error
    pub errors: Vec<Pubkey>,
}

impl ScanReport {
    pub fn settled(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, IntentOutcome::Settled(_)))
            .count()
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// Loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub scan_interval: Duration,
    pub settlement_delay: Duration,
    pub error_backoff: Duration,
    pub min_creation_ts: Option<i64>,
}

impl From<&ServiceConfig> for SchedulerSettings {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            scan_interval: Duration::from_millis(config.scan_interval_ms),
            settlement_delay: Duration::from_millis(config.settlement_delay_ms),
            error_backoff: Duration::from_millis(config.error_backoff_ms),
            min_creation_ts: config.min_creation_ts,
        }
    }
}

/// The solver's scan loop.
pub struct Scheduler<C: Clock> {
    context: SolverContext,
    clock: C,
    settings: SchedulerSettings,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(context: SolverContext, clock: C, settings: SchedulerSettings) -> Self {
        Self {
            context,
            clock,
            settings,
        }
    }

    pub fn context(&self) -> &SolverContext {
        &self.context
    }

    /// Runs scans forever.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Scan loop started (interval {:?}, backoff {:?})",
            self.settings.scan_interval, self.settings.error_backoff
        );
        loop {
            self.tick().await;
        }
    }

    /// Runs one scan followed by its delay.
    ///
    /// Waits the scan interval after a completed scan and the error backoff
    /// after a failed one.
    pub async fn tick(&self) -> Option<ScanReport> {
        match self.scan_once().await {
            Ok(report) => {
                info!(
                    "Scan complete: {} intents processed, {} settled, {} errors",
                    report.outcomes.len() + report.errors.len(),
                    report.settled(),
                    report.errors.len()
                );
                self.clock.sleep(self.settings.scan_interval).await;
                Some(report)
            }
            Err(e) => {
                error!(
                    "Scan failed: {:#}. Backing off for {:?}",
                    e, self.settings.error_backoff
                );
                self.clock.sleep(self.settings.error_backoff).await;
                None
            }
        }
    }

    /// Scans once and processes every open intent in order.
    ///
    /// # Returns
    ///
    /// * `Ok(ScanReport)` - Scan ran; per-intent failures are recorded in the report
    /// * `Err(anyhow::Error)` - The scan itself could not run
    pub async fn scan_once(&self) -> Result<ScanReport> {
        let now = self.clock.unix_timestamp()?;
        let intents =
            fetch_open_intents(self.context.ledger.as_ref(), &self.context.program_id, now).await;

        let mut report = ScanReport::default();
        for intent in &intents {
            match self.process_intent(intent).await {
                Ok(outcome) => {
                    let settled = matches!(outcome, IntentOutcome::Settled(_));
                    report.outcomes.push((intent.address, outcome));
                    if settled {
                        self.clock.sleep(self.settings.settlement_delay).await;
                    }
                }
                Err(e) => {
                    error!("Intent {}: processing error: {:#}", intent.address, e);
                    report.errors.push(intent.address);
                }
            }
        }
        Ok(report)
    }

    /// Runs the validation, pricing and settlement pipeline for one intent.
    ///
    /// # Returns
    ///
    /// * `Ok(IntentOutcome)` - Where the pipeline stopped
    /// * `Err(anyhow::Error)` - The aggregator answered for a different trade
    pub async fn process_intent(&self, intent: &IntentRecord) -> Result<IntentOutcome> {
        let account = &intent.account;
        info!(
            "Intent {}: evaluating id {} ({} of {} -> {})",
            intent.address,
            account.intent_id,
            account.input_amount,
            account.input_mint,
            account.output_mint
        );

        if let Some(cutoff) = self.settings.min_creation_ts {
            if account.creation_ts < cutoff {
                debug!(
                    "Intent {}: created at {} before cutoff {}, skipping",
                    intent.address, account.creation_ts, cutoff
                );
                return Ok(IntentOutcome::SkippedCreationCutoff);
            }
        }

        if !check_delegation(self.context.ledger.as_ref(), intent, &self.context.authority).await {
            return Ok(IntentOutcome::SkippedDelegation);
        }

        let quote = match request_quote(
            &self.context,
            &account.input_mint,
            &account.output_mint,
            account.input_amount,
        )
        .await
        {
            Some(quote) => quote,
            None => {
                warn!("Intent {}: no quote available", intent.address);
                return Ok(IntentOutcome::SkippedNoQuote);
            }
        };

        if quote.input_mint != account.input_mint
            || quote.output_mint != account.output_mint
            || quote.in_amount != account.input_amount
        {
            anyhow::bail!(
                "Quote does not match intent: {} {} -> {} returned for {} {} -> {}",
                quote.in_amount,
                quote.input_mint,
                quote.output_mint,
                account.input_amount,
                account.input_mint,
                account.output_mint
            );
        }

        let decision = evaluate(quote.out_amount, self.context.min_margin_percent);
        if !decision.profitable {
            info!(
                "Intent {}: not profitable (route output {}, margin {}%)",
                intent.address, quote.out_amount, self.context.min_margin_percent
            );
            return Ok(IntentOutcome::SkippedUnprofitable);
        }
        info!(
            "Intent {}: profitable, sending {} of {} to owner",
            intent.address, decision.send_amount, quote.out_amount
        );

        Ok(
            match settle_intent(&self.context, intent, quote, decision.send_amount).await {
                Some(signature) => IntentOutcome::Settled(signature),
                None => IntentOutcome::SettlementFailed,
            },
        )
    }
}
