//! Solver service modules
//!
//! The intent pipeline: scanning, delegation checking, quoting, profitability
//! evaluation, settlement, and the loop that drives them.

pub mod delegation;
pub mod profitability;
pub mod quoting;
pub mod scanner;
pub mod scheduler;
pub mod settlement;

// Re-export for convenience
pub use delegation::check_delegation;
pub use profitability::{evaluate, ProfitDecision};
pub use quoting::request_quote;
pub use scanner::fetch_open_intents;
pub use scheduler::{Clock, IntentOutcome, ScanReport, Scheduler, SchedulerSettings, SystemClock};
pub use settlement::{build_settlement_transaction, settle_intent};
