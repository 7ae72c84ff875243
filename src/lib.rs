//! Intent solver library
//!
//! Discovers open swap intents on the settlement program, prices them through a
//! swap aggregator, and settles profitable ones atomically.

pub mod aggregator_client;
pub mod chains;
pub mod config;
pub mod context;
pub mod program;
pub mod service;

// Re-export public types for convenience
pub use aggregator_client::{JupiterClient, Quote, QuoteRequest, SwapAggregator, SwapInstructions};
pub use chains::{LedgerClient, RpcLedgerClient};
pub use config::SolverConfig;
pub use context::SolverContext;
pub use program::{IntentAccount, IntentRecord};
pub use service::{IntentOutcome, Scheduler, SchedulerSettings, SystemClock};
