//! Solver Service
//!
//! Headless long-running process: scans the settlement program for open
//! intents and settles the profitable ones.
//!
//! ## Usage
//!
//! ```bash
//! SOLVER_BOT_PRIVATE_KEY=<base58 keypair> cargo run --bin solver -- --config config/solver.toml
//! ```
//!
//! Or set the config path via environment variable:
//!
//! ```bash
//! SOLVER_CONFIG_PATH=config/solver.toml cargo run --bin solver
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use intent_solver::{
    config::SolverConfig,
    context::{load_solver_keypair, SolverContext},
    service::{Scheduler, SchedulerSettings, SystemClock},
};
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "solver")]
#[command(about = "Intent solver - settles profitable swap intents")]
struct Args {
    /// Path to solver configuration file (default: config/solver.toml or SOLVER_CONFIG_PATH env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments first (before initializing logging)
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    info!("Starting Solver Service");

    // Priority: CLI arg > env var > default > environment-only
    let config = match args.config.as_deref() {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            SolverConfig::load_from_path(Some(path))?
        }
        None => SolverConfig::load()?,
    };

    info!("Configuration loaded successfully");
    info!("RPC URL: {}", config.ledger.rpc_url);
    info!("Program ID: {}", config.ledger.program_id);
    info!("Aggregator URL: {}", config.aggregator.base_url);
    info!("Minimum margin: {}%", config.solver.min_margin_percent);
    info!("Scan interval: {}ms", config.service.scan_interval_ms);

    let keypair = load_solver_keypair(&config.solver.private_key_env)
        .context("Solver keypair is required")?;
    let context = SolverContext::from_config(&config, keypair)?;
    info!("Solver address: {}", context.solver());
    info!("Settlement authority: {}", context.authority);

    // The program must be deployed; an unreachable RPC is not fatal here.
    match context.ledger.is_executable(&context.program_id).await {
        Ok(true) => info!("Settlement program {} is deployed", context.program_id),
        Ok(false) => anyhow::bail!(
            "Settlement program {} is not deployed or not executable",
            context.program_id
        ),
        Err(e) => warn!(
            "Could not verify settlement program deployment: {:#}. Continuing",
            e
        ),
    }

    let scheduler = Scheduler::new(
        context,
        SystemClock,
        SchedulerSettings::from(&config.service),
    );

    tokio::select! {
        result = scheduler.run() => {
            if let Err(e) = result {
                error!("Scan loop error: {}", e);
            }
        }

        // Graceful shutdown on Ctrl+C
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal, stopping solver...");
        }
    }

    info!("Solver service stopped");
    Ok(())
}
