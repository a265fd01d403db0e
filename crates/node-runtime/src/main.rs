//! # Ledger-Accord Node Runtime
//!
//! Starts every configured party in-process, runs one agreement from the
//! first party to the second, and prints both stores' copies.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file, then `LA_*` environment overrides)
//! 2. Install logging
//! 3. Start parties and run the agreement
//! 4. Exit non-zero if the two copies differ

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use node_runtime::{init_telemetry, run_demo, NodeConfig};

/// Ledger-Accord node runtime
#[derive(Parser, Debug)]
#[command(name = "node-runtime")]
#[command(about = "Run a two-party state agreement in-process")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Payload of the agreed record
    #[arg(short, long, default_value = "Data")]
    payload: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = NodeConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    init_telemetry(&config.logging).context("Failed to initialize logging")?;

    info!(
        parties = config.network.parties.len(),
        storage = ?config.storage.backend,
        "Ledger-Accord node runtime starting"
    );

    let report = run_demo(config, &args.payload).await?;

    println!("linear_id: {}", report.linear_id);
    for (party, record) in &report.views {
        let json = serde_json::to_string_pretty(record).context("Failed to render record")?;
        println!("{}:\n{}", party, json);
    }

    if report.converged() {
        info!(linear_id = %report.linear_id, "Stores converged");
        Ok(ExitCode::SUCCESS)
    } else {
        error!(linear_id = %report.linear_id, "Stores diverged");
        Ok(ExitCode::FAILURE)
    }
}
