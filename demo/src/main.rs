//! SEALGATE Demo CLI
//!
//! Runs one or all of the three demo scenarios.  Each scenario wires the
//! real SEALGATE components (route table, signer, validator, nonce store,
//! audit appender, verifier, pruner, scheduler) from one TOML file.
//!
//! The signing secret is read from the variable named by `signing.secret_env`
//! (`SEALGATE_SIGNING_SECRET` in the bundled config).  Without it the demo
//! refuses to start unless `--dev-secret` is given.
//!
//! Usage:
//!   SEALGATE_SIGNING_SECRET=... cargo run -p demo -- run-all
//!   cargo run -p demo -- --dev-secret run-all
//!   cargo run -p demo -- signing
//!   cargo run -p demo -- audit-chain
//!   cargo run -p demo -- --config path/to/sealgate.toml jobs

mod gateway;
mod scenarios;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sealgate_contracts::error::SealgateResult;
use sealgate_policy::SealgateConfig;
use sealgate_signing::SigningSecret;

use scenarios::{audit_chain, jobs, signing};

// ── CLI definition ────────────────────────────────────────────────────────────

/// SEALGATE: signed requests and a tamper-evident audit trail.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "SEALGATE request integrity and audit chain demo",
    long_about = "Runs SEALGATE demo scenarios showing signed-request validation,\n\
                  replay prevention, audit chain verification, and retention pruning."
)]
struct Cli {
    /// TOML configuration file.  Defaults to the bundled demo configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Sign with the built-in development key when the secret variable is unset.
    #[arg(long, global = true)]
    dev_secret: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three scenarios in sequence.
    RunAll,
    /// Scenario 1: signed refund request, replay and forgery rejection.
    Signing,
    /// Scenario 2: audit chain append, prune, and tamper detection.
    AuditChain,
    /// Scenario 3: scheduled verify and prune jobs with graceful shutdown.
    Jobs,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match startup(&cli) {
        Ok((config, secret)) => run(cli.command, &config, &secret).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load the config and the signing secret, failing closed on either.
fn startup(cli: &Cli) -> SealgateResult<(SealgateConfig, SigningSecret)> {
    let config = gateway::load_config(cli.config.as_deref())?;
    let secret = gateway::load_secret(&config, cli.dev_secret)?;
    Ok((config, secret))
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

async fn run(command: Command, config: &SealgateConfig, secret: &SigningSecret) -> SealgateResult<()> {
    match command {
        Command::RunAll => {
            signing::run_scenario(config, secret)?;
            audit_chain::run_scenario(config, secret)?;
            jobs::run_scenario(config, secret).await
        }
        Command::Signing => signing::run_scenario(config, secret),
        Command::AuditChain => audit_chain::run_scenario(config, secret),
        Command::Jobs => jobs::run_scenario(config, secret).await,
    }
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("SEALGATE: Request Integrity & Audit Trail");
    println!("==========================================");
    println!();
    println!("Per protected request:");
    println!("  [1] Route table decides whether the route requires a signature");
    println!("  [2] Algorithm, headers, and timestamp window are checked");
    println!("  [3] HMAC-SHA256 over the canonical request is compared in constant time");
    println!("  [4] The nonce is reserved atomically; a second use is a replay");
    println!("  [5] The outcome is appended to the SHA-256 audit chain");
    println!();
}
