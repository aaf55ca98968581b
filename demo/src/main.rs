//! Custos CRM Reference Adapter — Demo CLI
//!
//! Runs one or all of the three session-security demo scenarios.  Each
//! scenario uses real Custos components (cipher, validator, access log,
//! anomaly detector) wired together with mock capture data.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- capture-replay
//!   cargo run -p demo -- tamper-detection
//!   cargo run -p demo -- abuse-detection

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use custos_ref_crm::scenarios::{abuse_detection, capture_replay, tamper_detection};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Custos — session security for stored browser sessions.
///
/// Each subcommand runs one or all of the three CRM scenarios, demonstrating
/// field encryption, integrity validation, audit logging, and anomaly
/// detection.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Custos CRM reference adapter demo",
    long_about = "Runs Custos demo scenarios showing AES field encryption,\n\
                  integrity validation, access auditing, and abuse detection."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three CRM scenarios in sequence.
    RunAll,
    /// Scenario 1: Capture and Replay (seal, persist, reopen).
    CaptureReplay,
    /// Scenario 2: Tamper Detection (rejection, corruption, stripped envelope).
    TamperDetection,
    /// Scenario 3: Abuse Detection (rate alerts + security report).
    AbuseDetection,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
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

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::CaptureReplay => capture_replay::run_scenario(),
        Command::TamperDetection => tamper_detection::run_scenario(),
        Command::AbuseDetection => abuse_detection::run_scenario(),
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

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> custos_contracts::error::CustosResult<()> {
    capture_replay::run_scenario()?;
    tamper_detection::run_scenario()?;
    abuse_detection::run_scenario()?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Custos — Session Security");
    println!("CRM Reference Demo");
    println!("=========================");
    println!();
    println!("Custos pipeline per stored session:");
    println!("  [1] Validator checks structure, freshness, and limits");
    println!("  [2] Sensitive fields sealed with AES-256-CBC (per-record salt, per-field IV)");
    println!("  [3] Every access audited into a bounded in-memory trail");
    println!("  [4] Anomaly detector scans the trailing window after each append");
    println!("  [5] Security report summarizes posture and recommendations");
    println!();
}
