use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, Command};
use std::path::Path;
use tracing::{error, info};

use board_governance::audit::load_audit_log_from_file;
use board_governance::audit::verify::verify_audit_log_detailed;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("verify-audit-log")
        .version("0.1.0")
        .about("Verify governance audit log integrity")
        .arg(
            Arg::new("log-path")
                .short('l')
                .long("log-path")
                .value_name("PATH")
                .help("Path to audit log file")
                .required(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Suppress output except errors"),
        )
        .get_matches();

    let log_path = matches
        .get_one::<String>("log-path")
        .ok_or_else(|| anyhow!("--log-path is required"))?;
    let verbose = matches.get_flag("verbose");
    let quiet = matches.get_flag("quiet");

    let level = if quiet {
        tracing::Level::ERROR
    } else if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(e) = verify(log_path, verbose) {
        error!("Audit log verification failed: {}", e);
        std::process::exit(1);
    }

    if !quiet {
        println!("✓ Audit log verification completed successfully");
    }
    Ok(())
}

fn verify(log_path: &str, verbose: bool) -> Result<()> {
    info!("Verifying audit log: {}", log_path);

    if !Path::new(log_path).exists() {
        return Err(anyhow!("Audit log file not found: {}", log_path));
    }

    let report = verify_audit_log_detailed(log_path)?;
    if !verbose {
        return Ok(());
    }

    let entries = load_audit_log_from_file(log_path)?;
    println!("\nAudit Log Summary:");
    println!("  Total entries: {}", report.entry_count);
    if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
        println!("  First entry: {}", first.timestamp);
        println!("  Last entry: {}", last.timestamp);
    }
    println!("  Head hash: {}", report.head_hash);

    println!("\nAction distribution:");
    for (action, count) in &report.actions {
        println!("  {}: {}", action, count);
    }
    Ok(())
}
