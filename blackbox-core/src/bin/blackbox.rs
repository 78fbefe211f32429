//! Blackbox CLI - Analyze agent flight logs and verify receipt chains
//!
//! Usage:
//!     blackbox analyze run.jsonl --out ./report
//!     blackbox analyze run.jsonl --policy policy.json --profile strict --suggest
//!     blackbox verify ./report/receipts.jsonl

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blackbox_core::{
    ChainVerifier, FlightRecorder, OutputWriter, RecorderConfig, RecorderError,
};

#[derive(Parser, Debug)]
#[command(name = "blackbox")]
#[command(about = "Flight-log analysis and integrity receipts for agent runs")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a JSONL flight log and emit badge + receipts
    Analyze {
        /// Path to the flight log (one JSON event per line)
        input: PathBuf,

        /// Output directory for badge.json, receipts.jsonl, anchor.json
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Overwrite a non-empty output directory
        #[arg(long)]
        overwrite: bool,

        /// Path to a policy.json config file
        #[arg(long)]
        policy: Option<PathBuf>,

        /// Policy profile name (wins over the config's selection)
        #[arg(long)]
        profile: Option<String>,

        /// Comma-separated declared event types (e.g. NET_IO,FILE_IO)
        #[arg(long)]
        declared: Option<String>,

        /// Skip the policy simulation block
        #[arg(long)]
        no_simulate: bool,

        /// Also emit suggestions.json and probe_plan.md
        #[arg(long)]
        suggest: bool,

        /// Hex-encoded HMAC-SHA256 key to sign the anchor
        #[arg(long)]
        anchor_key: Option<String>,
    },

    /// Verify a receipts.jsonl chain
    Verify {
        /// Path to the receipts file
        receipts: PathBuf,

        /// Output the verdict as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blackbox_core=info,blackbox=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(args: Args) -> Result<ExitCode, RecorderError> {
    match args.command {
        Command::Analyze {
            input,
            out,
            overwrite,
            policy,
            profile,
            declared,
            no_simulate,
            suggest,
            anchor_key,
        } => {
            let mut config = RecorderConfig::load(policy.as_deref());
            if let Some(csv) = &declared {
                config = config.with_declared_intents(csv);
            }

            let artifacts = FlightRecorder::new(&config)
                .with_profile_override(profile)
                .with_simulation(!no_simulate)
                .analyze_file(&input)?;

            if let Some(dir) = out {
                OutputWriter::new(&dir)
                    .overwrite(overwrite)
                    .with_suggestions(suggest)
                    .anchor_key_hex(anchor_key.as_deref())?
                    .write(&artifacts, &input.display().to_string())?;
            }

            println!("{}", serde_json::to_string_pretty(&artifacts.badge)?);
            Ok(ExitCode::SUCCESS)
        }

        Command::Verify { receipts, json } => {
            let verification = ChainVerifier::verify_file(&receipts)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&verification)?);
            } else if verification.is_valid {
                println!(
                    "VALID: {} receipts, final hash {}",
                    verification.receipt_count,
                    verification.final_hash.as_deref().unwrap_or("-"),
                );
            } else {
                println!(
                    "INVALID at seq {}: {} ({})",
                    verification
                        .first_invalid_seq
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "?".to_string()),
                    verification.error_message.as_deref().unwrap_or("unknown"),
                    verification
                        .error_type
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                );
            }

            if verification.is_valid {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
