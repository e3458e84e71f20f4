//! Bugmail CLI: file a bug report by email, with attachments published as links.
//!
//! Reads configuration from the environment and `.env` (TO_EMAILS, SMTP_*,
//! CLOUDINARY_*, UPLOAD_*).

use anyhow::Context;
use bugmail_cli::{
    exit_code, init_tracing, into_app_error, log_error, read_attachments, text_arg,
    truncate_string, user_message, ErrorResponse,
};
use bugmail_core::models::BugReport;
use bugmail_core::{AppError, Config};
use bugmail_services::SubmissionService;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "bugmail", about = "Send a structured bug report by email")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload attachments and email the report
    Submit {
        /// Short description of the problem
        #[arg(long)]
        summary: String,
        /// Reproduction steps, one per line
        #[arg(long, required_unless_present = "steps_file")]
        steps: Option<String>,
        /// Read reproduction steps from a file
        #[arg(long, value_name = "PATH")]
        steps_file: Option<PathBuf>,
        /// What should have happened
        #[arg(long)]
        expected: String,
        /// What actually happened
        #[arg(long)]
        actual: String,
        /// Anything else worth knowing
        #[arg(long, default_value = "")]
        notes: String,
        /// Recipient: address book index, address or label
        #[arg(long, default_value = "0")]
        to: String,
        /// Files to attach (repeatable)
        #[arg(long = "attach", value_name = "PATH")]
        attachments: Vec<PathBuf>,
        /// Print the receipt as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the configured recipients
    Recipients {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn json_output(&self) -> bool {
        match self {
            Commands::Submit { json, .. } | Commands::Recipients { json } => *json,
        }
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env().map_err(|e| AppError::Configuration(format!("{:#}", e)))?;

    match cli.command {
        Commands::Recipients { json } => {
            let book = config.address_book();
            if json {
                print_json(&book.entries())?;
            } else {
                println!("{:<5} {:<40} ADDRESS", "INDEX", "LABEL");
                for (i, entry) in book.entries().iter().enumerate() {
                    println!(
                        "{:<5} {:<40} {}",
                        i,
                        truncate_string(&entry.label, 40),
                        entry.address
                    );
                }
            }
        }
        Commands::Submit {
            summary,
            steps,
            steps_file,
            expected,
            actual,
            notes,
            to,
            attachments,
            json,
        } => {
            let report = BugReport {
                summary,
                steps: text_arg(steps, steps_file.as_deref())?,
                expected,
                actual,
                notes,
            };
            let service = SubmissionService::from_config(config)?;
            let attachments = read_attachments(&attachments).await?;

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, cancelling submission");
                    on_signal.cancel();
                }
            });

            let receipt = service.submit(&report, &to, attachments, &cancel).await?;

            if json {
                print_json(&receipt)?;
            } else {
                for warning in receipt.warnings() {
                    eprintln!("warning: {}", warning);
                }
                println!("{}", receipt.success_message());
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let json = cli.command.json_output();
    if let Err(err) = run(cli).await {
        let err = into_app_error(err);
        log_error(&err);
        if !json || print_json(&ErrorResponse::from(&err)).is_err() {
            eprintln!("error: {}", user_message(&err));
        }
        std::process::exit(exit_code(&err));
    }
}
