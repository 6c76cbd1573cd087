use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use entrypay::{Amount, Checkout, TeamForm};

#[derive(Args)]
pub struct InitiateSubCommand {
    /// Tournament to register for
    #[arg(short, long)]
    tournament: String,
    /// Entry fee
    #[arg(short, long)]
    fee: u64,
    /// Team form as json
    team: PathBuf,
}

pub async fn initiate(checkout: &Checkout, sub_command_args: &InitiateSubCommand) -> Result<ExitCode> {
    let raw = fs::read_to_string(&sub_command_args.team)
        .with_context(|| format!("Could not read {}", sub_command_args.team.display()))?;
    let form: TeamForm = serde_json::from_str(&raw).context("Invalid team form")?;

    let handoff = checkout
        .initiate(
            &form,
            &sub_command_args.tournament,
            Amount::from(sub_command_args.fee),
        )
        .await?;

    println!("Transaction: {}", handoff.transaction_id);
    println!("After paying, run `entrypay-cli resolve '<redirect url>'`");

    Ok(ExitCode::SUCCESS)
}
