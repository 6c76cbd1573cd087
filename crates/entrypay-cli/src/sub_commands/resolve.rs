use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use entrypay::types::RegistrationSummary;
use entrypay::{CallbackParams, Checkout, TerminalState};

use crate::{EXIT_AMBIGUOUS, EXIT_FAILED};

#[derive(Args)]
pub struct ResolveSubCommand {
    /// Redirect url or its query string
    callback: String,
}

pub async fn resolve(checkout: &Checkout, sub_command_args: &ResolveSubCommand) -> Result<ExitCode> {
    let params: CallbackParams = sub_command_args
        .callback
        .parse()
        .context("Invalid redirect")?;

    println!("Verifying payment...");
    let terminal = checkout.resolve(&params).await;

    Ok(ExitCode::from(render(&terminal)))
}

fn render(state: &TerminalState) -> u8 {
    match state {
        TerminalState::Succeeded(details) => {
            println!("Payment {} confirmed", details.outcome.transaction_id);
            match &details.registration {
                RegistrationSummary::Registered { team, tournament } => {
                    println!(
                        "Team {} (captain {}, {} members) is registered",
                        team.name, team.captain_name, team.member_count
                    );
                    if let Some(tournament) = tournament {
                        println!(
                            "Tournament: {}",
                            tournament.name.as_deref().unwrap_or(&tournament.id)
                        );
                    }
                }
                RegistrationSummary::NotAttempted => {
                    println!("No pending registration for this payment");
                }
            }
            0
        }
        TerminalState::Failed(reason) => {
            println!("{reason}. Start the registration again to retry.");
            EXIT_FAILED
        }
        TerminalState::AmbiguousError(ambiguity) => {
            eprintln!("Could not complete the registration: {ambiguity}");
            eprintln!("Contact support; your registration details were kept.");
            EXIT_AMBIGUOUS
        }
        TerminalState::Resolving => EXIT_AMBIGUOUS,
    }
}
