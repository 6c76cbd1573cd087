use std::process::ExitCode;

use anyhow::Result;
use entrypay::Checkout;

pub async fn pending(checkout: &Checkout) -> Result<ExitCode> {
    match checkout.pending_intent().await? {
        Some(intent) => println!("{}", serde_json::to_string_pretty(&intent)?),
        None => println!("No pending registration"),
    }

    Ok(ExitCode::SUCCESS)
}

pub async fn discard(checkout: &Checkout) -> Result<ExitCode> {
    checkout.discard_pending_intent().await?;
    println!("Pending registration discarded");

    Ok(ExitCode::SUCCESS)
}
