use std::process::ExitCode;

use anyhow::Result;
use entrypay::Checkout;

use crate::EXIT_AMBIGUOUS;

pub async fn recover(checkout: &Checkout) -> Result<ExitCode> {
    let report = checkout.recover_pending_registration().await?;

    println!(
        "Recovered: {}, dropped: {}, skipped: {}, failed: {}",
        report.recovered, report.compensated, report.skipped, report.failed
    );

    if report.failed > 0 {
        return Ok(ExitCode::from(EXIT_AMBIGUOUS));
    }

    Ok(ExitCode::SUCCESS)
}
