//! CLI command implementations.

use crate::{AppContext, RequestArgs};
use pisa_rpc::{parse_success, BalanceRequest, BalancerSession, SessionConfig};
use pisa_tx::{repair_hashes, CostModels, Transaction};
use std::path::Path;
use std::time::Duration;

type Result = std::result::Result<(), Box<dyn std::error::Error>>;

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Inline hex, or the trimmed contents of a file when prefixed with `@`.
fn read_hex_arg(arg: &str) -> std::result::Result<String, Box<dyn std::error::Error>> {
    let raw = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => arg.to_string(),
    };
    let hex_str = raw.trim().to_string();
    hex::decode(&hex_str)?;
    Ok(hex_str)
}

fn build_request(args: &RequestArgs) -> std::result::Result<BalanceRequest, Box<dyn std::error::Error>> {
    let tx_hex = read_hex_arg(&args.tx)?;
    let change = args
        .change_address
        .clone()
        .unwrap_or_else(|| args.wallet_address.clone());
    Ok(BalanceRequest::new(
        args.mode,
        &args.position,
        &args.assets,
        tx_hex,
        args.wallet_address.clone(),
        change,
        args.collateral.as_ref(),
    ))
}

// ─── Commands ───────────────────────────────────────────────────────────────

pub async fn send_request(
    ctx: &AppContext,
    args: &RequestArgs,
    request_timeout: Option<Duration>,
) -> Result {
    let request = build_request(args)?;
    let config = SessionConfig {
        url: ctx.url.clone(),
        connect_timeout: ctx.connect_timeout,
        request_timeout,
    };

    let session = BalancerSession::connect(&config).await?;
    let reply = session.send(&request).await;
    session.close().await;

    let balanced = parse_success(&reply?)?;
    balanced.check_correlation(request.request_id)?;
    log::info!("request {} balanced", request.request_id);
    println!("{}", balanced.balanced_cbor);
    Ok(())
}

pub fn repair(tx_arg: &str, cost_models: &Path) -> Result {
    let tx = Transaction::from_cbor_hex(&read_hex_arg(tx_arg)?)?;
    let models = CostModels::from_json(&std::fs::read_to_string(cost_models)?)?;

    let repaired = repair_hashes(&tx, &models)?;
    if let Some(hash) = repaired.body.script_data_hash() {
        eprintln!("script data hash: {}", hex::encode(hash));
    }
    if let Some(hash) = repaired.body.auxiliary_data_hash() {
        eprintln!("aux data hash:    {}", hex::encode(hash));
    }
    println!("{}", repaired.to_cbor_hex()?);
    Ok(())
}

pub fn preview(args: &RequestArgs) -> Result {
    let request = build_request(args)?;
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}
