//! `settle` command

use crate::cli::SettleArgs;
use crate::config::LedgerConfig;
use crate::core::SettlementEngine;
use crate::io::{load_wallets, save_wallets, write_json};
use crate::store::MemoryWalletStore;
use crate::types::ObjectId;
use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

/// Printed result of a settlement
#[derive(Debug, Serialize)]
struct SettleReport {
    user_id: ObjectId,
    available_balance: Decimal,
    pending_balance: Decimal,
}

pub async fn run(args: &SettleArgs, config: &LedgerConfig, output: &mut dyn Write) -> anyhow::Result<()> {
    let user_id = ObjectId::parse_field("wallet_id", &args.wallet_id)?;

    let wallets = load_wallets(&args.wallets)
        .await
        .context("Failed to load wallets")?;
    let store = Arc::new(MemoryWalletStore::from_wallets(wallets));
    let engine = SettlementEngine::with_max_attempts(store.clone(), config.max_settle_attempts);

    let balances = engine
        .settle_wallet(user_id, Utc::now())
        .await
        .with_context(|| format!("Failed to settle wallet {}", user_id))?;

    write_json(
        &SettleReport {
            user_id,
            available_balance: balances.available,
            pending_balance: balances.pending,
        },
        output,
    )?;

    if args.save {
        save_wallets(&args.wallets, &store.all())
            .await
            .context("Failed to save wallets")?;
    }

    Ok(())
}
