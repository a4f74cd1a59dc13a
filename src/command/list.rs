//! `list` command

use crate::cli::ListArgs;
use crate::config::LedgerConfig;
use crate::core::{build_filter, Paginator, SettlementEngine};
use crate::io::{load_payouts, load_wallets, save_wallets, write_json};
use crate::store::{MemoryRecordStore, MemoryWalletStore};
use anyhow::Context;
use std::io::Write;
use std::sync::Arc;
use tracing::info;

pub async fn run(args: &ListArgs, config: &LedgerConfig, output: &mut dyn Write) -> anyhow::Result<()> {
    let payouts = load_payouts(&args.payouts)
        .await
        .context("Failed to load payouts")?;

    let wallets = match &args.wallets {
        Some(path) => load_wallets(path).await.context("Failed to load wallets")?,
        None => Vec::new(),
    };

    let records = Arc::new(MemoryRecordStore::from_documents(payouts));
    let wallet_store = Arc::new(MemoryWalletStore::from_wallets(wallets));
    let settlement =
        SettlementEngine::with_max_attempts(wallet_store.clone(), config.max_settle_attempts);
    let paginator = Paginator::new(records, settlement)
        .with_policy(config.enrichment_policy)
        .with_wallet_key_field(&config.wallet_key_field);

    let params = args.to_query_params();
    let filter = build_filter(&params);
    let envelope = paginator
        .paginate(params.page, &filter, args.with_wallet)
        .await
        .context("Failed to list payouts")?;

    info!(
        page = ?envelope.page,
        returned = envelope.results.len(),
        total_docs = envelope.total_docs,
        "Listed payouts"
    );
    write_json(&envelope, output)?;

    if args.save {
        if let Some(path) = &args.wallets {
            save_wallets(path, &wallet_store.all())
                .await
                .context("Failed to save wallets")?;
        }
    }

    Ok(())
}
