//! Wallet snapshot files
//!
//! Wallets are kept as a JSON array of [`Wallet`] objects. Loading seeds the
//! in-memory store; saving writes the settled state back.

use crate::types::{LedgerError, Wallet};
use std::path::Path;
use tracing::debug;

/// Load every wallet from the JSON file at `path`
pub async fn load_wallets(path: &Path) -> Result<Vec<Wallet>, LedgerError> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| LedgerError::store("open wallets", format!("{}: {}", path.display(), e)))?;

    let wallets: Vec<Wallet> = serde_json::from_slice(&raw)
        .map_err(|e| LedgerError::store("parse wallets", format!("{}: {}", path.display(), e)))?;

    debug!(count = wallets.len(), path = %path.display(), "Loaded wallets");
    Ok(wallets)
}

/// Write `wallets` to `path` as a pretty-printed JSON array
pub async fn save_wallets(path: &Path, wallets: &[Wallet]) -> Result<(), LedgerError> {
    let raw = serde_json::to_vec_pretty(wallets)
        .map_err(|e| LedgerError::store("encode wallets", e))?;

    tokio::fs::write(path, raw)
        .await
        .map_err(|e| LedgerError::store("save wallets", format!("{}: {}", path.display(), e)))?;

    debug!(count = wallets.len(), path = %path.display(), "Saved wallets");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ObjectId, PendingTransaction};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_save_then_load() {
        let file = NamedTempFile::new().expect("Failed to create temp file");
        let user: ObjectId = "65f1a2b3c4d5e6f708192a3b".parse().unwrap();
        let wallets = vec![Wallet::new(user)
            .with_available_balance(Decimal::new(1050, 2))
            .with_transaction(PendingTransaction::new(
                3,
                Decimal::new(200, 2),
                Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            ))];

        save_wallets(file.path(), &wallets).await.unwrap();
        let loaded = load_wallets(file.path()).await.unwrap();

        assert_eq!(loaded, wallets);
    }

    #[tokio::test]
    async fn test_load_rejects_bad_id() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        write!(file, r#"[{{"user_id": "nope"}}]"#).unwrap();
        file.flush().unwrap();

        let err = load_wallets(file.path()).await.unwrap_err();

        assert!(matches!(err, LedgerError::Store { ref operation, .. } if operation == "parse wallets"));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load_wallets(Path::new("nonexistent.json")).await.unwrap_err();

        assert!(matches!(err, LedgerError::Store { ref operation, .. } if operation == "open wallets"));
    }
}
