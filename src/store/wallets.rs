//! Thread-safe in-memory wallet collection
//!
//! `MemoryWalletStore` keeps wallets in a `DashMap`, which shards its
//! locking so that operations on different wallets proceed in parallel
//! while operations on the same wallet are serialized. A conditional update
//! runs entirely under the entry lock, so it can never be observed half
//! applied.

use crate::core::traits::WalletStore;
use crate::types::{LedgerError, ObjectId, UpdateOutcome, Wallet, WalletUpdate};
use async_trait::async_trait;
use dashmap::DashMap;

/// Wallet collection backed by a concurrent map
#[derive(Debug, Default)]
pub struct MemoryWalletStore {
    wallets: DashMap<ObjectId, Wallet>,
}

impl MemoryWalletStore {
    pub fn new() -> Self {
        Self {
            wallets: DashMap::new(),
        }
    }

    /// Build a store holding `wallets`; a later duplicate id replaces an earlier one
    pub fn from_wallets(wallets: impl IntoIterator<Item = Wallet>) -> Self {
        let store = Self::new();
        for wallet in wallets {
            store.insert(wallet);
        }
        store
    }

    /// Provision (or replace) a wallet
    pub fn insert(&self, wallet: Wallet) {
        self.wallets.insert(wallet.user_id, wallet);
    }

    /// Snapshot of a single wallet
    pub fn get(&self, user_id: &ObjectId) -> Option<Wallet> {
        self.wallets.get(user_id).map(|entry| entry.value().clone())
    }

    /// Snapshot of every wallet, ordered by user id
    pub fn all(&self) -> Vec<Wallet> {
        let mut wallets: Vec<Wallet> = self
            .wallets
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        wallets.sort_by_key(|wallet| wallet.user_id);
        wallets
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}

#[async_trait]
impl WalletStore for MemoryWalletStore {
    async fn find_wallet(&self, user_id: &ObjectId) -> Result<Option<Wallet>, LedgerError> {
        Ok(self.get(user_id))
    }

    async fn update_wallet(
        &self,
        user_id: &ObjectId,
        update: WalletUpdate,
    ) -> Result<UpdateOutcome, LedgerError> {
        let mut entry = self
            .wallets
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::wallet_not_found(user_id, "update_wallet"))?;
        Ok(entry.value_mut().apply(&update))
    }
}
