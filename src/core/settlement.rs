//! Lazy wallet settlement
//!
//! Balances are settled on read instead of by a background job. Each call
//! takes one snapshot of "now", partitions the wallet's pending transactions
//! into matured (`date_available <= now`) and unmatured, folds the matured
//! amounts into the available balance and writes the result back in a single
//! conditional update.
//!
//! # Concurrency
//!
//! Two guards keep concurrent settlements of the same wallet from counting a
//! transaction twice:
//!
//! - an in-process async lock per wallet, held in a `DashMap` so different
//!   wallets never contend
//! - a compare-and-set on the wallet version, so engines in other processes
//!   sharing the store are caught too; a conflicting write is re-read and
//!   recomputed up to `max_attempts` times
//!
//! The store update is the only mutation. Dropping a settle future before it
//! completes leaves the wallet exactly as it was.

use crate::core::traits::WalletStore;
use crate::types::{
    LedgerError, ObjectId, PendingTransactionId, SettledBalances, UpdateOutcome, Wallet,
    WalletUpdate,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default number of compare-and-set attempts per settle call
pub const DEFAULT_MAX_SETTLE_ATTEMPTS: usize = 5;

/// Outcome of partitioning a wallet at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementPlan {
    pub balances: SettledBalances,
    /// Transactions to pull from the wallet
    pub matured: Vec<PendingTransactionId>,
}

impl SettlementPlan {
    /// Partition `wallet` against `now`
    pub fn compute(wallet: &Wallet, now: DateTime<Utc>) -> Result<Self, LedgerError> {
        let overflow = || LedgerError::arithmetic_overflow("settle", wallet.user_id);

        let mut available = wallet.available_balance;
        let mut pending = Decimal::ZERO;
        let mut matured = Vec::new();

        for tx in &wallet.transactions {
            if tx.is_mature_at(now) {
                available = available.checked_add(tx.amount).ok_or_else(overflow)?;
                matured.push(tx.id);
            } else {
                pending = pending.checked_add(tx.amount).ok_or_else(overflow)?;
            }
        }

        Ok(SettlementPlan {
            balances: SettledBalances { available, pending },
            matured,
        })
    }

    /// True when writing the plan back would not change `wallet`
    pub fn is_noop(&self, wallet: &Wallet) -> bool {
        self.matured.is_empty()
            && self.balances.available == wallet.available_balance
            && self.balances.pending == wallet.pending_balance
    }

    /// The conditional update that persists this plan
    pub fn to_update(&self, expected_version: u64) -> WalletUpdate {
        WalletUpdate {
            expected_version,
            available_balance: self.balances.available,
            pending_balance: self.balances.pending,
            remove_transactions: self.matured.clone(),
        }
    }
}

/// Settles wallets against an injected [`WalletStore`]
///
/// Cheap to clone; clones share the store and the per-wallet locks.
#[derive(Clone)]
pub struct SettlementEngine {
    store: Arc<dyn WalletStore>,
    locks: Arc<DashMap<ObjectId, Arc<Mutex<()>>>>,
    max_attempts: usize,
}

impl SettlementEngine {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self::with_max_attempts(store, DEFAULT_MAX_SETTLE_ATTEMPTS)
    }

    /// Create an engine that gives up after `max_attempts` version conflicts
    ///
    /// Zero is treated as one attempt.
    pub fn with_max_attempts(store: Arc<dyn WalletStore>, max_attempts: usize) -> Self {
        Self {
            store,
            locks: Arc::new(DashMap::new()),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Settle the wallet with the given id as of the current instant
    pub async fn settle(&self, wallet_id: &str) -> Result<SettledBalances, LedgerError> {
        self.settle_at(wallet_id, Utc::now()).await
    }

    /// Settle the wallet with the given id as of `now`
    ///
    /// # Errors
    ///
    /// - `Validation` if `wallet_id` is not a well-formed object id
    /// - `NotFound` if no wallet belongs to that id
    /// - `Store` if the store fails, or the wallet kept changing underneath
    ///   every attempt
    /// - `ArithmeticOverflow` if a balance would overflow
    pub async fn settle_at(
        &self,
        wallet_id: &str,
        now: DateTime<Utc>,
    ) -> Result<SettledBalances, LedgerError> {
        let user_id = ObjectId::parse_field("wallet_id", wallet_id)?;
        self.settle_wallet(user_id, now).await
    }

    /// Settle an already-parsed wallet id as of `now`
    pub async fn settle_wallet(
        &self,
        user_id: ObjectId,
        now: DateTime<Utc>,
    ) -> Result<SettledBalances, LedgerError> {
        // Dropped in reverse order: guard, then lock handle, then the entry
        let _release = LockRelease {
            locks: &self.locks,
            user_id,
        };
        let lock = self.lock_for(user_id);
        let _guard = lock.lock().await;
        self.settle_locked(user_id, now).await
    }

    async fn settle_locked(
        &self,
        user_id: ObjectId,
        now: DateTime<Utc>,
    ) -> Result<SettledBalances, LedgerError> {
        for attempt in 1..=self.max_attempts {
            let wallet = self
                .store
                .find_wallet(&user_id)
                .await?
                .ok_or_else(|| LedgerError::wallet_not_found(user_id, "settle"))?;

            let plan = SettlementPlan::compute(&wallet, now)?;
            if plan.is_noop(&wallet) {
                debug!(wallet = %user_id, "Nothing to settle");
                return Ok(plan.balances);
            }

            match self
                .store
                .update_wallet(&user_id, plan.to_update(wallet.version))
                .await?
            {
                UpdateOutcome::Applied => {
                    info!(
                        wallet = %user_id,
                        matured = plan.matured.len(),
                        available = %plan.balances.available,
                        pending = %plan.balances.pending,
                        "Settled wallet"
                    );
                    return Ok(plan.balances);
                }
                UpdateOutcome::Conflict => {
                    warn!(wallet = %user_id, attempt, "Wallet changed during settlement, retrying");
                }
            }
        }

        Err(LedgerError::store(
            "settle",
            format!(
                "wallet {} changed concurrently on all {} attempts",
                user_id, self.max_attempts
            ),
        ))
    }

    fn lock_for(&self, user_id: ObjectId) -> Arc<Mutex<()>> {
        Arc::clone(
            self.locks
                .entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }
}

/// Removes a wallet's lock entry when a settle call ends or is cancelled
///
/// The entry is kept while another call still holds or waits on it.
struct LockRelease<'a> {
    locks: &'a DashMap<ObjectId, Arc<Mutex<()>>>,
    user_id: ObjectId,
}

impl Drop for LockRelease<'_> {
    fn drop(&mut self) {
        self.locks
            .remove_if(&self.user_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryWalletStore;
    use crate::types::PendingTransaction;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WALLET: &str = "65f1a2b3c4d5e6f708192a3b";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn user() -> ObjectId {
        WALLET.parse().unwrap()
    }

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    /// Wallet with 10.00 available, two matured and two unmatured transactions
    fn mixed_wallet() -> Wallet {
        Wallet::new(user())
            .with_available_balance(dec(1000))
            .with_transaction(PendingTransaction::new(1, dec(250), now() - Duration::days(3)))
            .with_transaction(PendingTransaction::new(2, dec(500), now() + Duration::days(2)))
            .with_transaction(PendingTransaction::new(3, dec(-75), now()))
            .with_transaction(PendingTransaction::new(4, dec(125), now() + Duration::seconds(1)))
    }

    fn engine_with(wallet: Wallet) -> (SettlementEngine, Arc<MemoryWalletStore>) {
        let store = Arc::new(MemoryWalletStore::new());
        store.insert(wallet);
        (SettlementEngine::new(store.clone()), store)
    }

    #[test]
    fn test_plan_partitions_at_snapshot() {
        let plan = SettlementPlan::compute(&mixed_wallet(), now()).unwrap();

        // 10.00 + 2.50 - 0.75 ; 5.00 + 1.25
        assert_eq!(plan.balances.available, dec(1175));
        assert_eq!(plan.balances.pending, dec(625));
        assert_eq!(plan.matured, vec![1, 3]);
    }

    #[test]
    fn test_plan_overflow_is_reported() {
        let wallet = Wallet::new(user())
            .with_available_balance(Decimal::MAX)
            .with_transaction(PendingTransaction::new(1, Decimal::ONE, now()));

        let err = SettlementPlan::compute(&wallet, now()).unwrap_err();
        assert_eq!(err, LedgerError::arithmetic_overflow("settle", user()));
    }

    #[tokio::test]
    async fn test_settle_moves_matured_and_persists() {
        let (engine, store) = engine_with(mixed_wallet());

        let balances = engine.settle_at(WALLET, now()).await.unwrap();

        assert_eq!(balances.available, dec(1175));
        assert_eq!(balances.pending, dec(625));

        let stored = store.get(&user()).unwrap();
        assert_eq!(stored.available_balance, dec(1175));
        assert_eq!(stored.pending_balance, dec(625));
        let remaining: Vec<_> = stored.transactions.iter().map(|tx| tx.id).collect();
        assert_eq!(remaining, vec![2, 4]);
        assert!(stored.transactions.iter().all(|tx| !tx.is_mature_at(now())));
    }

    #[tokio::test]
    async fn test_settle_preserves_outstanding_total() {
        let wallet = mixed_wallet();
        let before = wallet.outstanding_total();
        let (engine, store) = engine_with(wallet);

        engine.settle_at(WALLET, now()).await.unwrap();

        assert_eq!(store.get(&user()).unwrap().outstanding_total(), before);
    }

    #[tokio::test]
    async fn test_settle_is_idempotent_without_new_maturity() {
        let (engine, store) = engine_with(mixed_wallet());

        let first = engine.settle_at(WALLET, now()).await.unwrap();
        let version_after_first = store.get(&user()).unwrap().version;

        let second = engine.settle_at(WALLET, now()).await.unwrap();
        let after_second = store.get(&user()).unwrap();

        assert_eq!(first, second);
        assert_eq!(after_second.version, version_after_first);
    }

    #[tokio::test]
    async fn test_later_snapshot_matures_more() {
        let (engine, _store) = engine_with(mixed_wallet());

        engine.settle_at(WALLET, now()).await.unwrap();
        let later = engine
            .settle_at(WALLET, now() + Duration::days(5))
            .await
            .unwrap();

        assert_eq!(later.available, dec(1800));
        assert_eq!(later.pending, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_settle_empty_wallet() {
        let (engine, store) = engine_with(Wallet::new(user()));

        let balances = engine.settle_at(WALLET, now()).await.unwrap();

        assert_eq!(balances.available, Decimal::ZERO);
        assert_eq!(balances.pending, Decimal::ZERO);
        assert_eq!(store.get(&user()).unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_stale_pending_balance_is_rewritten() {
        let mut wallet = Wallet::new(user())
            .with_transaction(PendingTransaction::new(1, dec(300), now() + Duration::days(1)));
        wallet.pending_balance = dec(999);
        let (engine, store) = engine_with(wallet);

        let balances = engine.settle_at(WALLET, now()).await.unwrap();

        assert_eq!(balances.pending, dec(300));
        assert_eq!(store.get(&user()).unwrap().pending_balance, dec(300));
    }

    #[tokio::test]
    async fn test_settle_rejects_malformed_id() {
        let (engine, _store) = engine_with(mixed_wallet());

        let err = engine.settle_at("not-an-id", now()).await.unwrap_err();

        assert!(matches!(err, LedgerError::Validation { ref field, .. } if field == "wallet_id"));
    }

    #[tokio::test]
    async fn test_settle_missing_wallet() {
        let (engine, _store) = engine_with(mixed_wallet());

        let err = engine
            .settle_at("000000000000000000000001", now())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::wallet_not_found("000000000000000000000001", "settle")
        );
    }

    #[derive(Default)]
    struct UnavailableStore;

    #[async_trait]
    impl WalletStore for UnavailableStore {
        async fn find_wallet(&self, _: &ObjectId) -> Result<Option<Wallet>, LedgerError> {
            Err(LedgerError::store("find_wallet", "connection refused"))
        }

        async fn update_wallet(
            &self,
            _: &ObjectId,
            _: WalletUpdate,
        ) -> Result<UpdateOutcome, LedgerError> {
            Err(LedgerError::store("update_wallet", "connection refused"))
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let engine = SettlementEngine::new(Arc::new(UnavailableStore));

        let err = engine.settle_at(WALLET, now()).await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(err, LedgerError::store("find_wallet", "connection refused"));
    }

    /// Store whose version always moves between read and write
    struct ContendedStore {
        inner: MemoryWalletStore,
        updates: AtomicUsize,
    }

    #[async_trait]
    impl WalletStore for ContendedStore {
        async fn find_wallet(&self, id: &ObjectId) -> Result<Option<Wallet>, LedgerError> {
            self.inner.find_wallet(id).await
        }

        async fn update_wallet(
            &self,
            _: &ObjectId,
            _: WalletUpdate,
        ) -> Result<UpdateOutcome, LedgerError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            Ok(UpdateOutcome::Conflict)
        }
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let store = Arc::new(ContendedStore {
            inner: MemoryWalletStore::new(),
            updates: AtomicUsize::new(0),
        });
        store.inner.insert(mixed_wallet());
        let engine = SettlementEngine::with_max_attempts(store.clone(), 3);

        let err = engine.settle_at(WALLET, now()).await.unwrap_err();

        assert!(matches!(err, LedgerError::Store { ref operation, .. } if operation == "settle"));
        assert_eq!(store.updates.load(Ordering::SeqCst), 3);
    }

    /// Store whose writes never complete
    struct StalledWriteStore {
        inner: MemoryWalletStore,
    }

    #[async_trait]
    impl WalletStore for StalledWriteStore {
        async fn find_wallet(&self, id: &ObjectId) -> Result<Option<Wallet>, LedgerError> {
            self.inner.find_wallet(id).await
        }

        async fn update_wallet(
            &self,
            _: &ObjectId,
            _: WalletUpdate,
        ) -> Result<UpdateOutcome, LedgerError> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cancelled_settle_releases_lock_entry() {
        let store = Arc::new(StalledWriteStore {
            inner: MemoryWalletStore::new(),
        });
        store.inner.insert(mixed_wallet());
        let engine = SettlementEngine::new(store.clone());

        // The first call holds the lock inside the write, the second waits on it
        let mut holding = Box::pin(engine.settle_at(WALLET, now()));
        let mut waiting = Box::pin(engine.settle_at(WALLET, now()));
        assert!(futures::poll!(holding.as_mut()).is_pending());
        assert!(futures::poll!(waiting.as_mut()).is_pending());
        assert_eq!(engine.locks.len(), 1);

        drop(holding);
        assert_eq!(engine.locks.len(), 1);
        drop(waiting);

        assert!(engine.locks.is_empty());
        assert_eq!(store.inner.get(&user()).unwrap(), mixed_wallet());
    }

    #[tokio::test]
    async fn test_cancelled_settles_do_not_grow_lock_map() {
        let store = Arc::new(StalledWriteStore {
            inner: MemoryWalletStore::new(),
        });
        let engine = SettlementEngine::new(store.clone());

        for i in 0..64u64 {
            let mut bytes = [0u8; 12];
            bytes[4..].copy_from_slice(&i.to_be_bytes());
            let id = ObjectId::from_bytes(bytes);
            store.inner.insert(
                Wallet::new(id)
                    .with_transaction(PendingTransaction::new(1, dec(100), now() - Duration::hours(1))),
            );

            let mut settle = Box::pin(engine.settle_wallet(id, now()));
            assert!(futures::poll!(settle.as_mut()).is_pending());
        }

        assert!(engine.locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_settles_never_double_count() {
        let (engine, store) = engine_with(mixed_wallet());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.settle_at(WALLET, now()).await })
            })
            .collect();

        for handle in handles {
            let balances = handle.await.unwrap().unwrap();
            assert_eq!(balances.available, dec(1175));
            assert_eq!(balances.pending, dec(625));
        }

        let stored = store.get(&user()).unwrap();
        assert_eq!(stored.available_balance, dec(1175));
        assert_eq!(stored.version, 1);
        assert!(engine.locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_independent_engines_sharing_a_store() {
        // Separate engines do not share locks; the version check alone must
        // keep them from folding the same transaction twice.
        let store = Arc::new(MemoryWalletStore::new());
        store.insert(mixed_wallet());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let engine = SettlementEngine::with_max_attempts(store.clone(), 64);
                tokio::spawn(async move { engine.settle_at(WALLET, now()).await })
            })
            .collect();

        for handle in handles {
            let balances = handle.await.unwrap().unwrap();
            assert_eq!(balances.available, dec(1175));
        }

        let stored = store.get(&user()).unwrap();
        assert_eq!(stored.available_balance, dec(1175));
        assert_eq!(stored.pending_balance, dec(625));
        assert_eq!(stored.version, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_different_wallets_settle_independently() {
        let store = Arc::new(MemoryWalletStore::new());
        let ids: Vec<ObjectId> = (1u8..=8)
            .map(|i| {
                let mut bytes = [0u8; 12];
                bytes[11] = i;
                ObjectId::from_bytes(bytes)
            })
            .collect();
        for id in &ids {
            store.insert(
                Wallet::new(*id)
                    .with_transaction(PendingTransaction::new(1, dec(100), now() - Duration::hours(1))),
            );
        }
        let engine = SettlementEngine::new(store.clone());

        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let engine = engine.clone();
                let id = *id;
                tokio::spawn(async move { engine.settle_wallet(id, now()).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().available, dec(100));
        }
        for id in &ids {
            assert!(store.get(id).unwrap().transactions.is_empty());
        }
    }
}
