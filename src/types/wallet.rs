//! Wallet-related types for the payout ledger
//!
//! A wallet holds an available balance plus a collection of pending
//! transactions. Each pending transaction matures at its `date_available`
//! instant, after which settlement folds its amount into the available
//! balance and removes it from the collection.

use super::id::ObjectId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pending transaction identifier, unique within its wallet
pub type PendingTransactionId = u64;

/// A not-yet-settled credit or debit on a wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub id: PendingTransactionId,

    /// Signed amount
    pub amount: Decimal,

    /// Maturity instant
    pub date_available: DateTime<Utc>,
}

impl PendingTransaction {
    pub fn new(id: PendingTransactionId, amount: Decimal, date_available: DateTime<Utc>) -> Self {
        PendingTransaction {
            id,
            amount,
            date_available,
        }
    }

    /// A transaction is mature once its maturity instant is at or before `now`
    pub fn is_mature_at(&self, now: DateTime<Utc>) -> bool {
        self.date_available <= now
    }
}

/// Per-user wallet
///
/// The value owed to the user is always `available_balance` plus the sum of
/// every transaction still in `transactions`. Settlement moves amounts from
/// the second term to the first without changing that total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Owning user
    pub user_id: ObjectId,

    #[serde(default)]
    pub available_balance: Decimal,

    /// Snapshot of the unmatured sum, written back by settlement
    #[serde(default)]
    pub pending_balance: Decimal,

    #[serde(default)]
    pub transactions: Vec<PendingTransaction>,

    /// Revision counter, bumped by every applied update
    #[serde(default)]
    pub version: u64,
}

impl Wallet {
    /// Create an empty wallet for `user_id`
    pub fn new(user_id: ObjectId) -> Self {
        Wallet {
            user_id,
            available_balance: Decimal::ZERO,
            pending_balance: Decimal::ZERO,
            transactions: Vec::new(),
            version: 0,
        }
    }

    pub fn with_available_balance(mut self, amount: Decimal) -> Self {
        self.available_balance = amount;
        self
    }

    pub fn with_transaction(mut self, transaction: PendingTransaction) -> Self {
        self.transactions.push(transaction);
        self
    }

    /// Total value owed: available balance plus every transaction still held
    pub fn outstanding_total(&self) -> Decimal {
        self.transactions
            .iter()
            .fold(self.available_balance, |acc, tx| acc + tx.amount)
    }

    /// Apply an update if the wallet is still at the expected version
    ///
    /// On success every field of the update lands together and the version
    /// is bumped. On conflict nothing changes.
    pub fn apply(&mut self, update: &WalletUpdate) -> UpdateOutcome {
        if self.version != update.expected_version {
            return UpdateOutcome::Conflict;
        }

        self.available_balance = update.available_balance;
        self.pending_balance = update.pending_balance;
        self.transactions
            .retain(|tx| !update.remove_transactions.contains(&tx.id));
        self.version += 1;

        UpdateOutcome::Applied
    }
}

/// A conditional, all-or-nothing wallet update
#[derive(Debug, Clone, PartialEq)]
pub struct WalletUpdate {
    /// Version the update was computed against
    pub expected_version: u64,
    pub available_balance: Decimal,
    pub pending_balance: Decimal,
    /// Ids to pull from the transaction collection
    pub remove_transactions: Vec<PendingTransactionId>,
}

/// Result of a conditional update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// The wallet moved past the expected version; nothing was written
    Conflict,
}

/// Balances returned by settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettledBalances {
    pub available: Decimal,
    pub pending: Decimal,
}
