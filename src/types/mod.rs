//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `id`: Store identifiers
//! - `wallet`: Wallets, pending transactions and wallet updates
//! - `record`: Listable records, query parameters and the pagination envelope
//! - `error`: Error types for the payout ledger

pub mod error;
pub mod id;
pub mod record;
pub mod wallet;

pub use error::LedgerError;
pub use id::ObjectId;
pub use record::{Document, PaginationEnvelope, PayoutQueryParams, DEFAULT_PAGE_SIZE};
pub use wallet::{
    PendingTransaction, PendingTransactionId, SettledBalances, UpdateOutcome, Wallet,
    WalletUpdate,
};
