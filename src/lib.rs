//! Payout Ledger Library
//! # Overview
//!
//! This library provides the core of a payout listing backend: filtered,
//! paginated payout listings, optionally enriched with wallet balances that
//! are settled on the fly.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Wallet, ObjectId, Document, LedgerError, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::settlement`] - Moves matured pending transactions into the available balance
//!   - [`core::pagination`] - Paged and unpaged listings with optional enrichment
//!   - [`core::filter`] - Builds store filters from listing parameters
//!   - [`core::keys`] - Rewrites record keys to camelCase
//!   - [`core::traits`] - Store interfaces the engines depend on
//! - [`store`] - Concurrent in-memory record and wallet stores
//! - [`io`] - Payout CSV loading, wallet snapshots and JSON output
//! - [`command`] - The `list` and `settle` commands
//! - [`config`] / [`logging`] - Runtime configuration and log setup
//!
//! # Settlement
//!
//! Each wallet keeps:
//! - `available_balance`: Funds the user can withdraw
//! - `pending_balance`: Sum of transactions not yet available
//! - `transactions`: Pending transactions with their availability date
//!
//! Settling a wallet moves every transaction whose availability date has
//! passed into `available_balance`, removes it from the pending collection and
//! recomputes `pending_balance`. Settling twice at the same instant changes
//! nothing the second time.
//!
//! # Listings
//!
//! With a page number the engine counts all matches and returns a window of
//! [`DEFAULT_PAGE_SIZE`] records. Without one it returns every match. Either
//! way record keys are normalized to camelCase before they are returned.

// Module declarations
pub mod cli;
pub mod command;
pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod store;
pub mod types;

pub use config::LedgerConfig;
pub use core::{
    build_filter, normalize_keys, EnrichmentPolicy, Filter, Paginator, RecordStore,
    SettlementEngine, WalletStore,
};
pub use store::{MemoryRecordStore, MemoryWalletStore};
pub use types::{
    Document, LedgerError, ObjectId, PaginationEnvelope, PayoutQueryParams, PendingTransaction,
    SettledBalances, Wallet, DEFAULT_PAGE_SIZE,
};
