//! Store collaborator traits
//!
//! The core never owns a connection. Whatever service hosts it injects
//! implementations of these traits, so an in-memory store, a document
//! database or a test double can be used interchangeably.

use crate::core::filter::Filter;
use crate::types::{Document, LedgerError, ObjectId, UpdateOutcome, Wallet, WalletUpdate};
use async_trait::async_trait;

/// Skip/limit window for a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub skip: u64,
    /// `None` fetches everything after `skip`
    pub limit: Option<u64>,
}

impl Window {
    /// The full matching set
    pub fn all() -> Self {
        Window::default()
    }

    /// One page of `size` records, `page` counted from 1
    pub fn page(page: u32, size: u64) -> Self {
        Window {
            skip: u64::from(page.saturating_sub(1)) * size,
            limit: Some(size),
        }
    }
}

/// Read access to a collection of listable records
///
/// `find` must return records in a stable order so that consecutive pages
/// neither skip nor repeat a record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the records matching `filter` inside `window`
    async fn find(&self, filter: &Filter, window: Window) -> Result<Vec<Document>, LedgerError>;

    /// Count every record matching `filter`
    async fn count(&self, filter: &Filter) -> Result<u64, LedgerError>;
}

/// Wallet collection access
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Fetch a wallet by owning user id
    async fn find_wallet(&self, user_id: &ObjectId) -> Result<Option<Wallet>, LedgerError>;

    /// Apply `update` atomically if the wallet is still at `update.expected_version`
    ///
    /// Either every field lands or none does.
    async fn update_wallet(
        &self,
        user_id: &ObjectId,
        update: WalletUpdate,
    ) -> Result<UpdateOutcome, LedgerError>;
}
