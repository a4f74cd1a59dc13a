//! Paginated listing with optional wallet enrichment
//!
//! [`Paginator::paginate`] runs one listing call:
//!
//! 1. fetch a page (or the full matching set) from the record store
//! 2. optionally settle each record's wallet and merge the balances in
//! 3. normalize every record's field names
//! 4. wrap the results in a [`PaginationEnvelope`]
//!
//! # Modes
//!
//! - **Paged** (`page` present): a count query supplies `totalDocs`, then a
//!   window of [`DEFAULT_PAGE_SIZE`] records is fetched at
//!   `skip = (page - 1) * pageSize`.
//! - **Unpaged** (`page` absent): the full matching set is fetched and
//!   `totalDocs` is the number of returned records. No count query is issued.
//!
//! The count and the window are separate store calls and may disagree
//! slightly if the collection changes in between.

use crate::core::filter::Filter;
use crate::core::keys::normalize_keys;
use crate::core::settlement::SettlementEngine;
use crate::core::traits::{RecordStore, Window};
use crate::types::{
    Document, LedgerError, ObjectId, PaginationEnvelope, SettledBalances, DEFAULT_PAGE_SIZE,
};
use chrono::{DateTime, Utc};
use futures::future::{join_all, try_join_all};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Field receiving the settled available balance, before normalization
pub const AVAILABLE_BALANCE_FIELD: &str = "available_balance";
/// Field receiving the settled pending balance, before normalization
pub const PENDING_BALANCE_FIELD: &str = "pending_balance";
/// Field receiving the failure message under [`EnrichmentPolicy::MarkRecord`]
pub const WALLET_ERROR_FIELD: &str = "wallet_error";
/// Default record field holding the wallet key
pub const DEFAULT_WALLET_KEY_FIELD: &str = "_id";

/// What to do when settling a listed record's wallet fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrichmentPolicy {
    /// Fail the whole call with the first enrichment error
    #[default]
    FailFast,
    /// Keep the record without balances and attach the error message
    MarkRecord,
}

/// Listing engine over an injected [`RecordStore`]
#[derive(Clone)]
pub struct Paginator {
    records: Arc<dyn RecordStore>,
    settlement: SettlementEngine,
    policy: EnrichmentPolicy,
    wallet_key_field: String,
}

impl Paginator {
    pub fn new(records: Arc<dyn RecordStore>, settlement: SettlementEngine) -> Self {
        Self {
            records,
            settlement,
            policy: EnrichmentPolicy::default(),
            wallet_key_field: DEFAULT_WALLET_KEY_FIELD.to_string(),
        }
    }

    pub fn with_policy(mut self, policy: EnrichmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use `field` as the wallet key when enriching
    pub fn with_wallet_key_field(mut self, field: &str) -> Self {
        self.wallet_key_field = field.to_string();
        self
    }

    /// List the records matching `filter`, settling as of the current instant
    pub async fn paginate(
        &self,
        page: Option<u32>,
        filter: &Filter,
        enrich: bool,
    ) -> Result<PaginationEnvelope, LedgerError> {
        self.paginate_at(page, filter, enrich, Utc::now()).await
    }

    /// List the records matching `filter`, settling as of `now`
    ///
    /// # Errors
    ///
    /// - `Validation` if `page` is zero
    /// - `Store` if a count or fetch fails
    /// - `Enrichment` under [`EnrichmentPolicy::FailFast`] when any record's
    ///   settlement fails
    pub async fn paginate_at(
        &self,
        page: Option<u32>,
        filter: &Filter,
        enrich: bool,
        now: DateTime<Utc>,
    ) -> Result<PaginationEnvelope, LedgerError> {
        let (total_docs, documents) = match page {
            Some(0) => return Err(LedgerError::validation("page", "0", "must be at least 1")),
            Some(page) => {
                let total_docs = self.records.count(filter).await?;
                let window = Window::page(page, DEFAULT_PAGE_SIZE);
                debug!(page, skip = window.skip, total_docs, "Fetching page");
                (total_docs, self.records.find(filter, window).await?)
            }
            None => {
                let documents = self.records.find(filter, Window::all()).await?;
                debug!(returned = documents.len(), "Fetched unpaged listing");
                (documents.len() as u64, documents)
            }
        };

        let documents = if enrich {
            self.enrich_all(documents, now).await?
        } else {
            documents
        };

        let results = documents.into_iter().map(normalize_keys).collect();
        Ok(PaginationEnvelope::new(page, total_docs, results))
    }

    async fn enrich_all(
        &self,
        documents: Vec<Document>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Document>, LedgerError> {
        let settled = documents.into_iter().enumerate().map(|(index, doc)| async move {
            let outcome = self.settle_record(index, &doc, now).await;
            (doc, outcome)
        });

        match self.policy {
            EnrichmentPolicy::FailFast => {
                let checked = settled.map(|pending| async move {
                    let (doc, outcome) = pending.await;
                    outcome.map(|balances| merge_balances(doc, balances))
                });
                try_join_all(checked).await
            }
            EnrichmentPolicy::MarkRecord => Ok(join_all(settled)
                .await
                .into_iter()
                .map(|(mut doc, outcome)| match outcome {
                    Ok(balances) => merge_balances(doc, balances),
                    Err(error) => {
                        warn!(%error, "Listing record without wallet balances");
                        doc.insert(WALLET_ERROR_FIELD.to_string(), Value::from(error.to_string()));
                        doc
                    }
                })
                .collect()),
        }
    }

    async fn settle_record(
        &self,
        index: usize,
        doc: &Document,
        now: DateTime<Utc>,
    ) -> Result<SettledBalances, LedgerError> {
        let key = match doc.get(&self.wallet_key_field) {
            Some(Value::String(key)) => key.as_str(),
            Some(other) => {
                return Err(LedgerError::enrichment(
                    &record_label(doc, index),
                    LedgerError::validation(
                        &self.wallet_key_field,
                        &other.to_string(),
                        "wallet key must be a string",
                    ),
                ))
            }
            None => {
                return Err(LedgerError::enrichment(
                    &record_label(doc, index),
                    LedgerError::validation(&self.wallet_key_field, "", "wallet key is missing"),
                ))
            }
        };

        let user_id = ObjectId::parse_field(&self.wallet_key_field, key)
            .map_err(|e| LedgerError::enrichment(key, e))?;

        self.settlement
            .settle_wallet(user_id, now)
            .await
            .map_err(|e| LedgerError::enrichment(key, e))
    }
}

/// Name for a record in enrichment errors: its `_id`, else `#<index>` on the page
fn record_label(doc: &Document, index: usize) -> String {
    match doc.get("_id") {
        Some(Value::String(id)) => id.clone(),
        Some(other) => other.to_string(),
        None => format!("#{}", index),
    }
}

fn merge_balances(mut doc: Document, balances: SettledBalances) -> Document {
    doc.insert(
        AVAILABLE_BALANCE_FIELD.to_string(),
        Value::from(balances.available.to_string()),
    );
    doc.insert(
        PENDING_BALANCE_FIELD.to_string(),
        Value::from(balances.pending.to_string()),
    );
    doc
}
