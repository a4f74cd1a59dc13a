//! In-memory record collection
//!
//! Records are kept in insertion order, which doubles as the stable natural
//! order paged fetches rely on.

use crate::core::filter::Filter;
use crate::core::traits::{RecordStore, Window};
use crate::types::{Document, LedgerError};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Record collection ordered by insertion
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<Document>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self {
            records: RwLock::new(documents),
        }
    }

    pub async fn insert(&self, document: Document) {
        self.records.write().await.push(document);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find(&self, filter: &Filter, window: Window) -> Result<Vec<Document>, LedgerError> {
        let records = self.records.read().await;
        let skip = usize::try_from(window.skip).unwrap_or(usize::MAX);
        let limit = window
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(records
            .iter()
            .filter(|doc| filter.matches(doc))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, LedgerError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|doc| filter.matches(doc)).count() as u64)
    }
}
