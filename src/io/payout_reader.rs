//! Asynchronous payout CSV reader with batch interface
//!
//! Loads payout records into [`Document`]s. The header row names the fields;
//! each data row becomes one document in file order.
//!
//! # Cell conversion
//!
//! - empty cells are left out of the document
//! - cells parsing as `i64` become JSON integers
//! - `true` / `false` become booleans
//! - everything else (timestamps included) stays a string
//!
//! Rows whose field count does not match the header are skipped with a
//! warning; the rest of the file is still read.

use crate::types::{Document, LedgerError};
use csv_async::{AsyncReaderBuilder, StringRecord};
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// Rows read per batch by [`load_payouts`]
pub const LOAD_BATCH_SIZE: usize = 1000;

/// Asynchronous payout CSV reader
pub struct PayoutReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncReader<R>,
    headers: Option<StringRecord>,
}

impl<R: AsyncRead + Unpin + Send> PayoutReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_reader(reader);

        Self {
            csv_reader,
            headers: None,
        }
    }

    /// Read up to `batch_size` documents
    ///
    /// Returns an empty vector once the input is exhausted.
    pub async fn read_batch(&mut self, batch_size: usize) -> Result<Vec<Document>, LedgerError> {
        if self.headers.is_none() {
            let headers = self
                .csv_reader
                .headers()
                .await
                .map_err(|e| LedgerError::store("read payout headers", e))?
                .clone();
            self.headers = Some(headers);
        }
        let headers = self.headers.clone().unwrap_or_default();

        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.records();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(record)) if record.len() == headers.len() => {
                    batch.push(to_document(&headers, &record));
                }
                Some(Ok(record)) => warn!(
                    line = record.position().map(|p| p.line()),
                    expected = headers.len(),
                    found = record.len(),
                    "Skipping payout row with wrong field count"
                ),
                Some(Err(e)) => warn!(error = %e, "Skipping unreadable payout row"),
                None => break,
            }
        }

        Ok(batch)
    }
}

fn to_document(headers: &StringRecord, record: &StringRecord) -> Document {
    headers
        .iter()
        .zip(record.iter())
        .filter_map(|(field, raw)| cell_value(raw).map(|value| (field.to_string(), value)))
        .collect()
}

fn cell_value(raw: &str) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(number) = raw.parse::<i64>() {
        return Some(Value::from(number));
    }
    match raw {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => Some(Value::from(raw)),
    }
}

/// Load every payout from the CSV file at `path`
pub async fn load_payouts(path: &Path) -> Result<Vec<Document>, LedgerError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| LedgerError::store("open payouts", format!("{}: {}", path.display(), e)))?;

    // Wrap tokio file in a compatibility layer for csv-async
    let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
    let mut reader = PayoutReader::new(compat_file);

    let mut payouts = Vec::new();
    loop {
        let batch = reader.read_batch(LOAD_BATCH_SIZE).await?;
        if batch.is_empty() {
            break;
        }
        payouts.extend(batch);
    }

    debug!(count = payouts.len(), path = %path.display(), "Loaded payouts");
    Ok(payouts)
}
