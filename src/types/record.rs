//! Listable records, listing parameters and the pagination envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A listable record: field name to value
///
/// Timestamps are stored as RFC 3339 strings.
pub type Document = Map<String, Value>;

/// Fixed number of records per page
pub const DEFAULT_PAGE_SIZE: u64 = 3;

/// Filter and paging parameters for payout listings
///
/// `start_date`/`end_date` bound the `created` field,
/// `payment_start_date`/`payment_end_date` bound `payment_date`.
/// All bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PayoutQueryParams {
    /// Comma-separated status values
    pub statuses: Option<String>,
    pub page: Option<u32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub user_type: Option<String>,
    pub payment_start_date: Option<DateTime<Utc>>,
    pub payment_end_date: Option<DateTime<Utc>>,
}

/// Response envelope for a listing call
///
/// `page` is `null` in unpaged mode. In paged mode `total_docs` is the full
/// match count; in unpaged mode it is the number of returned records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationEnvelope {
    pub page: Option<u32>,
    pub page_size: u64,
    pub total_pages: u64,
    pub total_docs: u64,
    pub results: Vec<Document>,
}

impl PaginationEnvelope {
    pub fn new(page: Option<u32>, total_docs: u64, results: Vec<Document>) -> Self {
        PaginationEnvelope {
            page,
            page_size: DEFAULT_PAGE_SIZE,
            total_pages: total_docs.div_ceil(DEFAULT_PAGE_SIZE),
            total_docs,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::empty(0, 0)]
    #[case::single(1, 1)]
    #[case::exact(3, 1)]
    #[case::one_over(4, 2)]
    #[case::ten(10, 4)]
    fn test_total_pages(#[case] total_docs: u64, #[case] expected: u64) {
        let envelope = PaginationEnvelope::new(Some(1), total_docs, Vec::new());
        assert_eq!(envelope.total_pages, expected);
    }

    #[test]
    fn test_envelope_field_names() {
        let envelope = PaginationEnvelope::new(None, 0, Vec::new());
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            value,
            json!({
                "page": null,
                "pageSize": 3,
                "totalPages": 0,
                "totalDocs": 0,
                "results": []
            })
        );
    }
}
