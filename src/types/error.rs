//! Error types for the payout ledger
//!
//! Every failure the core can report falls into one of a few categories:
//!
//! - **Validation**: malformed identifier or parameter, caller's fault, never retried
//! - **NotFound**: wallet or referenced entity absent, never retried
//! - **Store**: infrastructure failure, the caller may retry with backoff
//! - **Enrichment**: a settlement failure attached to the listed record that caused it
//!
//! Each variant carries the offending id and the sub-operation so the caller
//! can log it without re-deriving anything.

use thiserror::Error;

/// Main error type for the payout ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Malformed identifier or parameter
    #[error("Invalid {field} '{value}': {reason}")]
    Validation {
        /// Name of the offending field or parameter
        field: String,
        /// The rejected value as supplied
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// A wallet or other referenced entity does not exist
    #[error("{entity} {id} not found during {operation}")]
    NotFound {
        /// Kind of entity that was looked up
        entity: String,
        /// Identifier used for the lookup
        id: String,
        /// Operation that performed the lookup
        operation: String,
    },

    /// Transient infrastructure failure
    ///
    /// Not retried internally; see [`LedgerError::is_retryable`].
    #[error("Store failure during {operation}: {message}")]
    Store {
        /// Store operation that failed
        operation: String,
        /// Underlying failure description
        message: String,
    },

    /// Balance arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for wallet {wallet}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Wallet being settled
        wallet: String,
    },

    /// Settlement failed for one record of a listing
    #[error("Enrichment of record {record} failed: {source}")]
    Enrichment {
        /// Identifier of the listed record
        record: String,
        /// The settlement error
        source: Box<LedgerError>,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Store {
            operation: "io".to_string(),
            message: error.to_string(),
        }
    }
}

impl LedgerError {
    /// Create a Validation error
    pub fn validation(field: &str, value: &str, reason: &str) -> Self {
        LedgerError::Validation {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a NotFound error for a wallet
    pub fn wallet_not_found(id: impl ToString, operation: &str) -> Self {
        LedgerError::NotFound {
            entity: "Wallet".to_string(),
            id: id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Create a Store error
    pub fn store(operation: &str, message: impl ToString) -> Self {
        LedgerError::Store {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, wallet: impl ToString) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            wallet: wallet.to_string(),
        }
    }

    /// Wrap a settlement error with the record it was raised for
    pub fn enrichment(record: &str, source: LedgerError) -> Self {
        LedgerError::Enrichment {
            record: record.to_string(),
            source: Box::new(source),
        }
    }

    /// Whether the caller may retry the failed call
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::Store { .. } => true,
            LedgerError::Enrichment { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
