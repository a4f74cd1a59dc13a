//! Core business logic module
//!
//! This module contains the balance settlement and listing components:
//! - `traits` - Store collaborator traits the host service injects
//! - `filter` - Listing parameters to structured store query
//! - `keys` - snake_case to camelCase field-name normalization
//! - `settlement` - Lazy wallet settlement with per-wallet serialization
//! - `pagination` - Paged/unpaged listing with optional wallet enrichment

pub mod filter;
pub mod keys;
pub mod pagination;
pub mod settlement;
pub mod traits;

pub use filter::{build_filter, Condition, DateRange, Filter};
pub use keys::{normalize_keys, to_camel_case};
pub use pagination::{EnrichmentPolicy, Paginator};
pub use settlement::{SettlementEngine, SettlementPlan};
pub use traits::{RecordStore, WalletStore, Window};
