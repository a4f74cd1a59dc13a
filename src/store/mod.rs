//! In-memory store implementations
//!
//! Concurrent, process-local implementations of the store collaborator
//! traits. The CLI loads them from files; tests and benchmarks build them
//! directly.

pub mod records;
pub mod wallets;

pub use records::MemoryRecordStore;
pub use wallets::MemoryWalletStore;
