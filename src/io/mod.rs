//! I/O module
//!
//! Loads the stores from files and writes command output.
//!
//! # Components
//!
//! - `payout_reader` - Asynchronous payout CSV reader with batch interface
//! - `wallet_file` - JSON wallet snapshots
//! - `output` - JSON output for command results

pub mod output;
pub mod payout_reader;
pub mod wallet_file;

pub use output::write_json;
pub use payout_reader::{load_payouts, PayoutReader};
pub use wallet_file::{load_wallets, save_wallets};
