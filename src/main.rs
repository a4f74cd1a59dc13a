//! Payout Ledger CLI
//!
//! Command-line interface for listing payouts and settling wallets from local
//! files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- list --payouts payouts.csv > listing.json
//! cargo run -- list --payouts payouts.csv --page 2 --statuses pending,completed
//! cargo run -- list --payouts payouts.csv --wallets wallets.json --with-wallet --save
//! cargo run -- settle --wallets wallets.json 65f1a2b3c4d5e6f708192a3b
//! ```
//!
//! Results are written to stdout as JSON; logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, invalid wallet id, settlement failure, etc.)

use payout_ledger::cli;
use payout_ledger::command;
use payout_ledger::logging;
use std::process;

fn main() {
    let args = cli::parse_args();

    logging::init_logging(&args.log_level, args.log_json);

    let mut output = std::io::stdout();
    if let Err(e) = command::execute(&args, &mut output) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
