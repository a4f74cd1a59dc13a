use crate::config::LedgerConfig;
use crate::core::EnrichmentPolicy;
use crate::types::PayoutQueryParams;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// List payouts and settle wallet balances
#[derive(Parser, Debug)]
#[command(name = "payout-ledger")]
#[command(about = "List payouts and settle wallet balances", long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: CommandKind,

    /// Worker threads for the async runtime
    #[arg(
        long = "workers",
        global = true,
        value_name = "COUNT",
        help = "Worker threads for the async runtime (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Compare-and-set attempts per settlement
    #[arg(
        long = "settle-attempts",
        global = true,
        value_name = "COUNT",
        help = "Attempts per settlement before giving up (default: 5)"
    )]
    pub settle_attempts: Option<usize>,

    /// Payout field holding the wallet key
    #[arg(
        long = "wallet-key",
        global = true,
        value_name = "FIELD",
        help = "Payout field holding the wallet key (default: _id)"
    )]
    pub wallet_key: Option<String>,

    #[arg(
        long = "log-level",
        global = true,
        value_name = "LEVEL",
        default_value = "warn",
        help = "Log level when RUST_LOG is unset"
    )]
    pub log_level: String,

    #[arg(long = "log-json", global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum CommandKind {
    /// List payouts, optionally paged and enriched with wallet balances
    List(ListArgs),
    /// Settle one wallet and print its balances
    Settle(SettleArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long = "payouts", value_name = "FILE", help = "Payout CSV file")]
    pub payouts: PathBuf,

    #[arg(long = "wallets", value_name = "FILE", help = "Wallet JSON file")]
    pub wallets: Option<PathBuf>,

    #[arg(long = "page", value_name = "N", help = "1-based page; omit to list everything")]
    pub page: Option<u32>,

    #[arg(long = "statuses", value_name = "LIST", help = "Comma-separated statuses")]
    pub statuses: Option<String>,

    #[arg(long = "start-date", value_name = "DATE", value_parser = parse_date)]
    pub start_date: Option<DateTime<Utc>>,

    #[arg(long = "end-date", value_name = "DATE", value_parser = parse_date)]
    pub end_date: Option<DateTime<Utc>>,

    #[arg(long = "payment-start-date", value_name = "DATE", value_parser = parse_date)]
    pub payment_start_date: Option<DateTime<Utc>>,

    #[arg(long = "payment-end-date", value_name = "DATE", value_parser = parse_date)]
    pub payment_end_date: Option<DateTime<Utc>>,

    #[arg(long = "user-type", value_name = "TYPE")]
    pub user_type: Option<String>,

    #[arg(
        long = "with-wallet",
        requires = "wallets",
        help = "Settle each listed wallet and attach its balances"
    )]
    pub with_wallet: bool,

    #[arg(
        long = "on-wallet-error",
        value_name = "MODE",
        help = "What to do when a wallet cannot be settled (default: fail)"
    )]
    pub on_wallet_error: Option<WalletErrorMode>,

    #[arg(long = "save", requires = "wallets", help = "Write settled wallets back")]
    pub save: bool,
}

#[derive(Args, Debug)]
pub struct SettleArgs {
    #[arg(long = "wallets", value_name = "FILE", help = "Wallet JSON file")]
    pub wallets: PathBuf,

    #[arg(value_name = "WALLET_ID", help = "24-character hex wallet id")]
    pub wallet_id: String,

    #[arg(long = "save", help = "Write the settled wallet back")]
    pub save: bool,
}

/// Handling of wallet failures during a listing
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum WalletErrorMode {
    Fail,
    Mark,
}

impl From<WalletErrorMode> for EnrichmentPolicy {
    fn from(mode: WalletErrorMode) -> Self {
        match mode {
            WalletErrorMode::Fail => EnrichmentPolicy::FailFast,
            WalletErrorMode::Mark => EnrichmentPolicy::MarkRecord,
        }
    }
}

/// Parse an RFC 3339 instant or a `YYYY-MM-DD` date (midnight UTC)
pub fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| format!("expected RFC 3339 or YYYY-MM-DD, got '{}'", value))
}

impl CliArgs {
    /// Create a LedgerConfig from CLI arguments
    ///
    /// Missing values fall back to the defaults; zero values are replaced by
    /// [`LedgerConfig::new`] with a warning.
    pub fn to_config(&self) -> LedgerConfig {
        let default = LedgerConfig::default();
        let policy = match &self.command {
            CommandKind::List(list) => list.on_wallet_error.map(EnrichmentPolicy::from),
            CommandKind::Settle(_) => None,
        };

        LedgerConfig::new(
            self.workers.unwrap_or(default.worker_threads),
            self.settle_attempts.unwrap_or(default.max_settle_attempts),
            policy.unwrap_or(default.enrichment_policy),
            self.wallet_key.as_deref().unwrap_or(&default.wallet_key_field),
        )
    }
}

impl ListArgs {
    pub fn to_query_params(&self) -> PayoutQueryParams {
        PayoutQueryParams {
            statuses: self.statuses.clone(),
            page: self.page,
            start_date: self.start_date,
            end_date: self.end_date,
            user_type: self.user_type.clone(),
            payment_start_date: self.payment_start_date,
            payment_end_date: self.payment_end_date,
        }
    }
}
