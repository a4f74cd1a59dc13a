//! Runnable commands
//!
//! Each subcommand loads its stores from files, runs the library operation on
//! a multi-threaded tokio runtime and writes the result to `output`.

use crate::cli::{CliArgs, CommandKind};
use anyhow::Context;
use std::io::Write;

pub mod list;
pub mod settle;

/// Run the parsed command, writing its JSON result to `output`
///
/// Builds the runtime itself, so it must not be called from inside another
/// tokio runtime.
pub fn execute(args: &CliArgs, output: &mut dyn Write) -> anyhow::Result<()> {
    let config = args.to_config();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .build()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(async {
        match &args.command {
            CommandKind::List(list) => list::run(list, &config, output).await,
            CommandKind::Settle(settle) => settle::run(settle, &config, output).await,
        }
    })
}
