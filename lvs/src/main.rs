mod commands;
mod fixture;
mod logging;

use anyhow::Context;
use clap::Parser;
use lvs_common::{LogLevel, Logger};
use tracing::info;

use crate::logging::init_logging;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Debug, Parser)]
#[command(version, about)]
/// lvs, query time columns for monitoring status tables.
///
/// Loads monitoring objects and their metric history from a fixture and
/// binds dynamic column references such as `rrddata:load:load1:0:3600:60`
/// against the host and service tables.
pub struct Args {
    #[arg(long, env = "LVS_LOG_LEVEL", default_value = "info")]
    /// Set the log level of the process.
    ///
    /// This can filter on various levels, for example `info,lvs_columns=debug`
    /// will display all logs at `info` level severity and above, and the
    /// column diagnostics down to `debug`.
    log_level: String,
    #[arg(long, env = "LVS_LOG_JSON")]
    /// Emit logs in JSON format rather than as plain text.
    log_json: bool,
    #[arg(long, env = "LVS_LOG_NO_ANSI")]
    /// Disable ANSI colour codes being present in the logs.
    log_no_ansi: bool,
    #[arg(long, env = "LVS_LOG_CATEGORY_LEVEL")]
    /// The syslog level of the root category logger, e.g. `debug` or `warning`.
    log_category_level: Option<LogLevel>,
    #[command(subcommand)]
    command: commands::Commands,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args).context("Init logging")?;

    if let Some(level) = args.log_category_level {
        Logger::root().set_level(Some(level));
    }

    info!("lvs v{}", env!("CARGO_PKG_VERSION"));

    args.command.display_startup_message();

    let stdout = std::io::stdout();
    args.command.execute(&mut stdout.lock())
}
