// ddlog - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Config discovery and logging initialisation
// 3. Mode selection (tail, stats, patterns, list)
// 4. Exit status: 0 on success, 1 on any reported error

use clap::Parser;
use ddlog::app::oneshot::{run_oneshot, Mode, Report};
use ddlog::app::tail::{SystemClock, TailSettings, Tailer};
use ddlog::core::format::{OutputFormat, RenderOptions, Renderer};
use ddlog::core::model::QueryWindow;
use ddlog::core::pattern::LogMine;
use ddlog::core::query::QuerySpec;
use ddlog::platform::config::{load_config, AppConfig};
use ddlog::platform::datadog::DatadogClient;
use ddlog::util::constants::{
    APP_VERSION, DEFAULT_ENVIRONMENT, DEFAULT_LEVELS, DEFAULT_LOOKBACK_MINUTES,
    MAX_LOOKBACK_MINUTES,
};
use ddlog::util::error::{DdlogError, Result};
use ddlog::util::logging;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// ddlog - query, tail and summarise Datadog logs from the terminal.
///
/// Builds an `@environment:<env> status:(<levels>)` query over the last N
/// minutes and prints the matching entries, a per-minute count, or the most
/// common message patterns. `--tail` keeps polling for new entries.
#[derive(Parser, Debug)]
#[command(name = "ddlog", version, about)]
struct Cli {
    /// Environment tag: test, stage, prod.
    #[arg(long, default_value = DEFAULT_ENVIRONMENT)]
    env: String,

    /// Status levels to query: info, warn, error. Single or comma separated.
    #[arg(long, default_value = DEFAULT_LEVELS)]
    levels: String,

    /// Free-text part of the query, matched as a quoted phrase.
    #[arg(long, default_value = "")]
    query: String,

    /// Search the last N minutes (at most 30 days).
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_MINUTES,
          value_parser = clap::value_parser!(i64).range(1..=MAX_LOOKBACK_MINUTES))]
    mins: i64,

    /// Print per-minute counts instead of entries.
    #[arg(long)]
    stats: bool,

    /// Print a delimiter line after each entry.
    #[arg(long)]
    delim: bool,

    /// Keep polling for new entries.
    #[arg(long)]
    tail: bool,

    /// Send an empty query: every environment, level and message.
    #[arg(long)]
    all: bool,

    /// Also show each timestamp in the local time zone.
    #[arg(long)]
    local: bool,

    /// Summarise messages into patterns (0 = strictest, 3 = loosest).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
    pattern: Option<u8>,

    /// Output format: text, json or csv.
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Config file (default: ./config.json, then ~/.ddlog/config.json).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging level may come from the config, so the config is loaded first
    // and its errors go straight to stderr.
    let (config, warnings) = match load_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(cli.debug, config.log_level.as_deref());

    tracing::info!(
        version = APP_VERSION,
        config = %config.path.display(),
        "ddlog starting"
    );
    for warning in &warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }
    tracing::debug!(?config, "Configuration loaded");

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "ddlog failed");
            eprintln!("ERROR {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &AppConfig) -> Result<()> {
    let client = DatadogClient::from_config(config)?;
    tracing::debug!(endpoint = client.endpoint(), "Client ready");

    let query = QuerySpec {
        environment: cli.env.clone(),
        levels: cli.levels.clone(),
        text: cli.query.clone(),
        all: cli.all,
    }
    .build();
    tracing::info!(query = %query, mins = cli.mins, "Query built");

    let mut renderer = Renderer::new(RenderOptions {
        format: cli.format,
        delimiter: cli.delim,
        local_time: cli.local,
    });

    let mode = Mode::select(cli.tail, cli.stats, cli.pattern);
    tracing::debug!(?mode, "Mode selected");

    if mode == Mode::Tail {
        let settings = TailSettings::new(
            config.tail_poll_interval,
            config.tail_overlap_secs,
            config.tail_retry_budget,
        );
        let tailer = Tailer::new(
            &client,
            SystemClock,
            renderer,
            io::stdout().lock(),
            io::stderr(),
            query,
            settings,
        );
        let state = tailer.initial_state(cli.mins);
        let summary = tailer.run(state)?;
        return Err(DdlogError::TailExhausted {
            attempts: summary.failures,
        });
    }

    // Built before the query so a bad variable regex fails without a request.
    let miner = match mode {
        Mode::Patterns(_) => Some(LogMine::new(&config.pattern_variables)?),
        _ => None,
    };
    let report = match (mode, miner.as_ref()) {
        (Mode::Patterns(level), Some(miner)) => Report::Patterns {
            level,
            clusterer: miner,
        },
        (Mode::Stats, _) => Report::Stats,
        _ => Report::List,
    };

    let window = QueryWindow::lookback(chrono::Utc::now(), cli.mins);
    let mut out = io::stdout().lock();
    let count = run_oneshot(&client, &query, &window, report, &mut renderer, &mut out)?;
    tracing::info!(entries = count, "Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["ddlog"]).unwrap();
        assert_eq!(cli.env, "prod");
        assert_eq!(cli.levels, "error");
        assert_eq!(cli.query, "");
        assert_eq!(cli.mins, 15);
        assert_eq!(cli.pattern, None);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.tail && !cli.stats && !cli.all && !cli.local && !cli.delim);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "ddlog", "--env", "stage", "--levels", "warn,error", "--query", "timeout", "--mins",
            "60", "--pattern", "2", "--format", "csv", "--local", "--delim",
        ])
        .unwrap();
        assert_eq!(cli.env, "stage");
        assert_eq!(cli.levels, "warn,error");
        assert_eq!(cli.mins, 60);
        assert_eq!(cli.pattern, Some(2));
        assert_eq!(cli.format, OutputFormat::Csv);
        assert!(cli.local && cli.delim);
    }

    #[test]
    fn test_pattern_level_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["ddlog", "--pattern", "4"]).is_err());
    }

    #[test]
    fn test_non_positive_minutes_rejected() {
        assert!(Cli::try_parse_from(["ddlog", "--mins", "0"]).is_err());
    }

    #[test]
    fn test_oversized_minutes_rejected() {
        let max = MAX_LOOKBACK_MINUTES.to_string();
        let cli = Cli::try_parse_from(["ddlog", "--mins", max.as_str()]).unwrap();
        assert_eq!(cli.mins, MAX_LOOKBACK_MINUTES);
        let _ = QueryWindow::lookback(chrono::Utc::now(), cli.mins);

        let over = (MAX_LOOKBACK_MINUTES + 1).to_string();
        assert!(Cli::try_parse_from(["ddlog", "--mins", over.as_str()]).is_err());
        assert!(Cli::try_parse_from(["ddlog", "--mins", "1000000000000"]).is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["ddlog", "--format", "yaml"]).is_err());
    }
}
