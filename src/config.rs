use std::fs;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::LayoutConfig;
use crate::models::{Probabilities, StartParams};
use crate::polling::{Backoff, PollPolicy};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Parser, Debug)]
#[command(
    name = "sim-timeline",
    version,
    about = "Run queue simulations remotely and lay out their customer timeline"
)]
pub struct Args {
    /// TOML or JSON file with base_url, [layout] and [poll] settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Simulation service address, e.g. http://127.0.0.1:5000
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a simulation, wait for its result and print the timeline
    Run(RunArgs),
    /// Wait for the simulation that is already running and print the timeline
    Watch(WatchArgs),
    /// Lay out a saved result file without contacting the service
    Layout(LayoutArgs),
    /// Show the service's current status
    Status,
    /// Pause the running simulation
    Pause,
    /// Resume a paused simulation
    Resume,
    /// Stop the running simulation
    Stop,
    /// Restore the service's default parameters
    Restore,
    /// Print the effective configuration
    ShowConfig,
}

#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    /// Total simulated ticks
    #[arg(long, allow_negative_numbers = true)]
    pub tiempo: Option<i64>,
    /// Arrival probabilities for A,M,B, e.g. 0.1,0.05,0.02
    #[arg(long, value_parser = parse_probabilities)]
    pub prob_llegada: Option<Probabilities>,
    /// Service probabilities for A,M,B, e.g. 0.7,0.6,0.5
    #[arg(long, value_parser = parse_probabilities)]
    pub prob_servicio: Option<Probabilities>,
    #[command(flatten)]
    pub poll: PollArgs,
    #[arg(long, value_enum, default_value_t = FormatArg::Human)]
    pub format: FormatArg,
}

impl RunArgs {
    pub fn start_params(&self) -> StartParams {
        StartParams {
            tiempo: self.tiempo,
            prob_llegada: self.prob_llegada,
            prob_servicio: self.prob_servicio,
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub poll: PollArgs,
    #[arg(long, value_enum, default_value_t = FormatArg::Human)]
    pub format: FormatArg,
}

#[derive(ClapArgs, Debug, Default)]
pub struct PollArgs {
    /// Delay between result polls
    #[arg(long)]
    pub interval_ms: Option<u64>,
    /// Give up after this many result polls
    #[arg(long)]
    pub max_attempts: Option<u32>,
    /// Grow the delay by this factor after every pending poll
    #[arg(long)]
    pub backoff_factor: Option<f64>,
    /// Upper bound for the grown delay
    #[arg(long, requires = "backoff_factor")]
    pub backoff_max_ms: Option<u64>,
}

#[derive(ClapArgs, Debug)]
pub struct LayoutArgs {
    /// JSON result as returned by /simulacion/result
    #[arg(long)]
    pub input: PathBuf,
    /// Override the per-lane row limit
    #[arg(long)]
    pub max_rows: Option<usize>,
    #[arg(long, value_enum, default_value_t = FormatArg::Human)]
    pub format: FormatArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Human,
    Summary,
    Json,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub layout: LayoutConfig,
    pub poll: PollPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            layout: LayoutConfig::default(),
            poll: PollPolicy::default(),
        }
    }
}

pub fn parse_args() -> Result<Args> {
    Args::try_parse().map_err(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => Error::Cli(err.to_string()),
    })
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::ConfigIo(format!(
            "failed to read config '{}': {}",
            path.display(),
            err
        ))
    })?;
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .unwrap_or("");

    match ext {
        "toml" => toml::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse TOML: {}", err))),
        "json" => serde_json::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse JSON: {}", err))),
        "" => Err(Error::UnsupportedConfigFormat("unknown".to_string())),
        _ => Err(Error::UnsupportedConfigFormat(ext.to_string())),
    }
}

/// Merges the config file (if any) with command-line overrides.
pub fn build_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    match &args.command {
        Command::Run(run) => apply_poll_args(&mut config.poll, &run.poll),
        Command::Watch(watch) => apply_poll_args(&mut config.poll, &watch.poll),
        Command::Layout(layout) => {
            if let Some(max_rows) = layout.max_rows {
                config.layout.max_rows_per_lane = max_rows;
            }
        }
        _ => {}
    }

    config.poll.validate()?;
    Ok(config)
}

pub fn render_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config)
        .map_err(|err| Error::ConfigParse(format!("failed to render TOML: {}", err)))
}

fn apply_poll_args(policy: &mut PollPolicy, args: &PollArgs) {
    if let Some(interval_ms) = args.interval_ms {
        policy.interval_ms = interval_ms;
    }
    if let Some(max_attempts) = args.max_attempts {
        policy.max_attempts = Some(max_attempts);
    }
    if let Some(factor) = args.backoff_factor {
        let max_interval_ms = args
            .backoff_max_ms
            .unwrap_or_else(|| policy.interval_ms.saturating_mul(10));
        policy.backoff = Backoff::Exponential {
            factor,
            max_interval_ms,
        };
    }
}

fn parse_probabilities(input: &str) -> std::result::Result<Probabilities, String> {
    let values = input
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", part.trim()))
        })
        .collect::<std::result::Result<Vec<f64>, String>>()?;
    match values.as_slice() {
        [a, m, b] => Ok(Probabilities {
            a: *a,
            m: *m,
            b: *b,
        }),
        _ => Err(format!(
            "expected three comma-separated values for A,M,B (got '{}')",
            input
        )),
    }
}
