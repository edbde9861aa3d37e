//! `stockloop` — run N random stock events through the event bus.
//!
//! # Usage
//!
//! ```bash
//! # 20 events over 3 machines, recursive dispatch
//! stockloop
//!
//! # Breadth-first dispatch, JSON summary on stdout
//! stockloop --mode queue --events 100 --json
//!
//! # Same, configured from the environment
//! STOCKLOOP_MODE=queue STOCKLOOP_EVENTS=100 stockloop --json
//! ```

use anyhow::{Context, Result};
use clap::Parser;

use stockloop_events::DispatchMode;
use stockloop_observability::LogFormat;
use stockloop_sim::{Driver, RunSummary, SimConfig};

/// Command-line arguments (each overrides the matching STOCKLOOP_* variable)
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of random root events to generate
    #[arg(long)]
    events: Option<usize>,

    /// Number of machines (ids 1..=N)
    #[arg(long)]
    machines: Option<usize>,

    /// Starting stock for every machine
    #[arg(long, allow_hyphen_values = true)]
    initial_stock: Option<i64>,

    /// Seed for the event generator
    #[arg(long)]
    seed: Option<u64>,

    /// Dispatch discipline: `recursive` or `queue`
    #[arg(long)]
    mode: Option<DispatchMode>,

    /// Maximum cascade depth before follow-ups are dropped
    #[arg(long)]
    max_depth: Option<usize>,

    /// Low-stock threshold
    #[arg(long, allow_hyphen_values = true)]
    threshold: Option<i64>,

    /// Print the run summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Print the full delivery trace as JSON
    #[arg(long, default_value_t = false)]
    trace: bool,

    /// Log format on stderr: `compact` or `json`
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,
}

impl Args {
    fn apply(&self, config: &mut SimConfig) {
        if let Some(events) = self.events {
            config.events = events;
        }
        if let Some(machines) = self.machines {
            config.machines = machines;
        }
        if let Some(initial_stock) = self.initial_stock {
            config.initial_stock = initial_stock;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(max_depth) = self.max_depth {
            config.max_cascade_depth = max_depth;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{} dispatch: {} events delivered ({} truncated, max depth {})",
        summary.mode, summary.delivered, summary.truncated, summary.max_depth
    );
    for (kind, count) in &summary.by_kind {
        println!("  {kind:<18} {count}");
    }
    println!("final stock:");
    for (id, stock) in &summary.final_stock {
        println!("  machine {id:<10} {stock}");
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    stockloop_observability::init(args.log_format);

    let mut config = SimConfig::from_env().context("reading STOCKLOOP_* environment")?;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let driver = Driver::from_config(&config)?;
    let report = driver.run(driver.random_source(&config));

    if args.trace {
        println!("{}", serde_json::to_string_pretty(report.dispatch())?);
    } else if args.json {
        println!("{}", serde_json::to_string_pretty(report.summary())?);
    } else {
        print_summary(report.summary());
    }
    Ok(())
}
