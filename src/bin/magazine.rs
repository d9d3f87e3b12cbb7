//! Magazine Conveyor command-line interface
//!
//! Drives the allocator from the terminal:
//! - Run search over an ad-hoc occupancy pattern
//! - Allocation against a configured magazine, with a slot grid
//! - Effective configuration dump
//!
//! # Examples
//!
//! ```bash
//! # Search a pattern (F = free, T = taken)
//! magazine find --pattern FTTF --circular --run-length 2
//!
//! # Allocate three runs of 4 in a rotary magazine of 20 slots
//! magazine allocate --slots 20 --circular --run-length 4 --count 3
//!
//! # Force a linear magazine even when the config file says rotary
//! magazine --config magazine.toml allocate --circular false
//!
//! # Show the configuration after file and environment overrides
//! magazine --config magazine.toml config
//! ```

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use magazine_conveyor::magazine::{find_run, AllocationResult, Conveyor, SlotView};
use magazine_conveyor::{metrics, MagazineConfig};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Widest row of the slot grid
const MAX_COLUMNS: usize = 50;

/// Magazines larger than this get a summary instead of a grid
const GRID_LIMIT: usize = 500;

/// Magazine Conveyor - contiguous slot allocation
#[derive(Parser, Debug)]
#[command(name = "magazine")]
#[command(version = magazine_conveyor::VERSION)]
#[command(about = "Magazine Conveyor - contiguous slot allocation", long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "MAGAZINE_CONFIG")]
    config: Option<PathBuf>,

    /// Log directory path (file logging is off when unset)
    #[arg(long, global = true, env = "MAGAZINE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn", env = "MAGAZINE_LOG_LEVEL")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search an occupancy pattern for a free run
    Find(FindArgs),

    /// Allocate runs in a freshly configured magazine
    Allocate(AllocateArgs),

    /// Print the effective configuration as TOML
    Config,

    /// Show version
    Version,
}

/// Run search arguments
#[derive(Args, Debug)]
struct FindArgs {
    /// Occupancy pattern: F/0/. for free, T/1/X for taken
    #[arg(short, long)]
    pattern: String,

    /// Treat the last position as adjacent to the first
    #[arg(short, long)]
    circular: bool,

    /// Length of the run
    #[arg(short = 'k', long, default_value = "3", value_parser = parse_run_length)]
    run_length: usize,
}

/// Allocation arguments
#[derive(Args, Debug)]
struct AllocateArgs {
    /// Number of slots (overrides config)
    #[arg(short, long)]
    slots: Option<usize>,

    /// Rotary (`--circular`, `--circular true`) or linear (`--circular false`);
    /// overrides config
    #[arg(short, long, num_args = 0..=1, default_missing_value = "true")]
    circular: Option<bool>,

    /// Run length per request (overrides config)
    #[arg(short = 'k', long, value_parser = parse_run_length)]
    run_length: Option<usize>,

    /// Number of slots, from the front, that take part in allocation
    #[arg(long)]
    capacity: Option<usize>,

    /// Number of allocation requests
    #[arg(short = 'n', long, default_value = "1")]
    count: usize,

    /// Print results and slots as JSON
    #[arg(long)]
    json: bool,

    /// Print Prometheus metrics after allocating
    #[arg(long)]
    metrics: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli)?;

    // Execute command
    match &cli.command {
        Commands::Find(args) => find_command(args),
        Commands::Allocate(args) => allocate_command(&cli, args),
        Commands::Config => config_command(&cli),
        Commands::Version => {
            println!("Magazine Conveyor {}", magazine_conveyor::VERSION);
            Ok(())
        }
    }
}

/// Setup logging with console output and optional rolling files
fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);

    let file_layer = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, "magazine.log");
            Some(fmt::layer().with_writer(file_appender).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color),
        )
        .with(file_layer)
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    Ok(())
}

fn parse_run_length(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("run length must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Parse an occupancy pattern into taken flags
fn parse_pattern(pattern: &str) -> anyhow::Result<Vec<bool>> {
    pattern
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| match c {
            'F' | 'f' | '0' | '.' => Ok(false),
            'T' | 't' | '1' | 'X' | 'x' | '#' => Ok(true),
            other => bail!("Invalid pattern character '{}'", other),
        })
        .collect()
}

/// Find command - search a pattern without a magazine
fn find_command(args: &FindArgs) -> anyhow::Result<()> {
    let occupancy = parse_pattern(&args.pattern)?;
    debug!(len = occupancy.len(), circular = args.circular, "Searching pattern");

    match find_run(&occupancy, args.circular, args.run_length) {
        Some(start) => println!("{}", start),
        None => {
            println!("-1");
            eprintln!(
                "There are not enough free positions for {} needed places.",
                args.run_length
            );
        }
    }
    Ok(())
}

/// Allocate command - configure a magazine and request runs
fn allocate_command(cli: &Cli, args: &AllocateArgs) -> anyhow::Result<()> {
    let mut config = MagazineConfig::load(cli.config.as_deref())?;
    apply_overrides(&mut config, args);
    config.validate()?;

    metrics::init_metrics();
    let mut conveyor = Conveyor::new(&config)?;
    info!(?config, "Magazine ready");

    let results = (0..args.count)
        .map(|_| conveyor.allocate_default())
        .collect::<Result<Vec<AllocationResult>, _>>()?;
    let events = conveyor.take_events();

    if args.json {
        let output = serde_json::json!({
            "results": results,
            "stats": conveyor.stats(),
            "slots": conveyor.snapshot(),
            "events": events,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for result in &results {
            println!("{}", result);
        }
        println!();
        print!("{}", render_slots(&conveyor.snapshot(), config.circular));
    }

    if args.metrics {
        print!("{}", metrics::export_metrics());
    }
    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration
fn apply_overrides(config: &mut MagazineConfig, args: &AllocateArgs) {
    if let Some(slots) = args.slots {
        config.total_slots = slots;
    }
    if let Some(circular) = args.circular {
        config.circular = circular;
    }
    if let Some(run_length) = args.run_length {
        config.run_length = run_length;
    }
    if args.capacity.is_some() {
        config.active_capacity = args.capacity;
    }
}

/// Config command - print the effective configuration
fn config_command(cli: &Cli) -> anyhow::Result<()> {
    let config = MagazineConfig::load(cli.config.as_deref())?;
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Render slots as a grid: `#` occupied, `.` free, `-` hidden
fn render_slots(slots: &[SlotView], circular: bool) -> String {
    let occupied = slots.iter().filter(|slot| slot.occupied).count();
    let visible = slots.iter().filter(|slot| slot.visible).count();
    let kind = if circular { "rotary" } else { "linear" };
    let mut out = format!(
        "{} magazine: {} slots, {} visible, {} occupied\n",
        kind,
        slots.len(),
        visible,
        occupied
    );

    if slots.len() > GRID_LIMIT {
        out.push_str(&format!("(grid hidden above {} slots)\n", GRID_LIMIT));
        return out;
    }

    for row in slots.chunks(MAX_COLUMNS) {
        let line: String = row
            .iter()
            .map(|slot| match (slot.visible, slot.occupied) {
                (false, _) => '-',
                (true, true) => '#',
                (true, false) => '.',
            })
            .collect();
        out.push_str(&line);
        out.push('\n');
    }
    out
}
