//! `hse`: operator CLI over a file-backed HSE record store.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use hse_pulse::alerts::classify;
use hse_pulse::bus::ChangeBus;
use hse_pulse::metrics::{format_critical, format_snapshot, DateWindow, PipelineStatus, Snapshot};
use hse_pulse::records::{check_value, Domain, Incident};
use hse_pulse::{
    Aggregator, FileBackend, HseConfig, LiveAggregator, RecordStore, SerialGenerator, StoreWatcher,
};

/// Environment variable holding the log filter.
const LOG_ENV_VAR: &str = "HSE_LOG";

#[derive(Parser, Debug)]
#[command(name = "hse")]
#[command(about = "Safety KPIs, critical incidents and serial numbers for an HSE record store")]
#[command(version)]
struct Cli {
    /// Directory holding the register files (overrides the settings file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute and print the KPI snapshot
    Snapshot {
        #[command(flatten)]
        window: WindowArgs,

        /// Date elapsed-day KPIs are measured to (default: the window end, --to)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Print JSON instead of Markdown
        #[arg(long)]
        json: bool,
    },

    /// List critical incidents, newest first
    Critical {
        /// Show at most this many
        #[arg(long, short = 'n')]
        limit: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Print the suggested serial for a new record
    NextSerial {
        /// Register key, e.g. incident_report
        domain: Domain,
    },

    /// Append one record given as a JSON object
    Add {
        domain: Domain,
        record: String,
    },

    /// Recompute the snapshot whenever a register changes, until Ctrl-C
    Watch {
        #[command(flatten)]
        window: WindowArgs,
    },

    /// Print the effective settings as TOML
    Settings,
}

#[derive(clap::Args, Debug)]
struct WindowArgs {
    /// First day of the window (default: --to minus the configured window length)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Day after the last day of the window (default: tomorrow)
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl WindowArgs {
    fn resolve(&self, settings: &HseConfig) -> Result<DateWindow> {
        let today = Utc::now().date_naive();
        let end = self.to.unwrap_or(today + Duration::days(1));
        let window = match self.from {
            Some(start) => DateWindow::new(start, end),
            None => DateWindow::ending_at(end, settings.default_window_days),
        };
        window.context("invalid reporting window")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut settings = HseConfig::load(cli.config.as_deref()).context("loading settings")?;
    if let Some(data_dir) = cli.data_dir {
        settings = settings.with_data_dir(data_dir);
    }

    match cli.command {
        Command::Snapshot { window, as_of, json } => {
            snapshot(&settings, window.resolve(&settings)?, as_of, json).await
        }
        Command::Critical { limit, json } => critical(&settings, limit, json).await,
        Command::NextSerial { domain } => next_serial(&settings, domain).await,
        Command::Add { domain, record } => add(&settings, domain, &record).await,
        Command::Watch { window } => watch(&settings, window.resolve(&settings)?).await,
        Command::Settings => {
            print!("{}", settings.to_toml_string()?);
            Ok(())
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(settings: &HseConfig, bus: ChangeBus) -> Result<(FileBackend, RecordStore)> {
    let backend = FileBackend::new(&settings.data_dir)
        .with_context(|| format!("opening data dir {}", settings.data_dir.display()))?;
    let store = RecordStore::new(backend.clone(), bus);
    Ok((backend, store))
}

async fn snapshot(
    settings: &HseConfig,
    window: DateWindow,
    as_of: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let (_, store) = open_store(settings, ChangeBus::new())?;
    let aggregator = Aggregator::new(store)
        .with_hours_worked(settings.hours_worked)
        .with_as_of(as_of.unwrap_or(window.end));

    let snapshot = aggregator.compute(window).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", format_snapshot(&snapshot));
    }

    if snapshot.status == PipelineStatus::Error {
        bail!(
            "snapshot failed: {}",
            snapshot.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    Ok(())
}

async fn critical(settings: &HseConfig, limit: Option<usize>, json: bool) -> Result<()> {
    let (_, store) = open_store(settings, ChangeBus::new())?;
    let incidents = store
        .read::<Incident>()
        .await
        .context("reading incidents")?;

    let mut critical = classify(&incidents);
    if let Some(limit) = limit {
        critical.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&critical)?);
    } else {
        print!("{}", format_critical(&critical));
    }
    Ok(())
}

async fn next_serial(settings: &HseConfig, domain: Domain) -> Result<()> {
    let (_, store) = open_store(settings, ChangeBus::new())?;
    println!("{}", SerialGenerator::new(store).next(domain).await);
    Ok(())
}

async fn add(settings: &HseConfig, domain: Domain, record: &str) -> Result<()> {
    let mut value: Value = serde_json::from_str(record).context("record is not valid JSON")?;
    let Some(fields) = value.as_object_mut() else {
        bail!("record must be a JSON object");
    };

    let (_, store) = open_store(settings, ChangeBus::new())?;
    let now = Utc::now();
    fields
        .entry("id")
        .or_insert_with(|| json!(now.timestamp_millis()));
    fields
        .entry("createdAt")
        .or_insert_with(|| json!(now.to_rfc3339()));
    if !fields.contains_key(domain.serial_field()) {
        let serial = SerialGenerator::new(store.clone()).next(domain).await;
        fields.insert(domain.serial_field().to_string(), json!(serial));
    }

    let summary = format!(
        "added {} record id={} {}={}",
        domain,
        fields["id"],
        domain.serial_field(),
        fields[domain.serial_field()]
    );
    check_value(domain, &value)
        .with_context(|| format!("record is not a valid {} record", domain))?;
    store
        .append_value(domain, value)
        .await
        .with_context(|| format!("writing {}", domain))?;
    println!("{}", summary);
    Ok(())
}

async fn watch(settings: &HseConfig, window: DateWindow) -> Result<()> {
    let bus = ChangeBus::new();
    let (backend, store) = open_store(settings, bus.clone())?;
    let aggregator = Aggregator::new(store)
        .with_hours_worked(settings.hours_worked)
        .with_as_of(window.end);

    let watcher = StoreWatcher::new(backend, bus.clone(), settings.watch_interval())
        .with_domains(aggregator.domains());
    watcher.start().await;

    let live = LiveAggregator::spawn(aggregator, &bus, window);
    let mut updates = live.subscribe();
    let color = std::io::stdout().is_terminal();
    let initial = updates.borrow_and_update().clone();
    print_update(&initial, color);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_update(&snapshot, color);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    live.shutdown().await;
    watcher.stop().await;
    Ok(())
}

fn print_update(snapshot: &Snapshot, color: bool) {
    let stamp = Utc::now().format("%H:%M:%S").to_string();
    match snapshot.status {
        PipelineStatus::Ready => {
            let header = format!("[{}] ready", stamp);
            if color {
                println!("{}", header.green().bold());
            } else {
                println!("{}", header);
            }
            print!("{}", format_snapshot(snapshot));
        }
        PipelineStatus::Error => {
            let header = format!(
                "[{}] error: {}",
                stamp,
                snapshot.error.as_deref().unwrap_or("unknown error")
            );
            if color {
                println!("{}", header.red().bold());
            } else {
                println!("{}", header);
            }
        }
        PipelineStatus::Loading | PipelineStatus::Idle => {}
    }
}
