use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use orbit_roster::config::Config;
use orbit_roster::elements::{load_catalog_file, parse_with_limit, DEFAULT_DECAY_LIMIT_MINUTES};
use orbit_roster::propagation::Sgp4Propagator;
use orbit_roster::roster::{Reconciler, RenderEvent};
use orbit_roster::scheduler::{Clock, LiveScheduler, RenderBatch, SimulatedClock, SystemClock};

#[derive(Parser)]
#[command(name = "orbit-roster")]
#[command(about = "Live positions for a catalog of orbiting objects")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every element set in a catalog file
    Validate { catalog: PathBuf },
    /// Print one set of positions as JSON
    Snapshot {
        catalog: PathBuf,
        /// RFC 3339 instant, defaults to now
        #[arg(long)]
        at: Option<String>,
        /// Element sets older than this are treated as decayed
        #[arg(long, default_value = "14days")]
        max_element_age: String,
    },
    /// Track a catalog live according to a config file
    Run { config: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { catalog } => validate(&catalog),
        Commands::Snapshot {
            catalog,
            at,
            max_element_age,
        } => snapshot(&catalog, at.as_deref(), &max_element_age),
        Commands::Run { config } => run(&config),
    }
}

fn validate(path: &Path) -> ExitCode {
    let records = match load_catalog_file(path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error loading catalog: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut skipped = 0;
    for record in &records {
        if let Err(e) = parse_with_limit(record, DEFAULT_DECAY_LIMIT_MINUTES) {
            println!("  {}: {}", record.name, e);
            skipped += 1;
        }
    }

    println!(
        "{} element sets, {} valid, {} skipped",
        records.len(),
        records.len() - skipped,
        skipped
    );
    if skipped == records.len() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn snapshot(path: &Path, at: Option<&str>, max_element_age: &str) -> ExitCode {
    let at = match at.map(DateTime::parse_from_rfc3339).transpose() {
        Ok(at) => at.map_or_else(Utc::now, |t| t.with_timezone(&Utc)),
        Err(e) => {
            eprintln!("Invalid --at: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let max_age = match humantime::parse_duration(max_element_age) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Invalid --max-element-age: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let records = match load_catalog_file(path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error loading catalog: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut reconciler = Reconciler::new(Sgp4Propagator, max_age.as_secs_f64() / 60.0);
    let diff = reconciler.refresh(&records, at);

    match serde_json::to_string_pretty(&diff.samples) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Serialization error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(path: &Path) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run_live(config))
}

async fn run_live(config: Config) -> ExitCode {
    let records = match load_catalog_file(&config.catalog.path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error loading catalog: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let reconciler = Reconciler::new(Sgp4Propagator, config.propagation.decay_limit_minutes());
    let clock: Arc<dyn Clock> = if config.scheduler.time_scale == 1.0 {
        Arc::new(SystemClock)
    } else {
        Arc::new(SimulatedClock::new(Utc::now(), config.scheduler.time_scale))
    };
    let (mut scheduler, mut events) =
        match LiveScheduler::new(reconciler, clock, config.scheduler.tick_interval) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Scheduler error: {}", e);
                return ExitCode::FAILURE;
            }
        };

    scheduler.refresh(&records);
    if let Err(e) = scheduler.start() {
        eprintln!("Scheduler error: {}", e);
        return ExitCode::FAILURE;
    }

    let mut reload = tokio::time::interval(config.catalog.reload_interval);
    // The first tick fires immediately; the catalog was just loaded.
    reload.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted, shutting down");
                break;
            }
            _ = reload.tick() => {
                match load_catalog_file(&config.catalog.path) {
                    Ok(records) => {
                        scheduler.refresh(&records);
                    }
                    Err(e) => log::warn!("Catalog reload failed, keeping current roster: {}", e),
                }
            }
            Some(batch) = events.recv() => log_batch(&batch),
        }
    }

    scheduler.stop().await;
    ExitCode::SUCCESS
}

fn log_batch(batch: &RenderBatch) {
    let (mut created, mut updated, mut held, mut removed) = (0, 0, 0, 0);
    for event in &batch.events {
        match event {
            RenderEvent::Created { .. } => created += 1,
            RenderEvent::Updated { .. } => updated += 1,
            RenderEvent::Hold { .. } => held += 1,
            RenderEvent::Removed { .. } => removed += 1,
        }
        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(event) {
                log::trace!("{}", json);
            }
        }
    }
    log::debug!(
        "{}: {} created, {} updated, {} held, {} removed",
        batch.at,
        created,
        updated,
        held,
        removed
    );
}
