//! Karasu Config Host - reference host for the karasu-config registry.
//!
//! Starts a plugin registry, registers the plugin's default configs, waits
//! for Ctrl-C and saves everything on the way out.

mod configs;
mod plugin;

use anyhow::{Context, Result};
use clap::Parser;
use configs::{ExampleConfig, Profile};
use karasu_config::{BatchReport, ConfigRegistry};
use plugin::ExamplePlugin;
use std::path::PathBuf;
use std::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "karasu-config-host")]
#[command(about = "Reference host for the Karasu config registry")]
struct Args {
    /// Plugin name, used for the folder of ungrouped configs
    #[arg(short, long, default_value = "ExamplePlugin")]
    name: String,

    /// Plugin data folder (defaults to <data dir>/karasu/plugins/<name>)
    #[arg(long)]
    data_root: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Stop right after startup instead of waiting for Ctrl-C
    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Karasu config host");

    let data_root = match args.data_root {
        Some(path) => path,
        None => dirs::data_dir()
            .or_else(|| std::env::current_dir().ok())
            .context("Could not determine a data directory")?
            .join("karasu")
            .join("plugins")
            .join(&args.name),
    };
    info!("Data root: {}", data_root.display());

    let plugin = ExamplePlugin::new(args.name, data_root);
    let registry = ConfigRegistry::from_host(&plugin).build()?;

    log_report("Startup", &registry.on_start()?);

    let config = registry.get_by_type::<ExampleConfig>()?;
    match config.read() {
        Ok(value) => info!(
            "exampleString={} exampleInt={} exampleBoolean={}",
            value.example_string, value.example_int, value.example_boolean
        ),
        Err(_) => warn!("Example config lock is poisoned"),
    }

    let profiles: Vec<Profile> = registry.load_list("profiles.json")?;
    info!("Loaded {} profiles", profiles.len());

    if !args.once {
        let (tx, rx) = mpsc::channel();
        ctrlc::set_handler(move || {
            let _ = tx.send(());
        })
        .context("Failed to install Ctrl-C handler")?;

        info!("Running, press Ctrl-C to stop");
        // A dropped sender means the handler is gone; stop either way
        let _ = rx.recv();
        info!("Shutdown signal received");
    }

    log_report("Shutdown", &registry.on_stop()?);
    Ok(())
}

fn log_report(phase: &str, report: &BatchReport) {
    info!(
        "{}: {} of {} configs ok",
        phase,
        report.success_count(),
        report.len()
    );
    for (file_name, err) in report.failures() {
        warn!("{}: {} failed: {}", phase, file_name, err);
    }
}
