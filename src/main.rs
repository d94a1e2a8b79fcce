//! Photobooth - CLI Entry Point
//!
//! This binary is a thin wrapper around the library, handling argument parsing,
//! logging setup, signal wiring, and command dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::{info, LevelFilter};
use photobooth::cli::{self, Args, DualWriter};
use photobooth::core::config::Config;
use photobooth::core::triggers::TriggerFlags;
use std::fs::OpenOptions;
use std::io::Write;

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(ref config_path) = args.config {
        match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                Config::default()
            }
        }
    } else {
        Config::load_default().unwrap_or_else(|e| {
            eprintln!("Warning: {}", e);
            Config::default()
        })
    };

    // Apply CLI overrides to config
    if let Some(ref output) = args.output {
        config.output.directory = output.clone();
    }
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }

    let flags = TriggerFlags::new();
    install_signal_handlers(&flags)?;
    init_logging(&config)?;

    info!("Photobooth v{}", photobooth::VERSION);

    // Run the command
    cli::run_command(&args, &config, flags)?;

    Ok(())
}

/// Route process signals to the trigger latches
///
/// SIGUSR1 requests a capture, SIGUSR2 a settings reload. SIGINT and SIGTERM
/// request termination; a second one exits immediately.
fn install_signal_handlers(flags: &TriggerFlags) -> Result<()> {
    #[cfg(unix)]
    {
        use signal_hook::consts::{SIGUSR1, SIGUSR2};
        signal_hook::flag::register(SIGUSR1, flags.capture_latch())
            .context("Failed to register SIGUSR1 handler")?;
        signal_hook::flag::register(SIGUSR2, flags.reload_latch())
            .context("Failed to register SIGUSR2 handler")?;
    }

    let terminate = flags.clone();
    ctrlc::set_handler(move || {
        if terminate.terminate_requested() {
            // Second signal - force exit
            eprintln!("\nForce shutdown requested. Exiting immediately...");
            std::process::exit(1);
        } else {
            terminate.request_terminate();
            eprintln!("\nShutdown requested. Finishing the current step... (Press Ctrl+C again to force quit)");
        }
    })
    .context("Failed to set Ctrl+C handler")?;

    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    if config.logging.log_to_file {
        // Set up logging to both console and file
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.logging.log_file)
            .with_context(|| {
                format!(
                    "Failed to open log file {}",
                    config.logging.log_file.display()
                )
            })?;

        Builder::new()
            .filter_level(log_level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{} {} {}] {}",
                    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .target(env_logger::Target::Pipe(Box::new(DualWriter {
                console: std::io::stderr(),
                file: log_file,
            })))
            .init();

        info!("Logging to file: {}", config.logging.log_file.display());
    } else {
        Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.level))
            .init();
    }

    Ok(())
}
