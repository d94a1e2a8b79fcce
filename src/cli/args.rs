//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tethered camera photobooth: live preview, on-demand capture, automatic downloads
#[derive(Parser, Debug)]
#[command(name = "photobooth")]
#[command(version)]
#[command(about = "Tethered camera photobooth: live preview, on-demand capture, automatic downloads", long_about = None)]
#[command(after_help = "Signals while running:\n  SIGUSR1  capture a full-resolution image\n  SIGUSR2  reload camera settings\n  SIGTERM  stop (as does Ctrl+C)")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for preview and captured images (overrides config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Hide the banner and live status line
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the capture loop (the default)
    Run,

    /// Show current configuration
    ShowConfig,

    /// Generate a configuration file at a specific location
    GenerateConfig {
        /// Output path for the config file (defaults to standard location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
