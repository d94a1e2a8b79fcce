//! Core functionality module
//!
//! This module contains the capture loop and everything it drives:
//! configuration, error types, trigger flags, the capture controller, the
//! event drain and the file sink.
//!
//! # Submodules
//!
//! - `booth` - The capture loop and its statistics
//! - `capture` - Full and preview captures, image numbering
//! - `config` - Configuration loading, saving, and management
//! - `drain` - Hardware event drain
//! - `error` - Error types and result aliases
//! - `settings` - Camera settings reload
//! - `sink` - Device file to local file transfer
//! - `summary` - Session summary written at shutdown
//! - `triggers` - Flags set from signal handlers

pub mod booth;
pub mod capture;
pub mod config;
pub mod drain;
pub mod error;
pub mod settings;
pub mod sink;
pub mod summary;
pub mod triggers;
