//! Status line and console output helpers
//!
//! Key features:
//! - A live status spinner showing loop counters
//! - Consistent visual styling for banners and messages
//! - A dual writer so log lines reach both the console and a log file

use crate::core::booth::LoopStats;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::{Duration, Instant};

// ============================================================================
// Styles - Consistent visual appearance
// ============================================================================

/// Get the spinner style for the running loop
fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷")
}

// ============================================================================
// Console output helpers
// ============================================================================

/// Print a header section with a box
pub fn print_header(title: &str) {
    let width = 68;
    let title_padded = format!("{:^width$}", title, width = width - 4);
    println!();
    println!("╔{}╗", "═".repeat(width - 2));
    println!("║{}║", title_padded);
    println!("╚{}╝", "═".repeat(width - 2));
    println!();
}

/// Print a success message with checkmark
pub fn print_success(msg: &str) {
    println!("  ✓ {}", msg);
}

/// Print an info message with bullet
pub fn print_info(msg: &str) {
    println!("  • {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("  ✗ {}", msg);
}

/// Print the startup banner with the commands that drive the loop
pub fn print_banner(pid: u32, output: &std::path::Path) {
    print_header("PHOTOBOOTH");
    print_info(&format!("Writing to {}", output.display()));
    print_info(&format!("Capture an image:      kill -USR1 {}", pid));
    print_info(&format!("Reload camera config:  kill -USR2 {}", pid));
    print_info(&format!("Stop:                  kill -TERM {}  (or Ctrl+C)", pid));
    println!();
}

// ============================================================================
// Live status line
// ============================================================================

/// Spinner showing the loop counters, redrawn at most every 250ms
pub struct StatusLine {
    spinner: ProgressBar,
    start_time: Instant,
    last_update: Option<Instant>,
    update_interval: Duration,
}

impl StatusLine {
    /// Create a visible status line
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("Waiting for the first preview...");
        Self::with_bar(spinner)
    }

    /// Create a status line that draws nothing
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(spinner: ProgressBar) -> Self {
        Self {
            spinner,
            start_time: Instant::now(),
            last_update: None,
            update_interval: Duration::from_millis(250),
        }
    }

    /// Refresh the message if enough time has passed
    pub fn update(&mut self, stats: &LoopStats) {
        let now = Instant::now();
        if let Some(last) = self.last_update {
            if now.duration_since(last) < self.update_interval {
                return;
            }
        }
        self.last_update = Some(now);
        self.spinner.set_message(status_message(
            stats,
            self.start_time.elapsed(),
        ));
    }

    /// Stop drawing and clear the line
    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new()
    }
}

fn status_message(stats: &LoopStats, elapsed: Duration) -> String {
    let failures = stats.capture_failures + stats.download_failures;
    let mut message = format!(
        "Live: {} previews | {} captured, {} downloaded ({}) | {}",
        stats.previews,
        stats.captures,
        stats.downloads,
        format_bytes(stats.bytes_saved),
        format_duration(elapsed)
    );
    if failures > 0 {
        message.push_str(&format!(" | {} failed", failures));
    }
    message
}

// ============================================================================
// Utility functions
// ============================================================================

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    } else if secs >= 60 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

// ============================================================================
// Dual writer for file + console logging
// ============================================================================

/// A writer that writes to both console and file
///
/// Used for logging to both stderr and a log file simultaneously.
pub struct DualWriter {
    pub console: std::io::Stderr,
    pub file: std::fs::File,
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        // Console output is best-effort
        let _ = self.console.write(buf);
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let _ = self.console.flush();
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 bytes");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(7260)), "2h 1m");
    }

    #[test]
    fn test_status_message() {
        let mut stats = LoopStats {
            previews: 40,
            captures: 2,
            downloads: 1,
            bytes_saved: 2048,
            ..Default::default()
        };
        assert_eq!(
            status_message(&stats, Duration::from_secs(3)),
            "Live: 40 previews | 2 captured, 1 downloaded (2.0 KB) | 3.0s"
        );

        stats.download_failures = 1;
        assert!(status_message(&stats, Duration::from_secs(3)).ends_with("| 1 failed"));
    }

    #[test]
    fn test_hidden_status_line_updates() {
        let mut status = StatusLine::hidden();
        status.update(&LoopStats::default());
        status.finish();
    }
}
