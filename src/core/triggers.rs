//! Process-wide trigger latches
//!
//! The signal layer owns the write side (`request_*`), the capture loop owns
//! the read side (`take_*`). Setters are single atomic stores, so they are
//! safe to call from a signal handler: no locks, no allocation.
//!
//! # Ordering
//!
//! A setter stores `true` with `Release`; the loop consumes the latch with a
//! `swap(false, AcqRel)`. The swap that observes a store synchronizes with it,
//! and because the read and the clear are the same atomic operation, a
//! request made after the swap is never wiped out by it. Two requests that
//! both land before one swap coalesce into a single trigger.
//!
//! The latches are `Arc<AtomicBool>` so they can be handed directly to
//! `signal_hook::flag::register`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The trigger latches shared between the signal layer and the capture loop
#[derive(Debug, Clone, Default)]
pub struct TriggerFlags {
    capture: Arc<AtomicBool>,
    reload: Arc<AtomicBool>,
    terminate: Arc<AtomicBool>,
}

impl TriggerFlags {
    /// Create a fresh set of latches, all clear
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to take a full-resolution capture
    pub fn request_capture(&self) {
        self.capture.store(true, Ordering::Release);
    }

    /// Ask the loop to reload camera settings
    pub fn request_reload(&self) {
        self.reload.store(true, Ordering::Release);
    }

    /// Ask the loop to stop after the current step
    pub fn request_terminate(&self) {
        self.terminate.store(true, Ordering::Release);
    }

    /// Consume a pending capture request
    pub fn take_capture(&self) -> bool {
        self.capture.swap(false, Ordering::AcqRel)
    }

    /// Consume a pending reload request
    pub fn take_reload(&self) -> bool {
        self.reload.swap(false, Ordering::AcqRel)
    }

    /// Whether termination was requested. Not consumed: once set, it stays set.
    pub fn terminate_requested(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }

    /// Raw latch for the capture request
    pub fn capture_latch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.capture)
    }

    /// Raw latch for the reload request
    pub fn reload_latch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.reload)
    }

    /// Raw latch for the termination request
    pub fn terminate_latch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.terminate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_flags_start_clear() {
        let flags = TriggerFlags::new();
        assert!(!flags.take_capture());
        assert!(!flags.take_reload());
        assert!(!flags.terminate_requested());
    }

    #[test]
    fn test_take_consumes_once() {
        let flags = TriggerFlags::new();
        flags.request_capture();

        assert!(flags.take_capture());
        assert!(!flags.take_capture());
    }

    #[test]
    fn test_flags_are_independent() {
        let flags = TriggerFlags::new();
        flags.request_reload();

        assert!(!flags.take_capture());
        assert!(flags.take_reload());
        assert!(!flags.terminate_requested());
    }

    #[test]
    fn test_double_request_coalesces() {
        let flags = TriggerFlags::new();
        flags.request_capture();
        flags.request_capture();

        assert!(flags.take_capture());
        assert!(!flags.take_capture());
    }

    #[test]
    fn test_terminate_is_sticky() {
        let flags = TriggerFlags::new();
        flags.request_terminate();

        assert!(flags.terminate_requested());
        assert!(flags.terminate_requested());
    }

    #[test]
    fn test_latch_shares_state() {
        let flags = TriggerFlags::new();
        flags.capture_latch().store(true, Ordering::SeqCst);
        assert!(flags.take_capture());

        flags.terminate_latch().store(true, Ordering::SeqCst);
        assert!(flags.terminate_requested());
    }

    #[test]
    fn test_request_from_another_thread() {
        let flags = TriggerFlags::new();
        let writer = flags.clone();

        thread::spawn(move || writer.request_capture())
            .join()
            .unwrap();

        assert!(flags.take_capture());
    }
}
