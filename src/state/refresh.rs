//! Refresh timer.
//!
//! A timer thread that never touches the tree: every tick it only raises a
//! shared flag. The host loop consumes the flag and refreshes nodes on the
//! main thread.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use spark_panels::state::refresh::RefreshTimer;
//!
//! let mut timer = RefreshTimer::start("tasks", Duration::from_millis(5));
//! std::thread::sleep(Duration::from_millis(50));
//! assert!(timer.take());
//! timer.stop();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

/// Periodic "refresh requested" signal.
#[derive(Debug)]
pub struct RefreshTimer {
    name: String,
    requested: Arc<AtomicBool>,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshTimer {
    /// Spawn the timer thread.
    pub fn start(name: impl Into<String>, interval: Duration) -> Self {
        let name = name.into();
        let requested = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let flag = requested.clone();
        let thread_name = format!("refresh-{name}");
        let spawned = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => flag.store(true, Ordering::Release),
                    // Stop requested or the owner is gone.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(timer = %name, op = "start", error = %err, "could not spawn refresh thread");
                None
            }
        };
        debug!(timer = %name, interval_ms = interval.as_millis() as u64, "refresh timer started");

        Self {
            name,
            requested,
            stop: Some(stop_tx),
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consume a pending tick.
    pub fn take(&self) -> bool {
        self.requested.swap(false, Ordering::AcqRel)
    }

    /// Raise the flag by hand (e.g. a refresh key).
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop and join the thread. Idempotent.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(timer = %self.name, op = "stop", "refresh thread panicked");
            }
            debug!(timer = %self.name, "refresh timer stopped");
        }
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
