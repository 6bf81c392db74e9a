//! Flush Scheduler
//!
//! A dedicated thread that flushes on a fixed interval until told to stop.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};

use crate::error::Result;

/// Something the scheduler can flush periodically
pub trait FlushTarget: Send + Sync + 'static {
    /// Task name for logging
    fn name(&self) -> &'static str {
        "memtable-flush"
    }

    /// Flush now; an empty buffer must be a no-op
    fn flush_now(&self) -> Result<()>;
}

/// Handle to the background flush thread
///
/// `shutdown` (or dropping the handle) signals the thread and joins it.
pub struct FlushScheduler {
    interval: Duration,
    shutdown_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FlushScheduler {
    /// Spawn the flush loop
    pub fn start<T: FlushTarget>(target: Arc<T>, interval: Duration) -> Result<Self> {
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("segkv-flush".to_string())
            .spawn(move || run_loop(target, interval, shutdown_rx))?;

        tracing::debug!(interval_ms = interval.as_millis() as u64, "flush scheduler started");

        Ok(Self {
            interval,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stop the loop and wait for an in-flight flush to finish
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Dropping the sender disconnects the channel and wakes the loop
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("flush scheduler thread panicked");
            }
        }
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop<T: FlushTarget>(target: Arc<T>, interval: Duration, shutdown_rx: Receiver<()>) {
    let ticker = channel::tick(interval);
    let mut run_id = 0u64;

    loop {
        channel::select! {
            recv(ticker) -> _ => {
                run_id += 1;
                if let Err(e) = target.flush_now() {
                    tracing::error!(task = target.name(), run_id, error = %e, "Task execution failed");
                }
            }
            recv(shutdown_rx) -> _ => {
                tracing::info!(task = target.name(), "Task shutting down");
                break;
            }
        }
    }
}
