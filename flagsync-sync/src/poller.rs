//! Background poll loops.
//!
//! Each loop waits one interval, observes the shutdown signal, and then
//! runs its sync step. A sync step already running when shutdown is
//! requested is allowed to finish and commit; the loop exits on its next
//! wake. Callers should allow up to one interval for a loop to stop.

use futures::future::join_all;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Owns the shutdown signal and the spawned loop tasks.
pub(crate) struct Poller {
    shutdown_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl Poller {
    pub(crate) fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Claims the right to spawn loops. Returns false after the first call.
    pub(crate) fn try_start(&self) -> bool {
        !self.started.swap(true, Ordering::AcqRel)
    }

    /// Spawns a loop running `step` every `interval`, first after one interval.
    pub(crate) fn spawn<F, Fut>(&self, name: &'static str, interval: Duration, step: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(run_loop(name, interval, shutdown_rx, step));
        self.handles.lock().push(handle);
    }

    /// Requests cooperative shutdown of every loop.
    pub(crate) fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub(crate) fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Waits for every spawned loop to exit.
    pub(crate) async fn join(&self) {
        let handles: Vec<_> = std::mem::take(&mut *self.handles.lock());
        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!(error = %e, "Poll loop panicked");
            }
        }
    }
}

async fn run_loop<F, Fut>(
    name: &'static str,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
    step: F,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = ()>,
{
    if *shutdown_rx.borrow_and_update() {
        return;
    }

    let mut timer = tokio::time::interval_at(Instant::now() + interval, interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        poller = name,
        interval_ms = interval.as_millis() as u64,
        "Starting poll loop"
    );

    loop {
        tokio::select! {
            _ = timer.tick() => {
                if *shutdown_rx.borrow() {
                    break;
                }
                step().await;
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    debug!(poller = name, "Poll loop stopped");
}
