//! Background refresh of cached weather data.
//!
//! One dedicated tokio task per service re-fetches every cached city on
//! a fixed delay between pass completions, so passes never overlap. The
//! service is restartable and both `start` and `stop` are idempotent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use common::{Error, WeatherFetcher};

use crate::cache::WeatherCache;

/// How long `stop` waits for an in-flight pass before aborting it.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

struct PollingTask {
    stop_tx: watch::Sender<bool>,
    // Closed when the task future is dropped, whether it ran to
    // completion or was aborted. Lets a successor wait the task out.
    done_rx: watch::Receiver<bool>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct TaskSlot {
    task: Option<PollingTask>,
    // Left behind by `stop` while the old task drains its grace period.
    draining: Option<watch::Receiver<bool>>,
}

/// Periodic scheduler that keeps currently cached cities fresh.
pub struct PollingService {
    cache: Arc<WeatherCache>,
    fetcher: Arc<dyn WeatherFetcher>,
    interval: Duration,
    running: AtomicBool,
    // Flag and task slot are only mutated together, under this lock.
    task: Mutex<TaskSlot>,
}

impl PollingService {
    pub fn new(
        cache: Arc<WeatherCache>,
        fetcher: Arc<dyn WeatherFetcher>,
        interval: Duration,
    ) -> Result<Self, Error> {
        if interval.is_zero() {
            return Err(Error::InvalidArgument(
                "polling interval must be a positive duration".to_string(),
            ));
        }
        Ok(Self {
            cache,
            fetcher,
            interval,
            running: AtomicBool::new(false),
            task: Mutex::new(TaskSlot::default()),
        })
    }

    /// Starts the polling task: one pass immediately, then a fixed delay
    /// after each completion. No-op if already running.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&self) {
        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Polling service is already running, ignoring duplicate start call");
            return;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let (done_tx, done_rx) = watch::channel(false);
        let predecessor = slot.draining.take();
        let cache = Arc::clone(&self.cache);
        let fetcher = Arc::clone(&self.fetcher);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            // Dropping this sender closes `done_rx`, even on abort.
            let _done = done_tx;

            // A restart may land while the previous task is still inside
            // its shutdown grace period; passes must never overlap, so
            // wait it out before the first pass.
            if let Some(mut predecessor) = predecessor {
                tokio::select! {
                    _ = predecessor.changed() => {}
                    _ = stop_rx.changed() => return,
                }
            }

            loop {
                run_refresh_pass(&cache, fetcher.as_ref()).await;
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stop_rx.changed() => break,
                }
            }
        });

        slot.task = Some(PollingTask {
            stop_tx,
            done_rx,
            handle,
        });
        info!(
            "Polling service started. Update interval: {}s",
            interval.as_secs()
        );
    }

    /// Stops the polling task: no new pass starts, and an in-flight pass
    /// gets a bounded grace period before being aborted. No-op if
    /// already stopped; the service can be started again afterwards.
    pub async fn stop(&self) {
        let task = {
            let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
            if self
                .running
                .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                debug!("Polling service was already stopped or never started");
                return;
            }
            let task = slot.task.take();
            // Published before the lock drops, so a racing restart sees
            // the old task and waits for it instead of overlapping it.
            slot.draining = task.as_ref().map(|task| task.done_rx.clone());
            task
        };

        let Some(PollingTask {
            stop_tx,
            mut handle,
            ..
        }) = task
        else {
            return;
        };

        info!("Polling service shutting down...");
        let _ = stop_tx.send(true);

        match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
            Ok(_) => info!("Polling service stopped"),
            Err(_) => {
                handle.abort();
                warn!(
                    "Polling pass did not finish within {}s, forcibly terminated",
                    SHUTDOWN_GRACE.as_secs()
                );
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// One refresh pass: drop expired entries, then re-fetch whatever is
/// still cached. A failed city is logged and skipped; nothing a pass
/// does can take the scheduling loop down.
async fn run_refresh_pass(cache: &WeatherCache, fetcher: &dyn WeatherFetcher) {
    cache.purge_expired();

    let cities = cache.cached_cities();
    if cities.is_empty() {
        debug!("Polling: cache is empty, no cities to update");
        return;
    }

    info!("Polling: starting update for {} cities", cities.len());

    for city in cities {
        match fetcher.fetch_current(&city).await {
            Ok(report) => {
                cache.put(&city, report);
                debug!("Polling: updated weather for {}", city);
            }
            Err(e) => {
                warn!("Polling: failed to update weather for {}: {}", city, e);
            }
        }
    }
}
