//! Fixed-interval driver
//!
//! Runs every generator, formats a snapshot from the store and publishes it
//! to the hub. A failed or panicking tick is logged and retried after a
//! longer backoff; only an explicit stop ends the loop.

use chrono::{DateTime, Utc};
use dashboard_core::{DashboardError, DashboardResult};
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::DashboardConfig;
use crate::generator::{generators_from_config, Generator};
use crate::seed::SeedSource;
use crate::series_store::SeriesStore;
use crate::websocket::{BroadcastHub, PublishReport};

/// Lifecycle state reported by health checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Point-in-time scheduler health
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerHealth {
    pub state: SchedulerState,
    pub ticks_completed: u64,
    pub tick_failures: u64,
    pub last_tick_time: Option<DateTime<Utc>>,
    /// Subscribers reached by the most recent publish
    pub last_delivered: u64,
}

/// Lock-free tick counters shared with the health endpoint
#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    running: AtomicBool,
    ticks_completed: AtomicU64,
    tick_failures: AtomicU64,
    last_tick_epoch_ms: AtomicU64,
    last_delivered: AtomicU64,
}

impl SchedulerMetrics {
    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    fn record_tick(&self, report: &PublishReport) {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        self.last_tick_epoch_ms.store(now, Ordering::SeqCst);
        self.last_delivered
            .store(report.delivered as u64, Ordering::SeqCst);
        self.ticks_completed.fetch_add(1, Ordering::SeqCst);
    }

    fn record_failure(&self) {
        self.tick_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn health(&self) -> SchedulerHealth {
        let last_ms = self.last_tick_epoch_ms.load(Ordering::SeqCst);
        let last_tick_time = if last_ms > 0 {
            DateTime::from_timestamp_millis(last_ms as i64)
        } else {
            None
        };

        SchedulerHealth {
            state: if self.is_running() {
                SchedulerState::Running
            } else {
                SchedulerState::Stopped
            },
            ticks_completed: self.ticks_completed.load(Ordering::SeqCst),
            tick_failures: self.tick_failures.load(Ordering::SeqCst),
            last_tick_time,
            last_delivered: self.last_delivered.load(Ordering::SeqCst),
        }
    }
}

/// Drives generators and publishes snapshots on a fixed interval
pub struct Scheduler {
    store: Arc<SeriesStore>,
    hub: Arc<BroadcastHub>,
    generators: Vec<Box<dyn Generator>>,
    tick_interval: Duration,
    retry_backoff: Duration,
    metrics: Arc<SchedulerMetrics>,
}

impl Scheduler {
    pub fn new(
        store: Arc<SeriesStore>,
        hub: Arc<BroadcastHub>,
        generators: Vec<Box<dyn Generator>>,
        tick_interval: Duration,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            store,
            hub,
            generators,
            tick_interval,
            retry_backoff,
            metrics: Arc::new(SchedulerMetrics::default()),
        }
    }

    /// Build a scheduler with the stock, crypto and weather generators
    pub fn from_config(
        config: &DashboardConfig,
        store: Arc<SeriesStore>,
        hub: Arc<BroadcastHub>,
        seeds: Arc<dyn SeedSource>,
    ) -> DashboardResult<Self> {
        let generators = generators_from_config(config, seeds)?;
        Ok(Self::new(
            store,
            hub,
            generators,
            config.tick_interval(),
            config.retry_backoff(),
        ))
    }

    pub fn metrics(&self) -> Arc<SchedulerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run one generate-and-publish cycle
    ///
    /// Stops at the first failing generator; categories already advanced in
    /// this cycle keep their new sample.
    pub async fn tick(&self) -> DashboardResult<PublishReport> {
        for generator in &self.generators {
            let category = generator.category();
            generator.tick(&self.store).await.map_err(|e| match e {
                DashboardError::TickFailure { .. } => e,
                other => DashboardError::tick_failure(category, other.to_string()),
            })?;
        }

        let snapshot = Arc::new(self.store.snapshot());
        Ok(self.hub.publish(snapshot))
    }

    /// Spawn the loop on the current runtime
    pub fn start(self) -> SchedulerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let metrics = self.metrics();
        metrics.set_running(true);

        info!(
            "Starting scheduler: {} generators, tick every {:?}",
            self.generators.len(),
            self.tick_interval
        );
        let task = tokio::spawn(self.run(stop_rx));

        SchedulerHandle {
            stop_tx,
            task,
            metrics,
        }
    }

    async fn run(self, mut stop_rx: watch::Receiver<bool>) {
        loop {
            if *stop_rx.borrow() {
                break;
            }

            let delay = match AssertUnwindSafe(self.tick()).catch_unwind().await {
                Ok(Ok(report)) => {
                    self.metrics.record_tick(&report);
                    debug!(
                        "Tick published: {} delivered, {} dropped, {} disconnected",
                        report.delivered, report.dropped, report.disconnected
                    );
                    self.tick_interval
                }
                Ok(Err(e)) => {
                    self.metrics.record_failure();
                    error!("Tick failed: {}; retrying in {:?}", e, self.retry_backoff);
                    self.retry_backoff
                }
                Err(panic) => {
                    self.metrics.record_failure();
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    error!(
                        "Tick panicked: {}; retrying in {:?}",
                        message, self.retry_backoff
                    );
                    self.retry_backoff
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        warn!("Scheduler stop handle dropped");
                        break;
                    }
                }
            }
        }

        self.metrics.set_running(false);
        info!("Scheduler stopped");
    }
}

/// Handle to a running scheduler
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    metrics: Arc<SchedulerMetrics>,
}

impl SchedulerHandle {
    pub fn metrics(&self) -> Arc<SchedulerMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the loop to stop and wait for the in-flight tick to finish
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            error!("Scheduler task ended abnormally: {}", e);
        }
    }
}
