//! Recurring ingestion task. One scheduler instance is constructed and
//! owned by the process lifecycle (never a module-level singleton),
//! started and stopped explicitly.

use ingestion::IngestionPipeline;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

pub struct IngestionScheduler {
    pipeline: Arc<IngestionPipeline>,
    interval: Duration,
    stop_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl IngestionScheduler {
    pub fn new(pipeline: Arc<IngestionPipeline>, interval: Duration) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            pipeline,
            interval,
            stop_tx,
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Idempotent: a no-op while the task is already running. Each tick
    /// runs the full pipeline; a failed tick is logged and the loop
    /// continues to the next one.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let _ = self.stop_tx.send(false);
        let pipeline = Arc::clone(&self.pipeline);
        let interval = self.interval;
        let mut stop_rx = self.stop_tx.subscribe();

        self.handle = Some(tokio::spawn(async move {
            tracing::info!(interval_secs = interval.as_secs(), "Ingestion scheduler started");
            loop {
                match pipeline.run().await {
                    Ok(counts) => tracing::info!(
                        news = counts.news,
                        price_events = counts.price_events,
                        derived_events = counts.derived_events,
                        "Scheduler tick completed"
                    ),
                    Err(e) => tracing::error!(error = %e, "Scheduler tick failed, continuing"),
                }

                // Timed wait doubles as the stop check: cancellation
                // latency is bounded by the interval, which is fine for
                // a non-latency-critical shutdown.
                tokio::select! {
                    _ = stop_rx.changed() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            tracing::info!("Ingestion scheduler stopped");
        }));
    }

    /// Signals cooperative cancellation and waits for the in-flight
    /// tick to finish.
    pub async fn stop(&mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}
