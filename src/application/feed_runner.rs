//! Event loop binding the socket, the flush timer and the pipeline

use std::future::Future;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use crate::domain::feed::{ListStore, PauseState};
use crate::infrastructure::websocket::ConnectionManager;
use crate::shared::errors::AppError;
use super::feed_pipeline::{FeedPipeline, FeedStats};

/// Why the runner stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    FeedClosed,
    SocketError,
}

/// Drives one connection and one pipeline on a single task.
///
/// Socket frames, flush ticks and stats ticks are handled one at a time, so
/// the pipeline is never touched concurrently.
pub struct FeedRunner<S, P> {
    connection: ConnectionManager,
    pipeline: FeedPipeline<S, P>,
    stats_interval: Duration,
}

impl<S: ListStore, P: PauseState> FeedRunner<S, P> {
    pub fn new(connection: ConnectionManager, pipeline: FeedPipeline<S, P>, stats_interval: Duration) -> Self {
        Self {
            connection,
            pipeline,
            stats_interval,
        }
    }

    pub fn pipeline(&self) -> &FeedPipeline<S, P> {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut FeedPipeline<S, P> {
        &mut self.pipeline
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Connects, then processes the feed until `shutdown` resolves or the feed ends.
    ///
    /// Never reconnects. Teardown always runs: reader detached, socket closed,
    /// then the pipeline disposed.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<StopReason, AppError>
    where
        F: Future<Output = ()>,
    {
        self.connection.connect().await?;
        self.pipeline.start();

        let reason = self.event_loop(shutdown).await;

        self.connection.disconnect().await;
        self.pipeline.dispose();
        self.pipeline.stats().log_summary();
        info!(?reason, "Feed runner stopped");
        Ok(reason)
    }

    async fn event_loop<F>(&mut self, shutdown: F) -> StopReason
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        // the flush timer was armed just before this ticker starts, so every
        // tick lands at or after the pipeline's deadline
        let flush_period = self.pipeline.flush_interval();
        let mut flush_ticker = interval_at(Instant::now() + flush_period, flush_period);
        flush_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut stats_ticker = interval_at(Instant::now() + self.stats_interval, self.stats_interval);
        stats_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    return StopReason::Shutdown;
                }
                _ = flush_ticker.tick() => {
                    self.pipeline.poll_flush();
                }
                _ = stats_ticker.tick() => {
                    self.pipeline.stats().log_summary();
                    debug!(
                        queued = self.pipeline.queue_len(),
                        oldest_queued_ms = self.pipeline.oldest_queued_age().map(|age| age.as_millis() as u64),
                        "Queue status"
                    );
                }
                frame = self.connection.next_frame() => match frame {
                    Some(Ok(text)) => self.pipeline.handle_frame(&text),
                    Some(Err(e)) => {
                        error!(error = %e, "Token feed failed, not reconnecting");
                        return StopReason::SocketError;
                    }
                    None => {
                        warn!(endpoint = %self.connection.endpoint(), "Token feed ended");
                        return StopReason::FeedClosed;
                    }
                },
            }
        }
    }

    pub fn stats(&self) -> &FeedStats {
        self.pipeline.stats()
    }
}
