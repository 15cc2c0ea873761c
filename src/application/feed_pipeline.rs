//! Token feed ingestion pipeline: classify, buffer and dispatch live updates

use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use tracing::{debug, info, trace, warn};
use crate::domain::feed::{
    Classifier, ClassifierConfig, Clock, DispatchOutcome, FlushTimer, ListStore, MessageQueue,
    PauseAwareDispatcher, PauseState, PausedBuffers,
};
use crate::infrastructure::websocket::{decode_frame, InboundFrame};
use crate::shared::types::{Category, TokenUpdateMessage};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub flush_interval: Duration,
    pub classifier: ClassifierConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_millis(1000),
            classifier: ClassifierConfig::default(),
        }
    }
}

/// Running counters for one pipeline instance
#[derive(Debug, Clone)]
pub struct FeedStats {
    pub started_at: DateTime<Utc>,
    pub frames_received: u64,
    pub control_frames: u64,
    pub malformed_frames: u64,
    pub enqueued: u64,
    pub applied: u64,
    pub paused: u64,
    pub unclassified: u64,
    pub store_failures: u64,
    pub flushes: u64,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl FeedStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            frames_received: 0,
            control_frames: 0,
            malformed_frames: 0,
            enqueued: 0,
            applied: 0,
            paused: 0,
            unclassified: 0,
            store_failures: 0,
            flushes: 0,
            last_message_at: None,
        }
    }

    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    pub fn log_summary(&self) {
        info!(
            uptime_secs = self.uptime().num_seconds(),
            frames = self.frames_received,
            control = self.control_frames,
            malformed = self.malformed_frames,
            enqueued = self.enqueued,
            applied = self.applied,
            paused = self.paused,
            unclassified = self.unclassified,
            store_failures = self.store_failures,
            flushes = self.flushes,
            last_message_at = ?self.last_message_at,
            "Feed statistics"
        );
    }
}

impl Default for FeedStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one queue flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub applied: usize,
    pub paused: usize,
    pub unclassified: usize,
    pub failed: usize,
}

impl FlushReport {
    pub fn total(&self) -> usize {
        self.applied + self.paused + self.unclassified + self.failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Routed {
    Applied,
    Paused,
    Unclassified,
    Failed,
}

/// One feed pipeline instance.
///
/// Owns the holding queue, the paused buffers and the flush timer for as long
/// as it lives. The live lists belong to the `ListStore` it writes into.
/// All methods run to completion on the caller's task, so nothing here is
/// locked.
pub struct FeedPipeline<S, P> {
    classifier: Classifier,
    queue: MessageQueue,
    dispatcher: PauseAwareDispatcher,
    timer: FlushTimer,
    clock: Arc<dyn Clock>,
    store: S,
    pause: P,
    stats: FeedStats,
    disposed: bool,
}

impl<S: ListStore, P: PauseState> FeedPipeline<S, P> {
    pub fn new(config: PipelineConfig, store: S, pause: P, clock: Arc<dyn Clock>) -> Self {
        Self {
            classifier: Classifier::new(config.classifier),
            queue: MessageQueue::new(),
            dispatcher: PauseAwareDispatcher::new(),
            timer: FlushTimer::new(config.flush_interval),
            clock,
            store,
            pause,
            stats: FeedStats::new(),
            disposed: false,
        }
    }

    /// Arms the flush timer, replacing any earlier schedule
    pub fn start(&mut self) {
        self.disposed = false;
        self.timer.arm(self.clock.now());
        debug!(interval_ms = self.timer.period().as_millis() as u64, "Flush timer armed");
    }

    /// Entry point for raw text frames off the socket
    pub fn handle_frame(&mut self, raw: &str) {
        if self.disposed {
            return;
        }
        self.stats.frames_received += 1;

        match decode_frame(raw) {
            Ok(InboundFrame::Control) => {
                self.stats.control_frames += 1;
                trace!("Control frame ignored");
            }
            Ok(InboundFrame::Token(message)) => {
                self.stats.last_message_at = Some(Utc::now());
                self.ingest(message);
            }
            Err(e) => {
                self.stats.malformed_frames += 1;
                warn!(error = %e, "Dropping malformed feed payload");
            }
        }
    }

    /// Queues the update for the next flush or routes it right away
    pub fn ingest(&mut self, message: TokenUpdateMessage) {
        if self.disposed {
            return;
        }

        if self.queue.should_enqueue(&message) {
            trace!(mint = %message.mint, "Queued until next flush");
            self.queue.push(message, self.clock.now());
            self.stats.enqueued += 1;
        } else {
            self.route(message);
        }
    }

    /// Flushes if the timer deadline has passed
    pub fn poll_flush(&mut self) -> Option<FlushReport> {
        if self.disposed || !self.timer.fire_if_due(self.clock.now()) {
            return None;
        }
        Some(self.flush())
    }

    /// Routes everything queued at this moment, in insertion order.
    ///
    /// A failed store write is logged and the rest of the batch still goes out.
    pub fn flush(&mut self) -> FlushReport {
        let batch = self.queue.take_snapshot();
        self.stats.flushes += 1;

        let mut report = FlushReport::default();
        for queued in batch {
            match self.route(queued.message) {
                Routed::Applied => report.applied += 1,
                Routed::Paused => report.paused += 1,
                Routed::Unclassified => report.unclassified += 1,
                Routed::Failed => report.failed += 1,
            }
        }

        if report.total() > 0 {
            debug!(
                applied = report.applied,
                paused = report.paused,
                unclassified = report.unclassified,
                failed = report.failed,
                "Queue flushed"
            );
        }
        report
    }

    fn route(&mut self, message: TokenUpdateMessage) -> Routed {
        let Some(category) = self.classifier.classify(&message) else {
            debug!(mint = %message.mint, dex = %message.dex, progress = message.progress, "No list matches update");
            self.stats.unclassified += 1;
            return Routed::Unclassified;
        };

        let mint = message.mint.clone();
        match self.dispatcher.dispatch(category, message, &mut self.store, &self.pause) {
            Ok(DispatchOutcome::Applied) => {
                self.stats.applied += 1;
                Routed::Applied
            }
            Ok(DispatchOutcome::Paused) => {
                self.stats.paused += 1;
                Routed::Paused
            }
            Err(e) => {
                self.stats.store_failures += 1;
                warn!(%mint, %category, error = %e, "List store rejected update, dropping it");
                Routed::Failed
            }
        }
    }

    /// Hands back the category's held-back tokens, newest first, for merging
    pub fn drain_paused(&mut self, category: Category) -> Vec<TokenUpdateMessage> {
        self.dispatcher.drain_paused(category)
    }

    pub fn paused(&self) -> &PausedBuffers {
        self.dispatcher.paused()
    }

    pub fn flush_interval(&self) -> Duration {
        self.timer.period()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// How long the oldest queued update has been waiting
    pub fn oldest_queued_age(&self) -> Option<Duration> {
        self.queue.oldest_age(self.clock.now())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Stops the timer and drops pending state. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.timer.disarm();

        let dropped = self.queue.len();
        self.queue.clear();
        self.dispatcher.clear();
        debug!(dropped_queued = dropped, "Feed pipeline disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::list_store::{MemoryListStore, PauseFlags};
    use crate::domain::feed::ManualClock;
    use crate::shared::errors::StoreError;

    fn pipeline(clock: &ManualClock) -> (FeedPipeline<MemoryListStore, PauseFlags>, PauseFlags) {
        let flags = PauseFlags::new();
        let mut pipeline = FeedPipeline::new(
            PipelineConfig::default(),
            MemoryListStore::new(50),
            flags.clone(),
            Arc::new(clock.clone()),
        );
        pipeline.start();
        (pipeline, flags)
    }

    fn frame(mint: &str, dex: &str, progress: f64, kind: &str) -> String {
        serde_json::json!({
            "data": { "mint": mint, "dex": dex, "progress": progress, "type": kind }
        })
        .to_string()
    }

    #[test]
    fn test_new_tokens_dispatch_immediately() {
        let clock = ManualClock::new();
        let (mut pipeline, _) = pipeline(&clock);

        pipeline.handle_frame(&frame("A", "PumpFun", 5.0, "new"));
        pipeline.handle_frame(&frame("B", "Raydium", 3.0, "new"));

        assert_eq!(pipeline.queue_len(), 0);
        assert!(pipeline.store().contains(Category::NewlyCreated, "A"));
        assert!(pipeline.store().contains(Category::Graduated, "B"));
        assert_eq!(pipeline.stats().applied, 2);
    }

    #[test]
    fn test_queue_flushes_once_per_interval() {
        let clock = ManualClock::new();
        let (mut pipeline, _) = pipeline(&clock);

        pipeline.handle_frame(&frame("A", "PumpFun", 12.0, "update"));
        pipeline.handle_frame(&frame("B", "PumpSwap", 100.0, "update"));
        pipeline.handle_frame(&frame("C", "PumpFun", 4.0, "update"));
        assert_eq!(pipeline.queue_len(), 3);
        assert!(pipeline.poll_flush().is_none());

        clock.advance(Duration::from_millis(400));
        assert_eq!(pipeline.oldest_queued_age(), Some(Duration::from_millis(400)));
        assert!(pipeline.poll_flush().is_none());
        clock.advance(Duration::from_millis(600));
        let report = pipeline.poll_flush().unwrap();

        assert_eq!(report, FlushReport { applied: 3, ..FlushReport::default() });
        assert_eq!(pipeline.queue_len(), 0);
        assert_eq!(pipeline.store().list(Category::AboutToGraduate).len(), 1);
        assert_eq!(pipeline.store().list(Category::Graduated).len(), 1);
        assert_eq!(pipeline.store().list(Category::NewlyCreated).len(), 1);

        assert!(pipeline.poll_flush().is_none());
        clock.advance(Duration::from_secs(1));
        assert_eq!(pipeline.poll_flush().unwrap().total(), 0);
        assert_eq!(pipeline.stats().applied, 3);
    }

    #[test]
    fn test_live_updates_do_not_duplicate() {
        let clock = ManualClock::new();
        let (mut pipeline, _) = pipeline(&clock);

        pipeline.handle_frame(&frame("A", "PumpFun", 12.0, "new"));
        pipeline.handle_frame(&frame("A", "PumpFun", 14.0, "new"));

        let list = pipeline.store().list(Category::AboutToGraduate);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].progress, 14.0);
        assert_eq!(pipeline.store().changed_count(Category::AboutToGraduate), 2);
    }

    #[test]
    fn test_hovered_list_diverts_unknown_tokens() {
        let clock = ManualClock::new();
        let (mut pipeline, flags) = pipeline(&clock);
        pipeline.handle_frame(&frame("A", "PumpFun", 2.0, "new"));

        flags.set_hovered(Category::NewlyCreated, true);
        pipeline.handle_frame(&frame("B", "PumpFun", 1.0, "new"));
        pipeline.handle_frame(&frame("A", "PumpFun", 3.0, "new"));

        let live: Vec<&str> = pipeline
            .store()
            .list(Category::NewlyCreated)
            .iter()
            .map(|t| t.mint.as_str())
            .collect();
        assert_eq!(live, vec!["A"]);
        assert_eq!(pipeline.store().get(Category::NewlyCreated, "A").unwrap().progress, 3.0);
        assert_eq!(pipeline.paused().head(Category::NewlyCreated).unwrap().mint, "B");

        flags.set_hovered(Category::NewlyCreated, false);
        let held = pipeline.drain_paused(Category::NewlyCreated);
        let added = pipeline.store_mut().merge_paused(Category::NewlyCreated, held);
        assert_eq!(added, 1);
        assert_eq!(pipeline.store().len(Category::NewlyCreated), 2);
        assert!(pipeline.paused().is_empty(Category::NewlyCreated));
    }

    #[test]
    fn test_tutorial_pauses_flush_dispatch() {
        let clock = ManualClock::new();
        let (mut pipeline, flags) = pipeline(&clock);
        flags.set_tutorial_active(Category::AboutToGraduate, true);

        pipeline.handle_frame(&frame("A", "PumpFun", 30.0, "update"));
        clock.advance(Duration::from_secs(1));
        let report = pipeline.poll_flush().unwrap();

        assert_eq!(report.paused, 1);
        assert!(pipeline.store().list(Category::AboutToGraduate).is_empty());
        assert_eq!(pipeline.paused().len(Category::AboutToGraduate), 1);
    }

    #[test]
    fn test_converged_images_bypass_queue() {
        let clock = ManualClock::new();
        let (mut pipeline, _) = pipeline(&clock);
        let with_image = |progress: f64| {
            TokenUpdateMessage::new("A", "PumpFun", progress, "update".to_string().into()).with_image("a.png")
        };

        pipeline.ingest(with_image(11.0));
        pipeline.ingest(with_image(12.0));

        assert_eq!(pipeline.queue_len(), 1);
        assert_eq!(pipeline.store().get(Category::AboutToGraduate, "A").unwrap().progress, 12.0);
    }

    #[test]
    fn test_control_and_malformed_frames_are_dropped() {
        let clock = ManualClock::new();
        let (mut pipeline, _) = pipeline(&clock);

        pipeline.handle_frame("success");
        pipeline.handle_frame("Ping");
        pipeline.handle_frame("{\"data\": 42}");
        pipeline.handle_frame("garbage");
        pipeline.handle_frame(&frame("A", "PumpFun", 5.0, "new"));

        let stats = pipeline.stats();
        assert_eq!(stats.frames_received, 5);
        assert_eq!(stats.control_frames, 2);
        assert_eq!(stats.malformed_frames, 2);
        assert_eq!(stats.applied, 1);
        assert!(stats.last_message_at.is_some());
    }

    struct RejectingStore {
        inner: MemoryListStore,
        reject: &'static str,
    }

    impl ListStore for RejectingStore {
        fn contains(&self, category: Category, mint: &str) -> bool {
            self.inner.contains(category, mint)
        }

        fn upsert(&mut self, category: Category, message: TokenUpdateMessage) -> Result<(), StoreError> {
            if message.mint == self.reject {
                return Err(StoreError::Unavailable("store offline".to_string()));
            }
            self.inner.upsert(category, message)
        }

        fn bump_changed_count(&mut self, category: Category) {
            self.inner.bump_changed_count(category);
        }
    }

    #[test]
    fn test_store_failure_does_not_halt_flush() {
        let clock = ManualClock::new();
        let store = RejectingStore {
            inner: MemoryListStore::new(10),
            reject: "B",
        };
        let mut pipeline = FeedPipeline::new(PipelineConfig::default(), store, PauseFlags::new(), Arc::new(clock.clone()));
        pipeline.start();

        for mint in ["A", "B", "C"] {
            pipeline.handle_frame(&frame(mint, "PumpFun", 20.0, "update"));
        }
        clock.advance(Duration::from_secs(1));
        let report = pipeline.poll_flush().unwrap();

        assert_eq!(report.applied, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(pipeline.stats().store_failures, 1);
        assert!(pipeline.store().inner.contains(Category::AboutToGraduate, "C"));
        assert!(!pipeline.store().inner.contains(Category::AboutToGraduate, "B"));
    }

    #[test]
    fn test_dispose_is_idempotent_and_silences_pipeline() {
        let clock = ManualClock::new();
        let (mut pipeline, flags) = pipeline(&clock);
        flags.set_hovered(Category::NewlyCreated, true);
        pipeline.handle_frame(&frame("A", "PumpFun", 20.0, "update"));
        pipeline.handle_frame(&frame("B", "PumpFun", 1.0, "new"));

        pipeline.dispose();
        pipeline.dispose();

        assert!(pipeline.is_disposed());
        assert_eq!(pipeline.queue_len(), 0);
        assert!(pipeline.paused().is_empty(Category::NewlyCreated));

        pipeline.handle_frame(&frame("C", "PumpFun", 1.0, "new"));
        clock.advance(Duration::from_secs(5));
        assert!(pipeline.poll_flush().is_none());
        assert!(!pipeline.store().contains(Category::NewlyCreated, "C"));
        assert_eq!(pipeline.stats().frames_received, 2);
    }

    #[test]
    fn test_independent_instances() {
        let clock = ManualClock::new();
        let (mut first, _) = pipeline(&clock);
        let (second, _) = pipeline(&clock);

        first.handle_frame(&frame("A", "PumpFun", 20.0, "update"));
        assert_eq!(first.queue_len(), 1);
        assert_eq!(second.queue_len(), 0);
    }
}
