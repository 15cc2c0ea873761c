//! Application layer - the feed pipeline and the loop that drives it

pub mod feed_pipeline;
pub mod feed_runner;
pub mod list_store;

pub use feed_pipeline::{FeedPipeline, FeedStats, FlushReport, PipelineConfig};
pub use feed_runner::{FeedRunner, StopReason};
pub use list_store::{MemoryListStore, PauseFlags};
