//! Nova feed - real-time token feed ingestion and list partitioning
//! Built with Domain-Driven Design principles

pub mod domain;
pub mod infrastructure;
pub mod application;
pub mod shared;

// Re-export main types for convenience
pub use application::{FeedPipeline, FeedRunner, MemoryListStore, PauseFlags, PipelineConfig};
pub use domain::feed::{Classifier, ListStore, PauseState};
pub use infrastructure::websocket::ConnectionManager;
pub use shared::types::{Category, MessageKind, TokenUpdateMessage};
