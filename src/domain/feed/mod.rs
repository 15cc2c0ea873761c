//! Feed domain - classification, buffering and pause-aware dispatch of token updates

mod classifier;
mod clock;
mod dispatcher;
mod queue;

pub use classifier::{
    Classifier, ClassifierConfig, DEFAULT_ABOUT_TO_GRADUATE_PROGRESS, DEFAULT_DEX_ALLOWLIST,
    DEFAULT_NEWLY_CREATED_MAX_PROGRESS,
};
pub use clock::{Clock, FlushTimer, ManualClock, SystemClock};
pub use dispatcher::{DispatchOutcome, ListStore, PauseAwareDispatcher, PauseState, PausedBuffers};
pub use queue::{MessageQueue, QueuedMessage};
