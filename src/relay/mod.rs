//! Media-group aggregation and relay pipeline

/// Album buffers and debounce-driven flush
pub mod aggregator;
/// Per-update routing
pub mod dispatcher;
/// Scoped transient files
pub mod transient;
/// Single-item relay cycle
pub mod worker;

pub use aggregator::{AlbumState, FlushReport, GroupAggregator};
pub use dispatcher::{DispatchAction, RelayDispatcher};
pub use transient::TransientFile;
pub use worker::{RelayError, RelayOutcome, RelayWorker};
