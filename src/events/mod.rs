//! Engine observability
//!
//! A closed event vocabulary delivered over a lossy broadcast channel,
//! plus a locked execution summary that is correct even with no
//! subscribers.

mod bus;
mod summary;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventEmitter, Observer, create_observer};
pub use summary::ExecutionSummary;
pub use types::{Event, EventKind, FileChange};
