//! Symphony - decomposition of complex tasks and the top-level executor

mod executor;
mod types;

pub use executor::{EngineError, RunOutcome, SymphonyExecutor, Task, TaskAnalysis};
pub use types::{Movement, MovementStatus, Symphony, SymphonyStatus, collapse_display, goals_read_only};
