//! Cooperative cancellation
//!
//! The engine accepts a [`CancellationToken`] from the caller and checks it
//! at every suspension point: before LLM calls, before subprocess waits,
//! and before checkpoint writes. Checkpoints are never written on
//! cancelled attempts.

pub use tokio_util::sync::CancellationToken;

/// Error returned from cancelled operations
#[derive(Debug, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Check a token, returning `Err(Cancelled)` when cancellation was requested
pub fn check(token: &CancellationToken) -> Result<(), Cancelled> {
    if token.is_cancelled() { Err(Cancelled) } else { Ok(()) }
}
