//! Review Sessions
//!
//! A session batches graded answers for one learner. Recording a result is
//! the only path that couples sessions to the queue: it completes the entry
//! and appends the result under the same learner lock.

mod lifecycle;
mod model;

pub use lifecycle::ReviewSessions;
pub use model::{ResultInput, ReviewResult, ReviewSession};
