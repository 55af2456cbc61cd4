//! Scheduler-facing structures.
//!
//! Only the queue contract lives here; picking which process runs is the
//! caller's business.

pub mod queue;

pub use queue::{ProcQueue, MAX_QUEUE_SIZE};
