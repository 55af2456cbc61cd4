//! Memory Subsystem Errors
//!
//! One taxonomy shared by every translation and allocation path. All
//! failures are reported to the immediate caller as `Result` values;
//! nothing in this crate aborts a simulated process on error.

use thiserror::Error;

/// Error type for translation, allocation, and VMA operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemError {
    /// Translation miss, missing VMA, or missing memory context.
    #[error("address or object not found")]
    NotFound,
    /// Address space or virtual limit exceeded.
    #[error("address out of range")]
    OutOfRange,
    /// Requested growth intersects another VMA of the same process.
    #[error("virtual memory areas overlap")]
    Overlap,
    /// Physical memory exhausted.
    #[error("insufficient free frames")]
    InsufficientFrames,
    /// Free or write attempted by a process that does not own the frame.
    #[error("frame ownership mismatch")]
    OwnershipMismatch,
}
