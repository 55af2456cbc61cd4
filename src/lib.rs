//! vmsim - User-Space Memory-Management Simulator
//!
//! Simulates the memory-management unit of an operating system kernel so
//! a scheduler/syscall layer can let simulated processes allocate, read,
//! write, and free virtual memory without touching physical addresses.
//!
//! # Components
//! - Physical devices: flat byte stores with per-frame ownership records
//! - Translators: a legacy two-level segment/page model and a five-level
//!   hierarchical page table, selected per kernel
//! - VMA manager: per-process region growth with overlap validation
//! - Frame allocator and raw page-copy engine for swap traffic
//!
//! # Concurrency Model
//! Every operation is a blocking, synchronous call. Frame-table mutation
//! is serialized per device; byte I/O takes its own lock and never
//! contends with structural changes. Each process context sits behind
//! one `spin::Mutex`.

pub mod kernel;
pub mod mm;
pub mod process;
pub mod sched;
pub mod syscall;

pub use kernel::{Kernel, ProcHandle};
pub use mm::{MemError, TranslationMode};
pub use process::Pcb;
