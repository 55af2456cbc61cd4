//! System Call Interface
//!
//! The dispatch surface between simulated processes and the memory core.
//! An opcode in the first register selects the operation; the caller is
//! identified by pid and looked up across the scheduler queues.

mod handler;

pub use handler::{sys_memmap, MemOp, SysRegs};
