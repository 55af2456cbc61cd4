//! Memory management core.
//!
//! Provides:
//! - Physical memory devices with per-frame ownership tracking
//! - The legacy two-level and the hierarchical five-level translators
//! - Per-process virtual memory areas and break-pointer growth
//! - Frame allocation and raw page copy between devices
//!
//! # Principles
//! - Translation layers check bounds; devices trust their callers
//! - Frame ownership records arbitrate every access to shared frames
//! - Structural mutation is serialized; state-changing failures leave
//!   the caller-visible state unchanged

pub mod address;
pub mod context;
pub mod error;
pub mod frame;
pub mod legacy;
pub mod phys;
pub mod pte;
pub mod radix;
pub mod swap;
pub mod vma;

pub use address::{PhysAddr, VirtAddr, PAGE_SIZE};
pub use context::{MemContext, TableRoot, TranslationMode};
pub use error::MemError;
pub use frame::{allocate_frames, FrameList};
pub use phys::{PhysMem, Pid};
pub use pte::{Pte, PteFlags};
pub use radix::{map_range, PageDirectory};
pub use swap::copy_page;
pub use vma::{Region, Vma};
