//! Process Memory Context
//!
//! Everything one process owns about its address space: the page-table
//! root (legacy two-level or hierarchical five-level, chosen at creation),
//! the list of virtual memory areas, and the FIFO of mapped page numbers
//! kept for a future eviction policy.

use std::collections::VecDeque;

use super::address::{PhysAddr, VirtAddr};
use super::error::MemError;
use super::legacy::SegmentTable;
use super::radix::PageDirectory;
use super::vma::Vma;

/// Which translator a context is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationMode {
    /// Flat segment + page tables, linear scan.
    Legacy,
    /// Five-level radix table.
    Hierarchical,
}

/// Root of a context's page table.
pub enum TableRoot {
    Legacy {
        table: SegmentTable,
        /// Process break pointer of the legacy allocator.
        brk: VirtAddr,
    },
    Radix(PageDirectory),
}

/// Memory-management state owned exclusively by one process.
///
/// Dropping the context releases every table node; frames are released
/// separately through the owning device's frame table.
pub struct MemContext {
    pub root: TableRoot,
    /// Areas ordered by ascending id.
    pub vmas: Vec<Vma>,
    /// Mapped page numbers, oldest first.
    pub fifo_pgn: VecDeque<u64>,
}

impl MemContext {
    /// Create a context with an empty table and the default VMA 0 at
    /// address zero.
    pub fn new(mode: TranslationMode) -> Self {
        let root = match mode {
            TranslationMode::Legacy => TableRoot::Legacy {
                table: SegmentTable::new(),
                brk: VirtAddr::new(0),
            },
            TranslationMode::Hierarchical => TableRoot::Radix(PageDirectory::empty()),
        };
        Self {
            root,
            vmas: vec![Vma::new(0, VirtAddr::new(0))],
            fifo_pgn: VecDeque::new(),
        }
    }

    /// The translator this context was built for.
    pub fn mode(&self) -> TranslationMode {
        match self.root {
            TableRoot::Legacy { .. } => TranslationMode::Legacy,
            TableRoot::Radix(_) => TranslationMode::Hierarchical,
        }
    }

    /// Resolve a virtual address through whichever translator the
    /// context carries.
    pub fn translate(&self, addr: VirtAddr) -> Result<PhysAddr, MemError> {
        match &self.root {
            TableRoot::Legacy { table, .. } => table.translate(addr),
            TableRoot::Radix(dir) => dir.translate(addr),
        }
    }

    fn radix(&self) -> Result<&PageDirectory, MemError> {
        match &self.root {
            TableRoot::Radix(dir) => Ok(dir),
            TableRoot::Legacy { .. } => Err(MemError::NotFound),
        }
    }

    fn radix_mut(&mut self) -> Result<&mut PageDirectory, MemError> {
        match &mut self.root {
            TableRoot::Radix(dir) => Ok(dir),
            TableRoot::Legacy { .. } => Err(MemError::NotFound),
        }
    }

    /// Mark a page resident in a frame. Fails when the context carries
    /// no hierarchical root.
    pub fn set_frame(&mut self, pgn: u64, fpn: usize) -> Result<(), MemError> {
        self.radix_mut().map(|dir| dir.set_frame(pgn, fpn))
    }

    /// Mark a page swapped out. Fails when the context carries no
    /// hierarchical root.
    pub fn set_swapped(
        &mut self,
        pgn: u64,
        swap_type: u8,
        swap_offset: u64,
    ) -> Result<(), MemError> {
        self.radix_mut()
            .map(|dir| dir.set_swapped(pgn, swap_type, swap_offset))
    }

    /// Raw packed-word read of a leaf entry; missing root or path reads
    /// as zero.
    pub fn read_entry(&self, pgn: u64) -> u32 {
        self.radix().map_or(0, |dir| dir.read_entry(pgn))
    }

    /// Raw packed-word write of a leaf entry, building the path.
    pub fn write_entry(&mut self, pgn: u64, word: u32) -> Result<(), MemError> {
        self.radix_mut().map(|dir| dir.write_entry(pgn, word))
    }

    /// Build the table path for a range of pages without mapping frames.
    pub fn ensure_range(&mut self, base: VirtAddr, count: usize) -> Result<(), MemError> {
        self.radix_mut().map(|dir| dir.ensure_range(base, count))
    }
}
