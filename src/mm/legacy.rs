//! Legacy Two-Level Translator
//!
//! The simple translation model: a per-process segment table whose entries
//! point at second-level page tables. Both levels are ordered-insertion
//! lists scanned linearly; on duplicate indices the FIRST match wins, and
//! that tie-break is part of the contract; do not replace the scan with a
//! keyed map.
//!
//! Freeing releases the frame chain but deliberately leaves the table
//! entries in place; the read/write paths re-validate the target frame
//! against the ownership table instead.

use log::{debug, warn};

use super::address::{PhysAddr, VirtAddr, LEGACY_ADDR_LIMIT, PAGE_SIZE};
use super::error::MemError;
use super::phys::{PhysMem, Pid};

/// One mapping in a second-level table.
#[derive(Debug, Clone, Copy)]
struct PageEntry {
    /// Page index within the segment.
    v_index: u64,
    /// Physical frame backing the page.
    p_index: usize,
}

/// One entry of the first-level table, owning its second-level table.
#[derive(Debug)]
struct SegmentEntry {
    v_index: u64,
    pages: Vec<PageEntry>,
}

/// Per-process two-level segment/page table.
#[derive(Debug, Default)]
pub struct SegmentTable {
    segments: Vec<SegmentEntry>,
}

impl SegmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// First segment entry matching `index`, in insertion order.
    fn find(&self, index: u64) -> Option<&SegmentEntry> {
        self.segments.iter().find(|s| s.v_index == index)
    }

    /// Second-level table for `index`, created empty if absent.
    fn find_or_create(&mut self, index: u64) -> &mut SegmentEntry {
        let pos = self.segments.iter().position(|s| s.v_index == index);
        let pos = pos.unwrap_or_else(|| {
            self.segments.push(SegmentEntry {
                v_index: index,
                pages: Vec::new(),
            });
            self.segments.len() - 1
        });
        &mut self.segments[pos]
    }

    /// Translate a virtual address through both levels.
    ///
    /// Scans the segment table, then the page table, first match winning
    /// at each level. Nothing is cached.
    pub fn translate(&self, addr: VirtAddr) -> Result<PhysAddr, MemError> {
        let segment = self.find(addr.segment_index()).ok_or(MemError::NotFound)?;
        let page_index = addr.page_index();
        segment
            .pages
            .iter()
            .find(|p| p.v_index == page_index)
            .map(|p| PhysAddr::from_frame(p.p_index, addr.page_offset()))
            .ok_or(MemError::NotFound)
    }
}

/// Allocate `size` bytes of virtual memory at the process break pointer.
///
/// Rounds up to whole pages, then requires both enough free frames and
/// that the post-allocation break stays inside the legacy address space.
/// Frames are claimed by linear scan and linked into one ownership chain,
/// oldest to newest; second-level tables are created lazily as the break
/// pointer crosses segments. Returns the base address of the allocation.
///
/// The whole operation runs under one frame-table critical section, so
/// the availability check cannot be invalidated by a concurrent claim.
pub fn alloc(
    table: &mut SegmentTable,
    brk: &mut VirtAddr,
    phys: &PhysMem,
    pid: Pid,
    size: u64,
) -> Result<VirtAddr, MemError> {
    let num_pages = super::address::pages_for(size);
    let mut frames = phys.frames();

    if frames.free_count() < num_pages {
        return Err(MemError::InsufficientFrames);
    }
    if brk.as_u64() + (num_pages * PAGE_SIZE) as u64 >= LEGACY_ADDR_LIMIT {
        return Err(MemError::OutOfRange);
    }

    let base = *brk;
    let mut prev: Option<usize> = None;

    for index in 0..num_pages {
        let Some(fpn) = frames.find_free() else {
            // The availability check above holds for the whole critical
            // section, so the scan cannot come up empty.
            break;
        };
        frames.claim(fpn, pid, index);
        if let Some(p) = prev {
            frames.link(p, fpn);
        }
        prev = Some(fpn);

        let segment = table.find_or_create(brk.segment_index());
        segment.pages.push(PageEntry {
            v_index: brk.page_index(),
            p_index: fpn,
        });

        *brk = brk.add(PAGE_SIZE as u64);
    }

    debug!(
        "legacy alloc: pid {} got {} page(s) at {}",
        pid, num_pages, base
    );
    Ok(base)
}

/// Free the allocation containing `addr`.
///
/// Translates to find the starting frame, then releases the whole
/// ownership chain. The table entries that pointed at the chain are left
/// in place; the read/write paths treat a mapping to a free frame as
/// untranslated. A translation miss or an ownership mismatch is logged
/// and otherwise ignored.
pub fn free(table: &SegmentTable, phys: &PhysMem, pid: Pid, addr: VirtAddr) {
    let Ok(pa) = table.translate(addr) else {
        debug!("legacy free: pid {} passed unmapped address {}", pid, addr);
        return;
    };

    match phys.frames().release_chain(pa.frame_number(), pid) {
        Ok(released) => {
            debug!(
                "legacy free: pid {} released {} frame(s) from {}",
                pid, released, addr
            );
        }
        Err(err) => warn!("legacy free: pid {} at {} ignored: {}", pid, addr, err),
    }
}
