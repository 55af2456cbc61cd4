//! Virtual Memory Areas
//!
//! Each process owns an ordered list of VMAs: contiguous virtual ranges
//! `[vm_start, vm_end)` with a break pointer (`sbrk`) marking the next
//! free address inside the area. Ranges of distinct VMAs of one process
//! must never overlap; the invariant is enforced at growth time, not
//! continuously.

use log::debug;

use super::address::{pages_for, VirtAddr};
use super::context::MemContext;
use super::error::MemError;
use super::frame::allocate_frames;
use super::phys::{PhysMem, Pid};
use super::radix::map_range;

/// A half-open virtual address range handed back to allocation callers.
///
/// Not an owner of memory, just a handle into a VMA's address range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub start: VirtAddr,
    pub end: VirtAddr,
}

impl Region {
    #[inline]
    pub const fn new(start: VirtAddr, end: VirtAddr) -> Self {
        Self { start, end }
    }

    /// Size of the range in bytes.
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end.as_u64().saturating_sub(self.start.as_u64())
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One virtual memory area of a process.
#[derive(Debug, PartialEq)]
pub struct Vma {
    pub id: u32,
    pub vm_start: VirtAddr,
    pub vm_end: VirtAddr,
    /// Next free virtual address inside the area.
    pub sbrk: VirtAddr,
    /// Sub-ranges released back for internal reuse.
    pub free_regions: Vec<Region>,
}

impl Vma {
    /// Create an empty area starting (and ending) at `start`.
    pub fn new(id: u32, start: VirtAddr) -> Self {
        Self {
            id,
            vm_start: start,
            vm_end: start,
            sbrk: start,
            free_regions: vec![Region::new(start, start)],
        }
    }
}

/// Half-open interval intersection.
#[inline]
fn ranges_overlap(s1: u64, e1: u64, s2: u64, e2: u64) -> bool {
    s1 < e2 && s2 < e1
}

/// Find a VMA by id with the historical walk: advance while the current
/// id is below the wanted one and return the first entry at or above it.
///
/// A request falling in an id gap therefore returns the NEXT area, not an
/// error; only walking off the end of the list reports `NotFound`.
fn position_by_id(vmas: &[Vma], vma_id: u32) -> Result<usize, MemError> {
    let mut pos = 0;
    let mut cur = vmas.first().ok_or(MemError::NotFound)?;
    while cur.id < vma_id {
        pos += 1;
        cur = vmas.get(pos).ok_or(MemError::NotFound)?;
    }
    Ok(pos)
}

/// Shared-reference lookup, same semantics as [`position_by_id`].
pub fn find_vma(vmas: &[Vma], vma_id: u32) -> Result<&Vma, MemError> {
    position_by_id(vmas, vma_id).map(|pos| &vmas[pos])
}

/// Check that `[new_start, new_end)` can be given to the VMA `vma_id`
/// without intersecting any OTHER area of the same process.
///
/// A degenerate range (`new_start >= new_end`) is rejected outright.
/// Touching ranges are allowed: `[0, 10)` and `[10, 20)` do not overlap.
pub fn validate_overlap(
    vmas: &[Vma],
    vma_id: u32,
    new_start: VirtAddr,
    new_end: VirtAddr,
) -> Result<(), MemError> {
    if new_start.as_u64() >= new_end.as_u64() {
        return Err(MemError::OutOfRange);
    }

    let own = position_by_id(vmas, vma_id)?;
    for (pos, vma) in vmas.iter().enumerate() {
        if pos == own {
            continue;
        }
        if ranges_overlap(
            new_start.as_u64(),
            new_end.as_u64(),
            vma.vm_start.as_u64(),
            vma.vm_end.as_u64(),
        ) {
            return Err(MemError::Overlap);
        }
    }
    Ok(())
}

/// Grow the VMA `vma_id` by `inc_bytes`.
///
/// Validates that `[vm_end, vm_end + inc_bytes)` stays clear of every
/// other area, maps `ceil(inc_bytes / PAGE_SIZE)` fresh pages starting at
/// the old end, then advances `vm_end` and `sbrk` by `inc_bytes`. Any
/// failure leaves the VMA unchanged; `vm_end` never advances partially.
pub fn grow(
    ctx: &mut MemContext,
    phys: &PhysMem,
    pid: Pid,
    vma_id: u32,
    inc_bytes: u64,
) -> Result<(), MemError> {
    let pos = position_by_id(&ctx.vmas, vma_id)?;
    let old_end = ctx.vmas[pos].vm_end;
    let new_end = old_end.add(inc_bytes);
    let pages = pages_for(inc_bytes);

    validate_overlap(&ctx.vmas, vma_id, old_end, new_end)?;

    let mut frames = allocate_frames(phys, pid, pages)?;
    map_range(ctx, old_end, pages, &mut frames)?;

    let vma = &mut ctx.vmas[pos];
    vma.vm_end = new_end;
    vma.sbrk = vma.sbrk.add(inc_bytes);
    debug!(
        "vma {}: pid {} grew by {} byte(s) to end {}",
        vma_id, pid, inc_bytes, new_end
    );
    Ok(())
}

/// Hand out the region `[sbrk, sbrk + size)` of the VMA `vma_id`.
///
/// Neither advances `sbrk` nor checks capacity; a caller whose region
/// would cross `vm_end` must [`grow`] the area first.
pub fn reserve_at_break(
    vmas: &[Vma],
    vma_id: u32,
    size: u64,
) -> Result<Region, MemError> {
    let vma = find_vma(vmas, vma_id)?;
    Ok(Region::new(vma.sbrk, vma.sbrk.add(size)))
}
