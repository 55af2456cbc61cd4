//! Hierarchical Page Table
//!
//! Five-level radix tree over page numbers: pgd → p4d → pud → pmd → pt,
//! 64 entries per node, leaf nodes holding [`Pte`] values.
//!
//! # Design
//! - Intermediate nodes are owned by their parent level through
//!   `Option<Box<_>>`, so "absent vs present" is an explicit variant and
//!   dropping the root releases the whole reachable subtree.
//! - Nodes are created lazily on first use. A new node is fully built and
//!   zero-initialized before it is linked into its parent, so a reader of
//!   the structure sees a path as either absent or fully present, never
//!   partially constructed.

use super::address::{level_indices, PhysAddr, VirtAddr, PAGE_SIZE, TABLE_ENTRIES};
use super::context::{MemContext, TableRoot};
use super::error::MemError;
use super::frame::FrameList;
use super::pte::Pte;
use super::vma::Region;

/// Leaf node: one [`Pte`] per page.
pub struct PageTable {
    entries: [Pte; TABLE_ENTRIES],
}

impl PageTable {
    fn new() -> Self {
        Self {
            entries: [Pte::Absent; TABLE_ENTRIES],
        }
    }
}

impl Default for PageTable {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! radix_level {
    ($(#[$doc:meta])* $name:ident -> $child:ident) => {
        $(#[$doc])*
        pub struct $name {
            down: [Option<Box<$child>>; TABLE_ENTRIES],
        }

        impl $name {
            fn new() -> Self {
                const EMPTY: Option<Box<$child>> = None;
                Self {
                    down: [EMPTY; TABLE_ENTRIES],
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

radix_level!(
    /// Innermost directory level, pointing at leaf tables.
    Pmd -> PageTable
);
radix_level!(Pud -> Pmd);
radix_level!(P4d -> Pud);
radix_level!(
    /// Root of a process's hierarchical table (the pgd).
    PageDirectory -> P4d
);

impl PageDirectory {
    /// Create an empty directory with no lower levels.
    pub fn empty() -> Self {
        Self::new()
    }

    /// Walk to the leaf entry for `pgn`, building every missing node.
    ///
    /// Each new node is a complete zeroed table before it is linked in.
    fn entry_or_create(&mut self, pgn: u64) -> &mut Pte {
        let [pgd, p4d, pud, pmd, pt] = level_indices(pgn);
        let l4 = self.down[pgd].get_or_insert_with(Box::default);
        let l3 = l4.down[p4d].get_or_insert_with(Box::default);
        let l2 = l3.down[pud].get_or_insert_with(Box::default);
        let l1 = l2.down[pmd].get_or_insert_with(Box::default);
        &mut l1.entries[pt]
    }

    /// Walk to the leaf entry for `pgn`, optionally building the path.
    ///
    /// With `create` set the walk cannot fail; without it, `None` is
    /// returned at the first absent level. Walking the same page number
    /// twice with `create` yields the same leaf slot; no duplicate
    /// subtree is ever built.
    pub fn entry_mut(&mut self, pgn: u64, create: bool) -> Option<&mut Pte> {
        if create {
            return Some(self.entry_or_create(pgn));
        }
        let [pgd, p4d, pud, pmd, pt] = level_indices(pgn);
        let l4 = self.down[pgd].as_deref_mut()?;
        let l3 = l4.down[p4d].as_deref_mut()?;
        let l2 = l3.down[pud].as_deref_mut()?;
        let l1 = l2.down[pmd].as_deref_mut()?;
        Some(&mut l1.entries[pt])
    }

    /// Walk to the leaf entry for `pgn` without modifying the tree.
    pub fn entry(&self, pgn: u64) -> Option<&Pte> {
        let [pgd, p4d, pud, pmd, pt] = level_indices(pgn);
        let l4 = self.down[pgd].as_deref()?;
        let l3 = l4.down[p4d].as_deref()?;
        let l2 = l3.down[pud].as_deref()?;
        let l1 = l2.down[pmd].as_deref()?;
        Some(&l1.entries[pt])
    }

    /// Mark `pgn` resident in frame `fpn`.
    ///
    /// The swapped state is cleared; the dirty flag carries over from any
    /// previous entry.
    pub fn set_frame(&mut self, pgn: u64, fpn: usize) {
        let entry = self.entry_or_create(pgn);
        let dirty = entry_dirty(entry);
        *entry = Pte::Resident { fpn, dirty };
    }

    /// Mark `pgn` swapped out to `(swap_type, swap_offset)`.
    pub fn set_swapped(&mut self, pgn: u64, swap_type: u8, swap_offset: u64) {
        let entry = self.entry_or_create(pgn);
        let dirty = entry_dirty(entry);
        *entry = Pte::Swapped {
            swap_type,
            swap_offset,
            dirty,
        };
    }

    /// Raw packed-word read of the entry for `pgn`.
    ///
    /// A missing path reads as zero.
    pub fn read_entry(&self, pgn: u64) -> u32 {
        self.entry(pgn).map_or(0, Pte::encode)
    }

    /// Raw packed-word write of the entry for `pgn`, building the path.
    pub fn write_entry(&mut self, pgn: u64, word: u32) {
        *self.entry_or_create(pgn) = Pte::decode(word);
    }

    /// Build the table path for `count` consecutive pages starting at the
    /// page containing `base`, without mapping any frame.
    pub fn ensure_range(&mut self, base: VirtAddr, count: usize) {
        let pgn = base.page_number();
        for i in 0..count as u64 {
            self.entry_or_create(pgn + i);
        }
    }

    /// Resolve a virtual address to a physical one.
    ///
    /// Only pages resident in a frame translate; absent and swapped-out
    /// pages report [`MemError::NotFound`].
    pub fn translate(&self, addr: VirtAddr) -> Result<PhysAddr, MemError> {
        match self.entry(addr.page_number()) {
            Some(Pte::Resident { fpn, .. }) => {
                Ok(PhysAddr::from_frame(*fpn, addr.page_offset()))
            }
            _ => Err(MemError::NotFound),
        }
    }
}

fn entry_dirty(entry: &Pte) -> bool {
    matches!(
        entry,
        Pte::Resident { dirty: true, .. } | Pte::Swapped { dirty: true, .. }
    )
}

/// Map `pgnum` consecutive pages starting at `base`, consuming one frame
/// per page from `frames`.
///
/// Each mapped page number is appended to the context's FIFO page list.
/// The returned region always covers the full requested range
/// `[base, base + pgnum * PAGE_SIZE)`. If `frames` runs dry the mapping
/// stops early and is NOT rolled back; a caller that needs atomicity must
/// treat the whole operation as failed.
pub fn map_range(
    ctx: &mut MemContext,
    base: VirtAddr,
    pgnum: usize,
    frames: &mut FrameList,
) -> Result<Region, MemError> {
    let TableRoot::Radix(dir) = &mut ctx.root else {
        return Err(MemError::NotFound);
    };

    let region = Region {
        start: base,
        end: base.add((pgnum * PAGE_SIZE) as u64),
    };

    let pgn = base.page_number();
    for i in 0..pgnum as u64 {
        let Some(fpn) = frames.pop() else {
            break;
        };
        dir.set_frame(pgn + i, fpn);
        ctx.fifo_pgn.push_back(pgn + i);
    }

    Ok(region)
}
