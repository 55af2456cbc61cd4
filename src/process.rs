//! Simulated Process Handle
//!
//! A `Pcb` pairs a process id with the memory context it exclusively
//! owns, and carries the process-facing memory operations: legacy
//! allocate/free and translated byte I/O.
//!
//! Reads and writes re-validate the resolved frame against the device's
//! ownership table, so a mapping whose frames have been freed behaves as
//! untranslated instead of touching stale memory.

use log::warn;

use crate::mm::address::VirtAddr;
use crate::mm::context::{MemContext, TableRoot, TranslationMode};
use crate::mm::error::MemError;
use crate::mm::legacy;
use crate::mm::phys::{PhysMem, Pid};

/// Process control block of one simulated process.
pub struct Pcb {
    pub pid: Pid,
    pub mm: MemContext,
}

impl Pcb {
    /// Create a process with a fresh memory context.
    pub fn new(pid: Pid, mode: TranslationMode) -> Self {
        Self {
            pid,
            mm: MemContext::new(mode),
        }
    }

    /// Allocate `size` bytes at the break pointer (legacy model).
    pub fn alloc(&mut self, phys: &PhysMem, size: u64) -> Result<VirtAddr, MemError> {
        let TableRoot::Legacy { table, brk } = &mut self.mm.root else {
            return Err(MemError::NotFound);
        };
        legacy::alloc(table, brk, phys, self.pid, size)
    }

    /// Free the legacy allocation containing `addr`.
    pub fn free(&self, phys: &PhysMem, addr: VirtAddr) {
        let TableRoot::Legacy { table, .. } = &self.mm.root else {
            return;
        };
        legacy::free(table, phys, self.pid, addr);
    }

    /// Read one byte through address translation.
    ///
    /// An unmapped address, or a mapping whose backing frame has been
    /// freed, reports [`MemError::NotFound`] rather than returning stale
    /// memory.
    pub fn read_byte(&self, phys: &PhysMem, addr: VirtAddr) -> Result<u8, MemError> {
        let pa = self.mm.translate(addr)?;
        if phys.frame_is_free(pa.frame_number()) {
            return Err(MemError::NotFound);
        }
        Ok(phys.read_byte(pa))
    }

    /// Write one byte through address translation.
    ///
    /// A write resolving to a frame owned by another process is ignored
    /// (and logged), not surfaced as an error.
    pub fn write_byte(
        &self,
        phys: &PhysMem,
        addr: VirtAddr,
        value: u8,
    ) -> Result<(), MemError> {
        let pa = self.mm.translate(addr)?;
        let owner = phys
            .frames()
            .get(pa.frame_number())
            .map(|stat| stat.owner)
            .ok_or(MemError::NotFound)?;

        if owner == 0 {
            return Err(MemError::NotFound);
        }
        if owner != self.pid {
            warn!(
                "pid {} write to {} hit frame {} owned by pid {}; ignored",
                self.pid,
                addr,
                pa.frame_number(),
                owner
            );
            return Ok(());
        }
        phys.write_byte(pa, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::address::PAGE_SIZE;

    #[test]
    fn test_alloc_write_read_roundtrip() {
        let phys = PhysMem::new(4 * PAGE_SIZE);
        let mut proc = Pcb::new(1, TranslationMode::Legacy);

        let base = proc.alloc(&phys, 300).unwrap();
        for offset in [0u64, 255, 256, 299] {
            let addr = base.add(offset);
            proc.write_byte(&phys, addr, (offset % 7 + 1) as u8).unwrap();
            assert_eq!(proc.read_byte(&phys, addr).unwrap(), (offset % 7 + 1) as u8);
        }
    }

    #[test]
    fn test_break_pointer_advances_by_whole_pages() {
        let phys = PhysMem::new(4 * PAGE_SIZE);
        let mut proc = Pcb::new(1, TranslationMode::Legacy);

        let base = proc.alloc(&phys, 300).unwrap();
        assert_eq!(base.as_u64(), 0);
        let TableRoot::Legacy { brk, .. } = &proc.mm.root else {
            panic!("legacy context expected");
        };
        assert_eq!(brk.as_u64(), 512);
    }

    #[test]
    fn test_read_after_free_is_untranslated() {
        let phys = PhysMem::new(4 * PAGE_SIZE);
        let mut proc = Pcb::new(1, TranslationMode::Legacy);

        let base = proc.alloc(&phys, 300).unwrap();
        proc.write_byte(&phys, base, 9).unwrap();
        proc.free(&phys, base);

        assert_eq!(proc.read_byte(&phys, base), Err(MemError::NotFound));
        assert_eq!(proc.read_byte(&phys, base.add(299)), Err(MemError::NotFound));
    }

    #[test]
    fn test_write_to_foreign_frame_is_ignored() {
        let phys = PhysMem::new(4 * PAGE_SIZE);
        let mut p = Pcb::new(1, TranslationMode::Legacy);
        let mut q = Pcb::new(2, TranslationMode::Legacy);

        let p_base = p.alloc(&phys, 100).unwrap();
        let q_base = q.alloc(&phys, 100).unwrap();
        q.write_byte(&phys, q_base, 0x55).unwrap();

        // P frees, Q's later allocation reuses P's frame, and P's stale
        // mapping now resolves into Q's memory: the write must not land.
        p.free(&phys, p_base);
        let q_more = q.alloc(&phys, 100).unwrap();
        q.write_byte(&phys, q_more, 0x77).unwrap();
        assert!(p.write_byte(&phys, p_base, 0xFF).is_ok());
        assert_eq!(q.read_byte(&phys, q_more).unwrap(), 0x77);
    }

    #[test]
    fn test_alloc_requires_legacy_context() {
        let phys = PhysMem::new(4 * PAGE_SIZE);
        let mut proc = Pcb::new(1, TranslationMode::Hierarchical);
        assert_eq!(proc.alloc(&phys, 100), Err(MemError::NotFound));
    }
}
