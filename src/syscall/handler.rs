//! Memory System Call Handler
//!
//! Maps an opcode + register triple onto the core memory operations and
//! looks up the calling process across the scheduler queues.
//!
//! Per the historical contract, only a missing caller fails the syscall;
//! an individual operation's failure is logged and the syscall still
//! returns success. Unknown opcodes are ignored.

use log::debug;

use crate::kernel::Kernel;
use crate::mm::address::{PhysAddr, VirtAddr};
use crate::mm::error::MemError;
use crate::mm::phys::Pid;
use crate::mm::vma;

/// Memory operation selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemOp {
    /// Build page-table paths for a range, mapping no frames.
    Map,
    /// Grow a VMA by a byte increment.
    Inc,
    /// Copy one page from RAM into the active swap device.
    Swap,
    /// Raw physical byte read, bypassing translation.
    IoRead,
    /// Raw physical byte write, bypassing translation.
    IoWrite,
}

impl MemOp {
    /// Decode an opcode, `None` for anything unknown.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Map),
            1 => Some(Self::Inc),
            2 => Some(Self::Swap),
            3 => Some(Self::IoRead),
            4 => Some(Self::IoWrite),
            _ => None,
        }
    }
}

/// Register file of one memory syscall.
///
/// `a1` selects the operation; `a2`/`a3` are its operands. `IoRead`
/// stores its result back into `a3`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysRegs {
    pub a1: u64,
    pub a2: u64,
    pub a3: u64,
}

/// Dispatch one memory syscall on behalf of process `pid`.
pub fn sys_memmap(kernel: &Kernel, pid: Pid, regs: &mut SysRegs) -> Result<(), MemError> {
    let proc = kernel.find_process(pid).ok_or(MemError::NotFound)?;

    match MemOp::from_code(regs.a1) {
        Some(MemOp::Map) => {
            let mut p = proc.lock();
            if let Err(err) = p.mm.ensure_range(VirtAddr::new(regs.a2), regs.a3 as usize) {
                debug!("sys_memmap: MAP for pid {} failed: {}", pid, err);
            }
        }
        Some(MemOp::Inc) => {
            let mut p = proc.lock();
            if let Err(err) = vma::grow(&mut p.mm, &kernel.mram, pid, regs.a2 as u32, regs.a3)
            {
                debug!("sys_memmap: INC for pid {} failed: {}", pid, err);
            }
        }
        Some(MemOp::Swap) => {
            kernel.swap_out(regs.a2 as usize, regs.a3 as usize);
        }
        Some(MemOp::IoRead) => {
            regs.a3 = kernel.mram.read_byte(PhysAddr::new(regs.a2)) as u64;
        }
        Some(MemOp::IoWrite) => {
            kernel.mram.write_byte(PhysAddr::new(regs.a2), regs.a3 as u8);
        }
        None => {
            debug!("sys_memmap: pid {} passed unknown opcode {}", pid, regs.a1);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::address::PAGE_SIZE;
    use crate::mm::context::{TableRoot, TranslationMode};
    use crate::mm::vma::find_vma;

    fn kernel() -> Kernel {
        Kernel::new(8 * PAGE_SIZE, 4 * PAGE_SIZE, TranslationMode::Hierarchical)
    }

    #[test]
    fn test_unknown_pid_fails() {
        let k = kernel();
        let mut regs = SysRegs::default();
        assert_eq!(sys_memmap(&k, 42, &mut regs), Err(MemError::NotFound));
    }

    #[test]
    fn test_inc_grows_vma() {
        let k = kernel();
        let proc = k.admit();
        let pid = proc.lock().pid;

        let mut regs = SysRegs {
            a1: 1,
            a2: 0,
            a3: 300,
        };
        sys_memmap(&k, pid, &mut regs).unwrap();

        let p = proc.lock();
        assert_eq!(find_vma(&p.mm.vmas, 0).unwrap().vm_end.as_u64(), 300);
        assert_eq!(k.mram.free_frames(), 6);
    }

    #[test]
    fn test_map_builds_paths_without_frames() {
        let k = kernel();
        let proc = k.admit();
        let pid = proc.lock().pid;

        let mut regs = SysRegs {
            a1: 0,
            a2: 2 * PAGE_SIZE as u64,
            a3: 2,
        };
        sys_memmap(&k, pid, &mut regs).unwrap();

        let p = proc.lock();
        let TableRoot::Radix(dir) = &p.mm.root else {
            panic!("hierarchical context expected");
        };
        assert!(dir.entry(2).is_some());
        assert!(dir.entry(3).is_some());
        // No frame was consumed.
        assert_eq!(k.mram.free_frames(), 8);
    }

    #[test]
    fn test_swap_copies_between_devices() {
        let k = kernel();
        let proc = k.admit();
        let pid = proc.lock().pid;
        k.mram.write_byte(PhysAddr::from_frame(4, 0), 0x99);

        let mut regs = SysRegs {
            a1: 2,
            a2: 4,
            a3: 2,
        };
        sys_memmap(&k, pid, &mut regs).unwrap();
        assert_eq!(k.mswp.read_byte(PhysAddr::from_frame(2, 0)), 0x99);
    }

    #[test]
    fn test_raw_io_roundtrip() {
        let k = kernel();
        let proc = k.admit();
        let pid = proc.lock().pid;

        let mut write = SysRegs {
            a1: 4,
            a2: 0x123,
            a3: 0xAB,
        };
        sys_memmap(&k, pid, &mut write).unwrap();

        let mut read = SysRegs {
            a1: 3,
            a2: 0x123,
            a3: 0,
        };
        sys_memmap(&k, pid, &mut read).unwrap();
        assert_eq!(read.a3, 0xAB);
    }

    #[test]
    fn test_unknown_opcode_is_ignored() {
        let k = kernel();
        let proc = k.admit();
        let pid = proc.lock().pid;
        let mut regs = SysRegs {
            a1: 77,
            a2: 0,
            a3: 0,
        };
        assert!(sys_memmap(&k, pid, &mut regs).is_ok());
    }
}
