//! Kernel State
//!
//! Owns the shared resources of the simulation: the RAM device, the
//! active swap device, and the scheduler queues. Process contexts are
//! owned by their `Pcb`s; the kernel only hands out locked handles.
//!
//! Frames are the one resource shared by every process, and each frame's
//! ownership record is the sole arbiter of access rights. VMA lists and
//! page tables are reached only through a process's own handle, which is
//! a `spin::Mutex`, one lock per memory context.

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, info};
use spin::Mutex;

use crate::mm::context::TranslationMode;
use crate::mm::phys::{PhysMem, Pid};
use crate::mm::swap::copy_page;
use crate::process::Pcb;
use crate::sched::ProcQueue;

/// Shared, lockable handle to a process.
pub type ProcHandle = Arc<Mutex<Pcb>>;

/// Top-level simulation state.
pub struct Kernel {
    /// Main memory device.
    pub mram: PhysMem,
    /// Active swap device.
    pub mswp: PhysMem,
    mode: TranslationMode,
    pub ready_queue: Mutex<ProcQueue>,
    pub running_list: Mutex<ProcQueue>,
    next_pid: AtomicU32,
}

impl Kernel {
    /// Create a kernel with the given device sizes and translation mode.
    pub fn new(ram_bytes: usize, swap_bytes: usize, mode: TranslationMode) -> Self {
        info!(
            "kernel: {} byte(s) RAM, {} byte(s) swap, {:?} translation",
            ram_bytes, swap_bytes, mode
        );
        Self {
            mram: PhysMem::new(ram_bytes),
            mswp: PhysMem::new(swap_bytes),
            mode,
            ready_queue: Mutex::new(ProcQueue::new()),
            running_list: Mutex::new(ProcQueue::new()),
            // Pid 0 marks a free frame, so numbering starts at 1.
            next_pid: AtomicU32::new(1),
        }
    }

    /// The translation mode new processes are created with.
    pub fn mode(&self) -> TranslationMode {
        self.mode
    }

    /// Admit a new process: build its context and queue it as ready.
    pub fn admit(&self) -> ProcHandle {
        let pid = self.next_pid.fetch_add(1, Ordering::Relaxed);
        let proc = Arc::new(Mutex::new(Pcb::new(pid, self.mode)));
        self.ready_queue.lock().enqueue(proc.clone());
        debug!("admit: pid {}", pid);
        proc
    }

    /// Move the front ready process to the running list.
    pub fn schedule(&self) -> Option<ProcHandle> {
        let proc = self.ready_queue.lock().dequeue()?;
        self.running_list.lock().enqueue(proc.clone());
        Some(proc)
    }

    /// Look a process up by pid, running list first, then ready queue.
    pub fn find_process(&self, pid: Pid) -> Option<ProcHandle> {
        find_in_queue(&self.running_list.lock(), pid)
            .or_else(|| find_in_queue(&self.ready_queue.lock(), pid))
    }

    /// Terminate a process: drop it from both queues and release every
    /// frame it owns on both devices. Its table nodes go away with the
    /// last handle.
    pub fn terminate(&self, proc: &ProcHandle) {
        self.running_list.lock().purge(proc);
        self.ready_queue.lock().purge(proc);

        let pid = proc.lock().pid;
        let ram_freed = self.mram.frames().release_owned(pid);
        let swp_freed = self.mswp.frames().release_owned(pid);
        debug!(
            "terminate: pid {} released {} RAM / {} swap frame(s)",
            pid, ram_freed, swp_freed
        );
    }

    /// Copy a victim page from RAM into the active swap device.
    pub fn swap_out(&self, victim_fpn: usize, swap_fpn: usize) {
        copy_page(&self.mram, victim_fpn, &self.mswp, swap_fpn);
    }
}

/// First process in the queue with the given pid.
fn find_in_queue(queue: &ProcQueue, pid: Pid) -> Option<ProcHandle> {
    queue
        .iter()
        .find(|handle| handle.lock().pid == pid)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::address::{PAGE_SIZE, VirtAddr};
    use crate::mm::vma;

    fn kernel() -> Kernel {
        Kernel::new(8 * PAGE_SIZE, 4 * PAGE_SIZE, TranslationMode::Hierarchical)
    }

    #[test]
    fn test_admit_assigns_distinct_pids() {
        let k = kernel();
        let a = k.admit();
        let b = k.admit();
        assert_ne!(a.lock().pid, b.lock().pid);
        assert_eq!(k.ready_queue.lock().len(), 2);
    }

    #[test]
    fn test_find_process_searches_both_queues() {
        let k = kernel();
        let a = k.admit();
        let b = k.admit();
        let running = k.schedule().unwrap();
        assert!(Arc::ptr_eq(&running, &a));

        let a_pid = a.lock().pid;
        let b_pid = b.lock().pid;
        assert!(k.find_process(a_pid).is_some());
        assert!(k.find_process(b_pid).is_some());
        assert!(k.find_process(999).is_none());
    }

    #[test]
    fn test_terminate_releases_owned_frames() {
        let k = kernel();
        let proc = k.admit();
        {
            let mut p = proc.lock();
            let pid = p.pid;
            vma::grow(&mut p.mm, &k.mram, pid, 0, 2 * PAGE_SIZE as u64).unwrap();
        }
        assert_eq!(k.mram.free_frames(), 6);

        k.terminate(&proc);
        assert_eq!(k.mram.free_frames(), 8);
        assert!(k.ready_queue.lock().is_empty());
    }

    #[test]
    fn test_swap_out_copies_victim_page() {
        let k = kernel();
        k.mram
            .write_byte(crate::mm::address::PhysAddr::from_frame(2, 9), 0xCD);
        k.swap_out(2, 1);
        assert_eq!(
            k.mswp
                .read_byte(crate::mm::address::PhysAddr::from_frame(1, 9)),
            0xCD
        );
    }

    #[test]
    fn test_translated_io_after_growth() {
        let k = kernel();
        let proc = k.admit();
        let mut p = proc.lock();
        let pid = p.pid;
        vma::grow(&mut p.mm, &k.mram, pid, 0, 300).unwrap();

        let addr = VirtAddr::new(260);
        p.write_byte(&k.mram, addr, 0x3C).unwrap();
        assert_eq!(p.read_byte(&k.mram, addr).unwrap(), 0x3C);
    }
}
