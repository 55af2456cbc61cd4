//! Demo driver: boots a small simulated machine and walks one process
//! through growth, translated I/O, and a page copy to swap.

use vmsim::mm::address::{PhysAddr, VirtAddr, PAGE_SIZE};
use vmsim::syscall::{sys_memmap, SysRegs};
use vmsim::{Kernel, TranslationMode};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    env_logger::init();

    println!();
    println!("vmsim v{} - user-space memory-management simulator", VERSION);
    println!("====================================================");
    println!();

    // 16 frames of RAM, 8 frames of swap.
    let kernel = Kernel::new(
        16 * PAGE_SIZE,
        8 * PAGE_SIZE,
        TranslationMode::Hierarchical,
    );
    println!(
        "[INIT] RAM: {} frames, swap: {} frames, page size {} bytes",
        kernel.mram.total_frames(),
        kernel.mswp.total_frames(),
        PAGE_SIZE
    );

    let proc = kernel.admit();
    let pid = proc.lock().pid;
    let _running = kernel.schedule();
    println!("[INIT] admitted process {}", pid);

    // Grow VMA 0 by 600 bytes through the syscall surface.
    let mut regs = SysRegs {
        a1: 1,
        a2: 0,
        a3: 600,
    };
    sys_memmap(&kernel, pid, &mut regs).expect("process vanished");
    println!(
        "[DEMO] grew VMA 0 by 600 bytes ({} free frames left)",
        kernel.mram.free_frames()
    );

    // Translated writes, then a read back.
    {
        let p = proc.lock();
        for (i, byte) in b"vmsim".iter().enumerate() {
            p.write_byte(&kernel.mram, VirtAddr::new(256 + i as u64), *byte)
                .expect("mapped page");
        }
        let first = p
            .read_byte(&kernel.mram, VirtAddr::new(256))
            .expect("mapped page");
        println!("[DEMO] wrote 5 bytes at 0x100, read back {:#04x}", first);
    }

    // Evict the frame backing page 1 into swap frame 0.
    let victim = proc
        .lock()
        .mm
        .translate(VirtAddr::new(256))
        .expect("mapped page")
        .frame_number();
    kernel.swap_out(victim, 0);
    println!(
        "[DEMO] copied frame {} to swap frame 0 (first byte {:#04x})",
        victim,
        kernel.mswp.read_byte(PhysAddr::from_frame(0, 0))
    );

    println!();
    println!("[DUMP] physical memory:");
    print!("{}", kernel.mram.dump());

    kernel.terminate(&proc);
    println!();
    println!(
        "[EXIT] process {} terminated, {} free frames",
        pid,
        kernel.mram.free_frames()
    );
}
