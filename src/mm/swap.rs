//! Page Copy Engine
//!
//! Raw page transfer between physical devices. Policy (which page is a
//! victim, when to swap) belongs to callers; this module only moves
//! bytes.

use log::trace;

use super::address::{PhysAddr, PAGE_SIZE};
use super::phys::PhysMem;

/// Copy exactly one page between two devices, byte by byte.
///
/// `src` and `dst` may be the same device with different frames. Used for
/// both victim eviction (RAM → swap) and swap-in (swap → RAM).
pub fn copy_page(src: &PhysMem, src_fpn: usize, dst: &PhysMem, dst_fpn: usize) {
    trace!("copy_page: frame {} -> frame {}", src_fpn, dst_fpn);
    for cell in 0..PAGE_SIZE {
        let byte = src.read_byte(PhysAddr::from_frame(src_fpn, cell));
        dst.write_byte(PhysAddr::from_frame(dst_fpn, cell), byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_full_page_between_devices() {
        let swap = PhysMem::new(4 * PAGE_SIZE);
        let ram = PhysMem::new(8 * PAGE_SIZE);

        for offset in 0..PAGE_SIZE {
            swap.write_byte(PhysAddr::from_frame(3, offset), (offset % 251) as u8);
        }

        copy_page(&swap, 3, &ram, 5);

        for offset in 0..PAGE_SIZE {
            assert_eq!(
                ram.read_byte(PhysAddr::from_frame(5, offset)),
                swap.read_byte(PhysAddr::from_frame(3, offset)),
            );
        }
    }

    #[test]
    fn test_neighbor_frames_untouched() {
        let src = PhysMem::new(2 * PAGE_SIZE);
        let dst = PhysMem::new(4 * PAGE_SIZE);
        for offset in 0..PAGE_SIZE {
            src.write_byte(PhysAddr::from_frame(0, offset), 0xEE);
        }

        copy_page(&src, 0, &dst, 1);

        assert_eq!(dst.read_byte(PhysAddr::from_frame(0, PAGE_SIZE - 1)), 0);
        assert_eq!(dst.read_byte(PhysAddr::from_frame(2, 0)), 0);
        assert_eq!(dst.read_byte(PhysAddr::from_frame(1, 0)), 0xEE);
        assert_eq!(dst.read_byte(PhysAddr::from_frame(1, PAGE_SIZE - 1)), 0xEE);
    }

    #[test]
    fn test_copy_within_one_device() {
        let mem = PhysMem::new(4 * PAGE_SIZE);
        mem.write_byte(PhysAddr::from_frame(0, 7), 0x42);

        copy_page(&mem, 0, &mem, 2);
        assert_eq!(mem.read_byte(PhysAddr::from_frame(2, 7)), 0x42);
    }
}
