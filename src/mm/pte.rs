//! Page Table Entries
//!
//! A leaf entry is kept as a tagged value: a page is absent, resident in a
//! physical frame, or swapped out to a swap device. Exactly one location
//! field is meaningful at a time and the variant says which, so the packed
//! "frame-or-swap-location" word of the wire format never has to be
//! interpreted by callers.
//!
//! # Packed word layout (u32)
//! - bit 31: present
//! - bit 30: swapped
//! - bit 29: dirty
//! - bits 0..=20: frame number (resident entries)
//! - bits 0..=4:  swap type, bits 5..=25: swap offset (swapped entries)

use bitflags::bitflags;

bitflags! {
    /// Flag bits of the packed entry word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PteFlags: u32 {
        /// Entry has been initialized.
        const PRESENT = 1 << 31;
        /// Page content lives on a swap device.
        const SWAPPED = 1 << 30;
        /// Page has been written since it was mapped.
        const DIRTY = 1 << 29;
    }
}

/// Frame number field, bits 0..=20.
const FPN_MASK: u32 = 0x001F_FFFF;
/// Swap type field, bits 0..=4.
const SWPTYP_MASK: u32 = 0x0000_001F;
/// Swap offset field, bits 5..=25.
const SWPOFF_MASK: u32 = 0x03FF_FFE0;
const SWPOFF_LOBIT: u32 = 5;

/// One page-table leaf entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pte {
    /// No mapping recorded for this page.
    #[default]
    Absent,
    /// Page is online in a physical frame.
    Resident { fpn: usize, dirty: bool },
    /// Page content is at `swap_offset` on swap device `swap_type`.
    Swapped {
        swap_type: u8,
        swap_offset: u64,
        dirty: bool,
    },
}

impl Pte {
    /// Entry for a page resident in frame `fpn`, clean.
    #[inline]
    pub const fn resident(fpn: usize) -> Self {
        Self::Resident { fpn, dirty: false }
    }

    /// Entry for a page swapped out to `(swap_type, swap_offset)`, clean.
    #[inline]
    pub const fn swapped(swap_type: u8, swap_offset: u64) -> Self {
        Self::Swapped {
            swap_type,
            swap_offset,
            dirty: false,
        }
    }

    /// Whether the entry has been initialized at all.
    #[inline]
    pub const fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// The frame number, if the page is resident.
    #[inline]
    pub const fn frame(&self) -> Option<usize> {
        match self {
            Self::Resident { fpn, .. } => Some(*fpn),
            _ => None,
        }
    }

    /// Encode into the packed word format.
    pub fn encode(&self) -> u32 {
        match *self {
            Self::Absent => 0,
            Self::Resident { fpn, dirty } => {
                let mut flags = PteFlags::PRESENT;
                flags.set(PteFlags::DIRTY, dirty);
                flags.bits() | (fpn as u32 & FPN_MASK)
            }
            Self::Swapped {
                swap_type,
                swap_offset,
                dirty,
            } => {
                let mut flags = PteFlags::PRESENT | PteFlags::SWAPPED;
                flags.set(PteFlags::DIRTY, dirty);
                flags.bits()
                    | (swap_type as u32 & SWPTYP_MASK)
                    | (((swap_offset as u32) << SWPOFF_LOBIT) & SWPOFF_MASK)
            }
        }
    }

    /// Decode from the packed word format.
    pub fn decode(word: u32) -> Self {
        let flags = PteFlags::from_bits_truncate(word);
        if !flags.contains(PteFlags::PRESENT) {
            return Self::Absent;
        }
        let dirty = flags.contains(PteFlags::DIRTY);
        if flags.contains(PteFlags::SWAPPED) {
            Self::Swapped {
                swap_type: (word & SWPTYP_MASK) as u8,
                swap_offset: ((word & SWPOFF_MASK) >> SWPOFF_LOBIT) as u64,
                dirty,
            }
        } else {
            Self::Resident {
                fpn: (word & FPN_MASK) as usize,
                dirty,
            }
        }
    }
}
