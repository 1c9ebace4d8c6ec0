//! Sv32 two-level page mapping.
//!
//! Grounded on `map_page` in examples/original_source/common.c: a
//! first-level table of 1024 PTEs covering 4 MiB each, second-level
//! tables allocated on demand via [`super::alloc_pages`]. There is no
//! unmap, no huge-page support, and no copy-on-write (spec Non-goals).

use crate::config::{PageFlags, PAGE_SIZE};
#[cfg(target_os = "none")]
use crate::mm::frame_allocator::alloc_pages;

fn is_aligned(addr: u32, align: u32) -> bool {
    addr % align == 0
}

/// Maps one 4 KiB page at `vaddr` to `paddr` in the Sv32 table rooted at
/// `table1`, allocating the second-level table on demand. `flags` is a
/// combination of [`PageFlags`] bits (`V` is added automatically). Panics
/// if either address is not page-aligned.
///
/// # Safety
///
/// `table1` must point to a valid, zero-initialized 1024-entry Sv32
/// root table that the caller owns exclusively.
#[cfg(target_os = "none")]
pub unsafe fn map_page(table1: *mut u32, vaddr: u32, paddr: u32, flags: PageFlags) {
    if !is_aligned(vaddr, PAGE_SIZE) {
        panic!("map_page: unaligned vaddr {:#x}", vaddr);
    }
    if !is_aligned(paddr, PAGE_SIZE) {
        panic!("map_page: unaligned paddr {:#x}", paddr);
    }

    let vpn1 = ((vaddr >> 22) & 0x3ff) as usize;

    // SAFETY: `table1` is a valid 1024-entry Sv32 root table per the
    // caller's contract; `vpn1` is masked to `0..1024`.
    let entry1 = unsafe { &mut *table1.add(vpn1) };

    if *entry1 & PageFlags::V.bits() == 0 {
        let pt_paddr = alloc_pages(1);
        *entry1 = ((pt_paddr / PAGE_SIZE) << 10) | PageFlags::V.bits();
    }

    let table0 = ((*entry1 >> 10) * PAGE_SIZE) as *mut u32;
    let vpn0 = ((vaddr >> 12) & 0x3ff) as usize;

    // SAFETY: `table0` was just allocated (zero-filled, page-aligned) or
    // was previously installed by this same function, so it is a valid
    // 1024-entry second-level table; `vpn0` is masked to `0..1024`.
    unsafe {
        *table0.add(vpn0) = ((paddr / PAGE_SIZE) << 10) | (flags | PageFlags::V).bits();
    }
}

/// Identity-maps every 4 KiB page in `[start, end)` with `flags`.
///
/// # Safety
///
/// Same contract as [`map_page`], applied to every page in the range.
#[cfg(target_os = "none")]
pub unsafe fn map_range_identity(table1: *mut u32, start: u32, end: u32, flags: PageFlags) {
    let mut paddr = start;
    while paddr < end {
        // SAFETY: forwarded from the caller's contract.
        unsafe {
            map_page(table1, paddr, paddr, flags);
        }
        paddr += PAGE_SIZE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vpn_split_matches_sv32_layout() {
        let vaddr: u32 = 0x0100_1234;
        let vpn1 = (vaddr >> 22) & 0x3ff;
        let vpn0 = (vaddr >> 12) & 0x3ff;
        assert_eq!(vpn1, 0);
        assert_eq!(vpn0, 1);
    }

    #[test]
    fn pte_encoding_shifts_ppn_by_ten_bits() {
        let paddr: u32 = 0x8020_0000;
        let pte = ((paddr / PAGE_SIZE) << 10) | (PageFlags::R | PageFlags::V).bits();
        assert_eq!(pte & PageFlags::V.bits(), PageFlags::V.bits());
        assert_eq!((pte >> 10) * PAGE_SIZE, paddr);
    }
}
