//! Physical page allocator.
//!
//! A monotonic bump cursor over the `__free_ram .. __free_ram_end` region
//! `link.ld` reserves. Grounded directly on `alloc_pages` in
//! examples/original_source/common.c: one atomically-advanced cursor,
//! always zero-filled, fatal on exhaustion. There is no free path -- by
//! design (see DESIGN.md open question 1), not an oversight.

use spin::Mutex;

use crate::config::PAGE_SIZE;

#[cfg(target_os = "none")]
unsafe extern "C" {
    static __free_ram: u8;
    static __free_ram_end: u8;
}

/// Bump cursor, `None` until the first allocation lazily seeds it from the
/// `__free_ram` linker symbol.
#[cfg(target_os = "none")]
static NEXT_PADDR: Mutex<Option<u32>> = Mutex::new(None);

#[cfg(target_os = "none")]
fn free_ram_end() -> u32 {
    &raw const __free_ram_end as u32
}

/// Allocates `n` contiguous, zero-filled 4 KiB pages and returns the
/// physical address of the first one. Panics if the bump cursor would run
/// past `__free_ram_end`; this allocator never frees.
#[cfg(target_os = "none")]
pub fn alloc_pages(n: u32) -> u32 {
    let size = n
        .checked_mul(PAGE_SIZE)
        .expect("alloc_pages: requested size overflows u32");

    let mut cursor = NEXT_PADDR.lock();
    let base = *cursor.get_or_insert_with(|| &raw const __free_ram as u32);

    let next = base
        .checked_add(size)
        .filter(|&next| next <= free_ram_end())
        .unwrap_or_else(|| panic!("alloc_pages: out of memory"));
    *cursor = Some(next);
    drop(cursor);

    // SAFETY: `base..base+size` was just carved out of the free-ram region
    // by the cursor above and handed to exactly one caller; nothing else
    // can alias it yet.
    unsafe {
        core::ptr::write_bytes(base as *mut u8, 0, size as usize);
    }

    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_4kib() {
        assert_eq!(PAGE_SIZE, 4096);
    }
}
