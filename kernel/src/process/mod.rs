//! Fixed process table and process creation.
//!
//! Grounded on `struct process`/`create_process` in
//! examples/original_source/process.h and process.c. The table is a
//! fixed `PROCS_MAX`-slot array (no dynamic process creation beyond
//! that), guarded by a [`spin::Mutex`] instead of the original's
//! lock-free global -- this kernel is single-hart, so the lock only
//! protects against the compiler reordering, not real contention.

#[cfg(target_os = "none")]
pub mod scheduler;

use core::ptr;

use spin::Mutex;

#[cfg(target_os = "none")]
use crate::config::{PageFlags, PAGE_SIZE, USER_BASE};
use crate::config::PROCS_MAX;
#[cfg(target_os = "none")]
use crate::mm::frame_allocator::alloc_pages;
#[cfg(target_os = "none")]
use crate::mm::page_table::{map_page, map_range_identity};

const STACK_SIZE: usize = 8192;

#[cfg(target_os = "none")]
unsafe extern "C" {
    static __kernel_base: u8;
    static __free_ram_end: u8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    Unused,
    Runnable,
    Exited,
}

/// One process control block, including its dedicated 8 KiB in-PCB kernel
/// stack. `pid == 0` is reserved for the idle process (spec §4.4).
#[derive(Clone, Copy)]
pub struct Process {
    pub pid: i32,
    pub state: ProcState,
    /// Saved kernel stack pointer, valid only while this process is not
    /// the one currently running.
    pub sp: u32,
    /// Physical address of this process's Sv32 root table.
    pub page_table: *mut u32,
    pub stack: [u8; STACK_SIZE],
}

// SAFETY: a `Process` is only ever touched from the single hart this
// kernel runs on, either behind `PROCS`'s mutex or, for the in-flight
// current process, by cooperative hand-off through `switch_context` --
// never from two harts at once.
unsafe impl Send for Process {}

impl Process {
    const fn unused() -> Self {
        Process {
            pid: 0,
            state: ProcState::Unused,
            sp: 0,
            page_table: ptr::null_mut(),
            stack: [0; STACK_SIZE],
        }
    }
}

#[cfg(target_os = "none")]
static PROCS: Mutex<[Process; PROCS_MAX]> = Mutex::new([Process::unused(); PROCS_MAX]);

/// Index into `PROCS` of the process presently executing. The idle
/// process occupies slot 0, so this also starts at 0.
#[cfg(target_os = "none")]
static CURRENT: Mutex<usize> = Mutex::new(0);

/// Index into `PROCS` of the idle process, set once by
/// [`make_current_idle`].
#[cfg(target_os = "none")]
static IDLE_INDEX: Mutex<usize> = Mutex::new(0);

#[cfg(target_os = "none")]
fn kernel_base() -> u32 {
    &raw const __kernel_base as u32
}

#[cfg(target_os = "none")]
fn free_ram_end() -> u32 {
    &raw const __free_ram_end as u32
}

/// Creates a process running `image` (a flat binary loaded at
/// `USER_BASE`) and returns its pid. Finds an `Unused` slot (panics if
/// none remain), lays out the initial callee-saved frame so the first
/// `switch_context` into this process lands in [`scheduler::user_entry`],
/// builds a fresh Sv32 table identity-mapping the kernel image R|W|X and
/// mapping `image` page-by-page at `USER_BASE` with U|R|W|X.
#[cfg(target_os = "none")]
pub fn create_process(image: &[u8]) -> i32 {
    let mut procs = PROCS.lock();
    let idx = procs
        .iter()
        .position(|p| p.state == ProcState::Unused)
        .unwrap_or_else(|| panic!("create_process: no free process slots"));

    let stack_top = procs[idx].stack.as_ptr() as u32 + STACK_SIZE as u32;
    // Lay out 13 words (ra, s0..s11) exactly as `switch_context`'s restore
    // sequence expects to find them: ra at the lowest address, s11 at the
    // highest, ra = the address of `user_entry`.
    let frame_sp = stack_top - 13 * 4;
    // SAFETY: `frame_sp..stack_top` is inside this slot's freshly
    // zero-initialized `stack` array, owned exclusively by this call since
    // the slot was `Unused`.
    unsafe {
        let words = frame_sp as *mut u32;
        words.write(scheduler::user_entry as usize as u32);
        for i in 1..13 {
            words.add(i).write(0);
        }
    }

    let page_table = alloc_pages(1) as *mut u32;
    // SAFETY: `page_table` was just allocated by `alloc_pages`, so it is a
    // valid, zero-filled, exclusively-owned Sv32 root table.
    unsafe {
        map_range_identity(
            page_table,
            kernel_base(),
            free_ram_end(),
            PageFlags::R | PageFlags::W | PageFlags::X,
        );
    }

    let mut off: u32 = 0;
    while (off as usize) < image.len() {
        let page = alloc_pages(1);
        let remaining = image.len() - off as usize;
        let copy_size = core::cmp::min(PAGE_SIZE as usize, remaining);

        // SAFETY: `page` is a freshly allocated, exclusively-owned
        // physical page at least `copy_size` bytes long; `image` is a
        // valid, immutable slice for at least `copy_size` bytes from
        // `off`.
        unsafe {
            core::ptr::copy_nonoverlapping(
                image.as_ptr().add(off as usize),
                page as *mut u8,
                copy_size,
            );
        }
        // SAFETY: `page_table` is the table being built above, still
        // exclusively owned by this call.
        unsafe {
            map_page(
                page_table,
                USER_BASE + off,
                page,
                PageFlags::U | PageFlags::R | PageFlags::W | PageFlags::X,
            );
        }
        off += PAGE_SIZE;
    }

    let pid = idx as i32 + 1;
    let proc = &mut procs[idx];
    proc.pid = pid;
    proc.state = ProcState::Runnable;
    proc.sp = frame_sp;
    proc.page_table = page_table;
    pid
}

/// Forces a slot's pid to 0, marking it the idle process. Called exactly
/// once, on the very first process `kernel_main` creates (spec §4.4 /
/// "Supplemented features").
#[cfg(target_os = "none")]
pub fn make_current_idle(pid: i32) {
    let idx = (pid - 1) as usize;
    PROCS.lock()[idx].pid = 0;
    *IDLE_INDEX.lock() = idx;
}

/// Marks the running process `Exited`. Its stack and page table are never
/// reclaimed (DESIGN.md open question 1) -- this bump-allocated kernel has
/// no free path for either.
#[cfg(target_os = "none")]
pub fn exit_current() {
    let idx = *CURRENT.lock();
    PROCS.lock()[idx].state = ProcState::Exited;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_slot_has_zeroed_state() {
        let p = Process::unused();
        assert_eq!(p.state, ProcState::Unused);
        assert_eq!(p.pid, 0);
        assert!(p.page_table.is_null());
    }
}
