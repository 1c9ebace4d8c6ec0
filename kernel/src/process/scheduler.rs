//! Context switching and the round-robin scheduler.
//!
//! Grounded on `switch_context`/`user_entry`/`yield` in
//! examples/original_source/process.c. `switch_context` and `user_entry`
//! are naked: the former is a kernel-to-kernel cooperative handoff that
//! ends in a plain `ret`, the latter is the one-time trampoline a fresh
//! process's saved `ra` points at, dropping into U-mode for the first
//! time.

use core::arch::naked_asm;

use super::{ProcState, CURRENT, IDLE_INDEX, PROCS, STACK_SIZE};
use crate::arch::riscv::csr;
use crate::config::PROCS_MAX;

/// Saves the 13 callee-saved words (`ra`, `s0..s11`) of the currently
/// running process onto its own stack, swaps `sp`, and restores the same
/// 13 words for the next process. Ends in `ret`, not `sret` -- this never
/// changes privilege mode, only which kernel stack is live.
#[unsafe(naked)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn switch_context(_prev_sp: *mut u32, _next_sp: *mut u32) {
    naked_asm!(
        "addi sp, sp, -13 * 4",
        "sw ra,  0  * 4(sp)",
        "sw s0,  1  * 4(sp)",
        "sw s1,  2  * 4(sp)",
        "sw s2,  3  * 4(sp)",
        "sw s3,  4  * 4(sp)",
        "sw s4,  5  * 4(sp)",
        "sw s5,  6  * 4(sp)",
        "sw s6,  7  * 4(sp)",
        "sw s7,  8  * 4(sp)",
        "sw s8,  9  * 4(sp)",
        "sw s9,  10 * 4(sp)",
        "sw s10, 11 * 4(sp)",
        "sw s11, 12 * 4(sp)",
        "sw sp, (a0)",
        "lw sp, (a1)",
        "lw ra,  0  * 4(sp)",
        "lw s0,  1  * 4(sp)",
        "lw s1,  2  * 4(sp)",
        "lw s2,  3  * 4(sp)",
        "lw s3,  4  * 4(sp)",
        "lw s4,  5  * 4(sp)",
        "lw s5,  6  * 4(sp)",
        "lw s6,  7  * 4(sp)",
        "lw s7,  8  * 4(sp)",
        "lw s8,  9  * 4(sp)",
        "lw s9,  10 * 4(sp)",
        "lw s10, 11 * 4(sp)",
        "lw s11, 12 * 4(sp)",
        "addi sp, sp, 13 * 4",
        "ret",
    )
}

/// First entry into U-mode for a freshly created process. A process's
/// initial stack frame (see [`super::create_process`]) is built so that
/// `switch_context`'s restore sequence pops this address into `ra`; its
/// `ret` lands here instead of in Rust code.
#[unsafe(naked)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn user_entry() -> ! {
    naked_asm!(
        "li t0, {sepc}",
        "csrw sepc, t0",
        "li t1, {sstatus}",
        "csrw sstatus, t1",
        "sret",
        sepc = const crate::config::USER_BASE,
        sstatus = const crate::config::SSTATUS_SPIE,
    )
}

/// Voluntarily gives up the hart. Scans the table starting at
/// `(current.pid + i) % PROCS_MAX` for the first `Runnable` slot with
/// `pid > 0`, falling back to the idle slot. Returns immediately if that
/// is already the running process; otherwise installs the next
/// process's page table and kernel-stack-top `sscratch` (bracketed by
/// `sfence.vma` on the `satp` write) and calls [`switch_context`].
pub fn yield_now() {
    let mut procs = PROCS.lock();
    let current_idx = *CURRENT.lock();
    let current_pid = procs[current_idx].pid;

    let mut next_idx = *IDLE_INDEX.lock();
    for i in 0..PROCS_MAX as i32 {
        let idx = (current_pid + i).rem_euclid(PROCS_MAX as i32) as usize;
        if procs[idx].state == ProcState::Runnable && procs[idx].pid > 0 {
            next_idx = idx;
            break;
        }
    }

    if next_idx == current_idx {
        return;
    }

    *CURRENT.lock() = next_idx;

    let next_page_table = procs[next_idx].page_table as u32;
    let next_stack_top = procs[next_idx].stack.as_ptr() as u32 + STACK_SIZE as u32;
    let prev_sp_ptr = &mut procs[current_idx].sp as *mut u32;
    let next_sp_ptr = &mut procs[next_idx].sp as *mut u32;

    // The table must not stay locked across `switch_context`: this call
    // suspends on the current process's stack until some later `yield_now`
    // switches back to it, and other processes need the lock meanwhile.
    drop(procs);

    csr::switch_satp(next_page_table);
    csr::write_sscratch(next_stack_top);

    // SAFETY: `prev_sp_ptr`/`next_sp_ptr` address the `sp` field of two
    // distinct slots in the 'static process table; both stay valid for
    // the lifetime of the kernel. The table lock was released above so
    // the process being switched to can take it again once resumed.
    unsafe {
        switch_context(prev_sp_ptr, next_sp_ptr);
    }
}
