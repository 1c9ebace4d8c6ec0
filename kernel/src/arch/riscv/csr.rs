//! Supervisor CSR access.
//!
//! Grounded directly on `kernel.h`'s `READ_CSR`/`WRITE_CSR` macros: thin,
//! single-instruction `asm!` wrappers, used from the (non-naked) trap
//! handler and scheduler. The naked prologues in [`super::trap`] and
//! `crate::process::scheduler` read/write these same CSRs directly in
//! their own hand-written `asm!` blocks, since a naked function's body
//! must be pure assembly -- it cannot call back into compiled Rust before
//! the register save is complete.

use core::arch::asm;

/// `scause` value for an environment call from U-mode.
pub const SCAUSE_ECALL_FROM_U: u32 = 8;

macro_rules! read_csr {
    ($name:ident, $csr:literal) => {
        pub fn $name() -> u32 {
            let value: u32;
            // SAFETY: reads a read-only supervisor CSR; always valid in S-mode.
            unsafe {
                asm!(concat!("csrr {0}, ", $csr), out(reg) value);
            }
            value
        }
    };
}

read_csr!(read_scause, "scause");
read_csr!(read_stval, "stval");
read_csr!(read_sepc, "sepc");

/// Advances `sepc` by 4 (the width of an uncompressed `ecall`) so that
/// `sret` resumes user execution just past the instruction that trapped.
pub fn advance_sepc_past_ecall() {
    let next = read_sepc() + 4;
    // SAFETY: only called from the ecall path in `handle_trap`, after the
    // trap frame has already captured the pre-trap register state.
    unsafe {
        asm!("csrw sepc, {0}", in(reg) next);
    }
}

/// Installs `root_table_paddr >> 12` as the Sv32 `satp` root, fenced on
/// both sides per the scheduler's ordering discipline (see spec §5).
pub fn switch_satp(root_table_paddr: u32) {
    let satp = crate::config::SATP_SV32 | (root_table_paddr >> 12);
    // SAFETY: `root_table_paddr` is a page-aligned physical address of a
    // page the caller (the scheduler) owns as the next process's page
    // table root; the surrounding fences make the new mapping visible
    // before anything executes under it.
    unsafe {
        asm!("sfence.vma");
        asm!("csrw satp, {0}", in(reg) satp);
        asm!("sfence.vma");
    }
}

/// Writes `sscratch`, the per-hart slot the trap prologue swaps into `sp`.
pub fn write_sscratch(value: u32) {
    // SAFETY: `value` is the top of a process's in-PCB kernel stack; the
    // trap prologue only ever treats this as a stack pointer.
    unsafe {
        asm!("csrw sscratch, {0}", in(reg) value);
    }
}

/// Installs `handler` (a 4-byte-aligned, naked trap entry) as `stvec` in
/// direct mode (mode bits left at 0).
pub fn write_stvec(handler: usize) {
    // SAFETY: `handler` is `trap::kernel_entry`, a naked function aligned
    // to 4 bytes as `stvec`'s direct mode requires.
    unsafe {
        asm!("csrw stvec, {0}", in(reg) handler);
    }
}
