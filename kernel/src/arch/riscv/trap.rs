//! Trap entry and dispatch.
//!
//! `kernel_entry` is the address installed in `stvec`. It is naked because
//! it must establish a valid kernel stack (by swapping `sp`/`sscratch`)
//! before any compiled Rust runs -- there is no stack to spill a prologue
//! onto yet. Grounded line-for-line on the original's `kernel_entry`
//! (see `kernel.c`): push all 31 GPRs except `sp` at their documented
//! offsets, recover the pre-trap `sp` out of `sscratch`, re-arm
//! `sscratch` with the (now in-use) kernel stack top, call the C handler
//! with the frame pointer in `a0`, restore everything including `sp`,
//! and `sret`.

use core::arch::naked_asm;

use crate::arch::riscv::csr;
use crate::config::syscall;

/// All 31 general-purpose registers, in the exact order the prologue
/// below pushes them. Matches `kernel.h`'s `struct trap_frame`.
#[repr(C)]
#[derive(Debug)]
pub struct TrapFrame {
    pub ra: u32,
    pub gp: u32,
    pub tp: u32,
    pub t0: u32,
    pub t1: u32,
    pub t2: u32,
    pub t3: u32,
    pub t4: u32,
    pub t5: u32,
    pub t6: u32,
    pub a0: u32,
    pub a1: u32,
    pub a2: u32,
    pub a3: u32,
    pub a4: u32,
    pub a5: u32,
    pub a6: u32,
    pub a7: u32,
    pub s0: u32,
    pub s1: u32,
    pub s2: u32,
    pub s3: u32,
    pub s4: u32,
    pub s5: u32,
    pub s6: u32,
    pub s7: u32,
    pub s8: u32,
    pub s9: u32,
    pub s10: u32,
    pub s11: u32,
    pub sp: u32,
}

#[unsafe(naked)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kernel_entry() {
    naked_asm!(
        ".align 4",
        "csrw sscratch, sp",
        "addi sp, sp, -4 * 31",
        "sw ra,  4 * 0(sp)",
        "sw gp,  4 * 1(sp)",
        "sw tp,  4 * 2(sp)",
        "sw t0,  4 * 3(sp)",
        "sw t1,  4 * 4(sp)",
        "sw t2,  4 * 5(sp)",
        "sw t3,  4 * 6(sp)",
        "sw t4,  4 * 7(sp)",
        "sw t5,  4 * 8(sp)",
        "sw t6,  4 * 9(sp)",
        "sw a0,  4 * 10(sp)",
        "sw a1,  4 * 11(sp)",
        "sw a2,  4 * 12(sp)",
        "sw a3,  4 * 13(sp)",
        "sw a4,  4 * 14(sp)",
        "sw a5,  4 * 15(sp)",
        "sw a6,  4 * 16(sp)",
        "sw a7,  4 * 17(sp)",
        "sw s0,  4 * 18(sp)",
        "sw s1,  4 * 19(sp)",
        "sw s2,  4 * 20(sp)",
        "sw s3,  4 * 21(sp)",
        "sw s4,  4 * 22(sp)",
        "sw s5,  4 * 23(sp)",
        "sw s6,  4 * 24(sp)",
        "sw s7,  4 * 25(sp)",
        "sw s8,  4 * 26(sp)",
        "sw s9,  4 * 27(sp)",
        "sw s10, 4 * 28(sp)",
        "sw s11, 4 * 29(sp)",
        // Recover the pre-trap sp (stashed in sscratch) into the frame.
        "csrr a0, sscratch",
        "sw a0,  4 * 30(sp)",
        // Re-arm sscratch with the top of the now-in-use kernel stack, so a
        // trap nested inside this handler (should one ever occur) would
        // swap onto fresh space rather than clobbering this frame.
        "addi a0, sp, 4 * 31",
        "csrw sscratch, a0",
        "mv a0, sp",
        "call {handle_trap}",
        "lw ra,  4 * 0(sp)",
        "lw gp,  4 * 1(sp)",
        "lw tp,  4 * 2(sp)",
        "lw t0,  4 * 3(sp)",
        "lw t1,  4 * 4(sp)",
        "lw t2,  4 * 5(sp)",
        "lw t3,  4 * 6(sp)",
        "lw t4,  4 * 7(sp)",
        "lw t5,  4 * 8(sp)",
        "lw t6,  4 * 9(sp)",
        "lw a0,  4 * 10(sp)",
        "lw a1,  4 * 11(sp)",
        "lw a2,  4 * 12(sp)",
        "lw a3,  4 * 13(sp)",
        "lw a4,  4 * 14(sp)",
        "lw a5,  4 * 15(sp)",
        "lw a6,  4 * 16(sp)",
        "lw a7,  4 * 17(sp)",
        "lw s0,  4 * 18(sp)",
        "lw s1,  4 * 19(sp)",
        "lw s2,  4 * 20(sp)",
        "lw s3,  4 * 21(sp)",
        "lw s4,  4 * 22(sp)",
        "lw s5,  4 * 23(sp)",
        "lw s6,  4 * 24(sp)",
        "lw s7,  4 * 25(sp)",
        "lw s8,  4 * 26(sp)",
        "lw s9,  4 * 27(sp)",
        "lw s10, 4 * 28(sp)",
        "lw s11, 4 * 29(sp)",
        "lw sp,  4 * 30(sp)",
        "sret",
        handle_trap = sym handle_trap,
    )
}

/// Decodes `scause` and, for an `ecall` from U-mode, routes to the
/// syscall table (spec §4.3). Any other cause is an unrecoverable kernel
/// invariant violation.
extern "C" fn handle_trap(frame: *mut TrapFrame) {
    let scause = csr::read_scause();
    let stval = csr::read_stval();
    let sepc = csr::read_sepc();

    if scause == csr::SCAUSE_ECALL_FROM_U {
        // SAFETY: `frame` points at the trap frame this same prologue just
        // built on the trapping process's kernel stack; it stays valid for
        // the lifetime of this call.
        let frame = unsafe { &mut *frame };
        let ret = dispatch_syscall(frame);
        frame.a0 = ret;
        csr::advance_sepc_past_ecall();
        return;
    }

    panic!(
        "unexpected trap: scause={:#x} stval={:#x} sepc={:#x}",
        scause, stval, sepc
    );
}

/// The fixed `a3`-indexed syscall table (spec §4.3 / §6).
fn dispatch_syscall(frame: &mut TrapFrame) -> u32 {
    match frame.a3 {
        syscall::SYS_PUTCHAR => {
            crate::arch::riscv::sbi::console_putchar(frame.a0 as u8);
            0
        }
        syscall::SYS_GETCHAR => loop {
            let ch = crate::arch::riscv::sbi::console_getchar();
            if ch >= 0 {
                break ch as u32;
            }
            crate::process::scheduler::yield_now();
        },
        syscall::SYS_EXIT => {
            crate::process::exit_current();
            crate::process::scheduler::yield_now();
            unreachable!("an EXITED process is never rescheduled");
        }
        other => panic!("unknown syscall number {}", other),
    }
}
