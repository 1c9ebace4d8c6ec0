//! Entry point: zero BSS, install the trap vector, bring up the block
//! device and file store, create the idle and initial shell processes,
//! and fall into the cooperative scheduler loop.
//!
//! Grounded on `kernel_main`/`boot` in examples/original_source/kernel.c:
//! the only things that differ are module names (`cap`/`ipc`/`sched` from
//! the teacher's microkernel are replaced by this kernel's `mm`/`process`/
//! `drivers`/`fs`) and that BSS zeroing, trap vector installation, and
//! process creation are spelled out explicitly here instead of living
//! inline in one C function.

#![no_std]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(not(target_os = "none"))]
extern crate std;

use core::panic::PanicInfo;

#[macro_use]
mod print;

mod arch;
mod config;
mod drivers;
mod error;
mod fs;
mod mm;
mod process;
mod utils;

#[cfg(target_os = "none")]
unsafe extern "C" {
    static __bss: u8;
    static __bss_end: u8;
}

/// The embedded initial user program (the "shell"), built by
/// `userland/shell` and objcopied to a flat binary by this crate's
/// `build.rs`. Handed to [`process::create_process`] as the kernel's
/// only process besides idle (spec §6: "Supplemented features").
#[cfg(target_os = "none")]
static SHELL_IMAGE: &[u8] = include_bytes!(env!("SHELL_BIN_PATH"));

#[cfg(target_os = "none")]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    println!("PANIC: {}", info);
    loop {
        // SAFETY: halting the hart in an unrecoverable state; nothing else
        // runs concurrently on this single-hart kernel.
        unsafe { core::arch::asm!("wfi") };
    }
}

/// The very first Rust code to run, jumped to by `arch::riscv::boot::boot`
/// with `sp` already set to `__stack_top`.
#[cfg(target_os = "none")]
#[unsafe(no_mangle)]
pub extern "C" fn kernel_main() -> ! {
    // SAFETY: `__bss..__bss_end` is the linker-reserved BSS region; nothing
    // has read from it yet, this is the first thing the kernel does.
    unsafe {
        let start = &raw const __bss as *mut u8;
        let end = &raw const __bss_end as *const u8;
        let len = end as usize - start as usize;
        core::ptr::write_bytes(start, 0, len);
    }

    // SAFETY: `kernel_entry` is a naked, 4-byte-aligned trap prologue;
    // installing it as `stvec` in direct mode is the documented contract.
    arch::riscv::csr::write_stvec(arch::riscv::trap::kernel_entry as usize);

    print::init_logger();
    let v = utils::version::get_version_info();
    println!(
        "rv32-teaching-kernel v{}.{}.{} ({} @ {})",
        v.major, v.minor, v.patch, v.git_hash, v.build_timestamp
    );
    log::info!("bss cleared, trap vector installed");

    drivers::init();
    fs::init();

    let idle_pid = process::create_process(&[]);
    process::make_current_idle(idle_pid);
    log::info!("idle process created");

    let shell_pid = process::create_process(SHELL_IMAGE);
    log::info!("shell process created, pid={}", shell_pid);

    loop {
        process::scheduler::yield_now();
    }
}
