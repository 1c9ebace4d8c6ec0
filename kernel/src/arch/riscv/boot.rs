//! The very first instruction executed in supervisor mode.
//!
//! OpenSBI jumps here with an undefined stack pointer. `boot` is naked
//! and placed in `.text.boot` (kept first by `link.ld`) so its address is
//! fixed firmware's entry point; it sets `sp = __stack_top` and jumps
//! straight to `kernel_main`, never returning. Grounded on the original's
//! `boot()`:
//! ```c
//! __attribute__((section(".text.boot"))) __attribute__((naked)) void boot(void) {
//!   __asm__ __volatile__("mv sp, %[stack_top]\n"
//!                        "j kernel_main\n"
//!                        : : [stack_top] "r"(__stack_top));
//! }
//! ```

use core::arch::naked_asm;

#[unsafe(naked)]
#[unsafe(link_section = ".text.boot")]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn boot() -> ! {
    naked_asm!(
        "la sp, __stack_top",
        "j {kernel_main}",
        kernel_main = sym crate::kernel_main,
    )
}
