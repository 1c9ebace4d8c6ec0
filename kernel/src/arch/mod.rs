//! Architecture support.
//!
//! This kernel targets one machine: QEMU's 32-bit RISC-V `virt` board
//! booted by OpenSBI. There is no architecture abstraction layer to
//! dispatch over -- `riscv` is the only arch module, re-exported flat so
//! callers write `arch::sbi::console_putchar` rather than threading a
//! target-arch match through every call site.

#[cfg(target_os = "none")]
pub mod riscv;
#[cfg(target_os = "none")]
pub use riscv::*;
