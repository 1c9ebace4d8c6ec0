//! Kernel console output.
//!
//! All kernel text -- boot banners, panic messages, and `log` records --
//! funnels through SBI's legacy console-putchar call
//! ([`crate::arch::riscv::sbi::console_putchar`]), one byte at a time, the
//! same as the original kernel's `putchar`/`printf`. A `spin::Mutex`
//! serializes writers; the kernel is single-hart and cooperative, so this
//! only ever protects against a `println!` interrupted by a nested one
//! reached through a panic in a format argument. On a host build (`cargo
//! test`, where `arch::riscv` doesn't exist) this falls back to `std`'s
//! stdout, matching the teacher's own per-target `print!`/`println!` split
//! in `print.rs`.

use core::fmt::{self, Write};

#[cfg(target_os = "none")]
use spin::Mutex;

#[cfg(target_os = "none")]
use crate::arch::riscv::sbi;

#[cfg(target_os = "none")]
struct Console;

#[cfg(target_os = "none")]
impl Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            sbi::console_putchar(byte);
        }
        Ok(())
    }
}

#[cfg(target_os = "none")]
static CONSOLE: Mutex<Console> = Mutex::new(Console);

#[doc(hidden)]
#[cfg(target_os = "none")]
pub fn _print(args: fmt::Arguments) {
    // SAFETY: single-hart, no interrupts are ever enabled in S-mode, so this
    // lock is never re-entered.
    let _ = CONSOLE.lock().write_fmt(args);
}

#[doc(hidden)]
#[cfg(not(target_os = "none"))]
pub fn _print(args: fmt::Arguments) {
    std::print!("{}", args);
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::print::_print(format_args!($($arg)*)));
}

#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)));
}

/// A [`log::Log`] implementation that writes through the same console the
/// `println!` banners use, so subsystem diagnostics (`log::info!` and
/// friends) interleave correctly with boot/panic output instead of going to
/// a second, invisible sink.
struct KernelLogger;

impl log::Log for KernelLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        println!("[{:<5}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: KernelLogger = KernelLogger;

/// Installs the kernel logger and sets the max level. Called once from
/// `kernel_main` before any other subsystem init, so every later `log::*`
/// call is live.
pub fn init_logger() {
    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(log::LevelFilter::Info))
        .expect("logger already initialized");
}
