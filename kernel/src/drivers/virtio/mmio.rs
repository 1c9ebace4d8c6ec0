//! Raw register access for the single legacy (v1) virtio-mmio block
//! device QEMU's `virt` machine exposes at a fixed base address.
//!
//! Offsets and magic values are `kernel.h`'s `VIRTIO_REG_*`/`VIRTIO_STATUS_*`
//! macros carried over unchanged; there is no probing across multiple
//! slots or transports (spec Non-goals: only one fixed block device).

use crate::config::VIRTIO_BLK_PADDR;

pub const REG_MAGIC: usize = 0x00;
pub const REG_VERSION: usize = 0x04;
pub const REG_DEVICE_ID: usize = 0x08;
pub const REG_QUEUE_SEL: usize = 0x30;
pub const REG_QUEUE_NUM_MAX: usize = 0x34;
pub const REG_QUEUE_NUM: usize = 0x38;
pub const REG_QUEUE_ALIGN: usize = 0x3c;
pub const REG_QUEUE_PFN: usize = 0x40;
pub const REG_QUEUE_NOTIFY: usize = 0x50;
pub const REG_DEVICE_STATUS: usize = 0x70;
pub const REG_DEVICE_CONFIG: usize = 0x100;

pub const MAGIC_VALUE: u32 = 0x7472_6976; // "virt", little-endian
pub const LEGACY_VERSION: u32 = 1;

pub const STATUS_ACK: u32 = 1;
pub const STATUS_DRIVER: u32 = 2;
pub const STATUS_DRIVER_OK: u32 = 4;
pub const STATUS_FEAT_OK: u32 = 8;

fn reg_ptr(offset: usize) -> *mut u32 {
    (VIRTIO_BLK_PADDR + offset) as *mut u32
}

/// Reads a 32-bit virtio-mmio register.
///
/// # Safety
///
/// `offset` must be a valid register offset for the device mapped at
/// `VIRTIO_BLK_PADDR`.
pub unsafe fn read32(offset: usize) -> u32 {
    // SAFETY: forwarded from the caller's contract; the address is a
    // live MMIO register, so a plain volatile read is required.
    unsafe { reg_ptr(offset).read_volatile() }
}

/// Writes a 32-bit virtio-mmio register.
///
/// # Safety
///
/// `offset` must be a valid, writable register offset for the device
/// mapped at `VIRTIO_BLK_PADDR`.
pub unsafe fn write32(offset: usize, value: u32) {
    // SAFETY: forwarded from the caller's contract.
    unsafe { reg_ptr(offset).write_volatile(value) }
}

/// Reads one 32-bit word out of the device-specific configuration space
/// (offset relative to [`REG_DEVICE_CONFIG`]). The block device's
/// 64-bit sector count lives at offsets 0 and 4 here (spec §6: "device
/// config area holds the 64-bit sector count at offset 0").
///
/// # Safety
///
/// `offset` must fall within the device's configuration space.
pub unsafe fn read_config_u32(offset: usize) -> u32 {
    // SAFETY: forwarded from the caller's contract.
    unsafe { ((VIRTIO_BLK_PADDR + REG_DEVICE_CONFIG + offset) as *const u32).read_volatile() }
}
