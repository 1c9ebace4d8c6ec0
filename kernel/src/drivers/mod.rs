//! Device drivers.
//!
//! One driver: the fixed legacy virtio-mmio block device backing the
//! flat file store (spec Non-goals exclude every other device class --
//! network, USB, GPU, PCI enumeration).

pub mod virtio;

/// Runs the virtio-mmio block device handshake. Must be called once,
/// during early boot, before [`crate::fs::init`].
#[cfg(target_os = "none")]
pub fn init() {
    virtio::init();
}
