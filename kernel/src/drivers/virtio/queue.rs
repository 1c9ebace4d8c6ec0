//! The single legacy split virtqueue used by the block device.
//!
//! Layout and register sequence from `kernel.h`'s `VIRTQ_*` constants;
//! the `fence(Ordering::SeqCst)` memory-ordering idiom around ring
//! updates is the one other_examples/ rv6 ports (e.g. the
//! `batzor-rv6`/`kaist-cp-rv6` `virtio_disk.rs` drivers) use for the same
//! device-visible-ordering requirement.

use core::sync::atomic::{fence, Ordering};

use crate::config::{PAGE_SIZE, VIRTQ_ENTRY_NUM};
use crate::drivers::virtio::mmio;
use crate::mm::frame_allocator::alloc_pages;

bitflags::bitflags! {
    /// Legacy virtio descriptor flag bits (`kernel.h`'s `VIRTQ_DESC_F_*`).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DescFlags: u16 {
        const NEXT = 1 << 0;
        const WRITE = 1 << 1;
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct VirtqDesc {
    pub addr: u64,
    pub len: u32,
    pub flags: u16,
    pub next: u16,
}

#[repr(C)]
pub struct VirtqAvail {
    pub flags: u16,
    pub index: u16,
    pub ring: [u16; VIRTQ_ENTRY_NUM as usize],
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct VirtqUsedElem {
    pub id: u32,
    pub len: u32,
}

#[repr(C)]
pub struct VirtqUsed {
    pub flags: u16,
    pub index: u16,
    pub ring: [VirtqUsedElem; VIRTQ_ENTRY_NUM as usize],
}

const DESC_TABLE_BYTES: usize = core::mem::size_of::<VirtqDesc>() * VIRTQ_ENTRY_NUM as usize;
const AVAIL_BYTES: usize = core::mem::size_of::<VirtqAvail>();
const PADDING_BYTES: usize = PAGE_SIZE as usize - DESC_TABLE_BYTES - AVAIL_BYTES;

/// Descriptor table, available ring, page-granular padding, used ring --
/// all one allocation, matching virtio legacy's `QUEUE_ALIGN = PAGE_SIZE`
/// requirement that the used ring start on a page boundary relative to
/// the descriptor table.
#[repr(C)]
pub struct VirtioVirtq {
    pub descs: [VirtqDesc; VIRTQ_ENTRY_NUM as usize],
    pub avail: VirtqAvail,
    _padding: [u8; PADDING_BYTES],
    pub used: VirtqUsed,
}

const VIRTQ_STRUCT_BYTES: usize = core::mem::size_of::<VirtioVirtq>();
const VIRTQ_PAGES: u32 = (VIRTQ_STRUCT_BYTES as u32).div_ceil(PAGE_SIZE);

pub struct VirtQueue {
    virtq: *mut VirtioVirtq,
    queue_index: u32,
    last_used_index: u16,
}

impl VirtQueue {
    /// Allocates and registers queue `queue_index` with the device.
    /// Caller must already have written `DEVICE_STATUS` through
    /// `ACK | DRIVER` and verified `QUEUE_NUM_MAX >= VIRTQ_ENTRY_NUM`.
    ///
    /// # Safety
    ///
    /// Must be called at most once per `queue_index`, after the device
    /// has been identified and before `DRIVER_OK` is set.
    #[cfg(target_os = "none")]
    pub unsafe fn new(queue_index: u32) -> Self {
        let paddr = alloc_pages(VIRTQ_PAGES);
        let virtq = paddr as *mut VirtioVirtq;

        // SAFETY: forwarded from the caller's contract; `queue_index` is
        // a valid queue selector for this device.
        unsafe {
            mmio::write32(mmio::REG_QUEUE_SEL, queue_index);
            mmio::write32(mmio::REG_QUEUE_NUM, VIRTQ_ENTRY_NUM as u32);
            mmio::write32(mmio::REG_QUEUE_ALIGN, PAGE_SIZE);
            // Legacy quirk (see DESIGN.md): the raw physical address is
            // written here, not `paddr / PAGE_SIZE` as later virtio
            // revisions define. QEMU's legacy virtio-mmio model accepts
            // it for a single, page-aligned queue allocation.
            mmio::write32(mmio::REG_QUEUE_PFN, paddr);
        }

        VirtQueue {
            virtq,
            queue_index,
            last_used_index: 0,
        }
    }

    fn virtq(&mut self) -> &mut VirtioVirtq {
        // SAFETY: `virtq` was allocated by `alloc_pages` in `new` and is
        // never freed or aliased mutably from anywhere else.
        unsafe { &mut *self.virtq }
    }

    /// Submits a chain of `(paddr, len, flags)` descriptors (flags
    /// excluding `DescFlags::NEXT`, which is added automatically between
    /// consecutive entries) starting at descriptor slot 0, and notifies
    /// the device. Synchronous, single-request-at-a-time use only (spec:
    /// busy-polled, no concurrent submissions).
    pub fn submit_chain(&mut self, descs: &[(u32, u32, u16)]) {
        let queue_index = self.queue_index;
        let vq = self.virtq();
        let n = descs.len();
        for (i, &(addr, len, flags)) in descs.iter().enumerate() {
            let next_flag = if i + 1 < n { DescFlags::NEXT.bits() } else { 0 };
            vq.descs[i] = VirtqDesc {
                addr: addr as u64,
                len,
                flags: flags | next_flag,
                next: (i + 1) as u16,
            };
        }

        let avail_index = vq.avail.index;
        vq.avail.ring[(avail_index as usize) % VIRTQ_ENTRY_NUM as usize] = 0;
        fence(Ordering::SeqCst);
        vq.avail.index = avail_index.wrapping_add(1);
        fence(Ordering::SeqCst);

        // SAFETY: `queue_index` is the queue this instance owns.
        unsafe {
            mmio::write32(mmio::REG_QUEUE_NOTIFY, queue_index);
        }
    }

    /// Busy-polls `used.index` until the device has completed the
    /// submitted chain. A 16-bit index can only wrap after 65536
    /// completions; at queue depth 1 with strictly serialized requests
    /// that can never be observed skipping a value, so plain `!=` is a
    /// sufficient comparison (DESIGN.md open question 3).
    pub fn wait_for_completion(&mut self) {
        let last = self.last_used_index;
        loop {
            fence(Ordering::SeqCst);
            if self.virtq().used.index != last {
                break;
            }
            core::hint::spin_loop();
        }
        self.last_used_index = self.virtq().used.index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtq_struct_fits_within_two_pages() {
        assert!(VIRTQ_STRUCT_BYTES > PAGE_SIZE as usize);
        assert_eq!(VIRTQ_PAGES, 2);
    }

    #[test]
    fn used_ring_starts_at_page_boundary() {
        let used_offset = core::mem::offset_of!(VirtioVirtq, used);
        assert_eq!(used_offset, PAGE_SIZE as usize);
    }
}
