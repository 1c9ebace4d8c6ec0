//! The fixed legacy virtio-mmio block device at `VIRTIO_BLK_PADDR`.
//!
//! There is exactly one device, one queue, and one request in flight at a
//! time -- no PCI transport, no feature negotiation beyond the legacy
//! handshake, no interrupts (spec Non-goals: interrupt-driven I/O, SMP).

pub mod mmio;
pub mod queue;

use spin::Mutex;

use crate::config::{SECTOR_SIZE, VIRTIO_DEVICE_BLK};
use queue::{DescFlags, VirtQueue};

/// `struct virtio_blk_req` equivalent: header, one sector of data, and a
/// one-byte device-written status, carved up into three descriptors by
/// field address.
#[repr(C)]
struct BlkRequest {
    req_type: u32,
    reserved: u32,
    sector: u64,
    data: [u8; SECTOR_SIZE],
    status: u8,
}

const BLK_T_IN: u32 = 0;
const BLK_T_OUT: u32 = 1;

struct BlockDevice {
    queue: VirtQueue,
    request: BlkRequest,
    capacity_sectors: u64,
}

// SAFETY: the device and its request buffer are only ever touched from
// the single hart this kernel runs on, serialized by `DEVICE`'s mutex.
unsafe impl Send for BlockDevice {}

static DEVICE: Mutex<Option<BlockDevice>> = Mutex::new(None);

/// Runs the legacy virtio-mmio handshake and registers queue 0. Panics
/// (this is a boot-time invariant, not a recoverable error) if the
/// device isn't the expected magic/version/type, or if it offers fewer
/// than `VIRTQ_ENTRY_NUM` queue entries.
#[cfg(target_os = "none")]
pub fn init() {
    // SAFETY: `VIRTIO_BLK_PADDR` is a fixed, always-mapped MMIO region
    // on QEMU's `virt` machine.
    let capacity_sectors = unsafe {
        if mmio::read32(mmio::REG_MAGIC) != mmio::MAGIC_VALUE {
            panic!("virtio_blk: bad magic value");
        }
        if mmio::read32(mmio::REG_VERSION) != mmio::LEGACY_VERSION {
            panic!("virtio_blk: unsupported version (want legacy v1)");
        }
        if mmio::read32(mmio::REG_DEVICE_ID) != VIRTIO_DEVICE_BLK {
            panic!("virtio_blk: device id is not a block device");
        }

        mmio::write32(mmio::REG_DEVICE_STATUS, mmio::STATUS_ACK);
        mmio::write32(
            mmio::REG_DEVICE_STATUS,
            mmio::STATUS_ACK | mmio::STATUS_DRIVER,
        );

        mmio::write32(mmio::REG_QUEUE_SEL, 0);
        let queue_num_max = mmio::read32(mmio::REG_QUEUE_NUM_MAX);
        if queue_num_max < crate::config::VIRTQ_ENTRY_NUM as u32 {
            panic!("virtio_blk: device queue is smaller than VIRTQ_ENTRY_NUM");
        }

        // Device config offset 0: 64-bit sector count, low word first.
        let capacity_lo = mmio::read_config_u32(0) as u64;
        let capacity_hi = mmio::read_config_u32(4) as u64;
        (capacity_hi << 32) | capacity_lo
    };

    // SAFETY: queue 0 has not been registered yet; the handshake above
    // has reached the point the virtio spec requires before queue setup.
    let queue = unsafe { VirtQueue::new(0) };

    // SAFETY: queue setup is complete; this is the final legacy
    // handshake step.
    unsafe {
        mmio::write32(
            mmio::REG_DEVICE_STATUS,
            mmio::STATUS_ACK | mmio::STATUS_DRIVER | mmio::STATUS_DRIVER_OK,
        );
    }

    *DEVICE.lock() = Some(BlockDevice {
        queue,
        request: BlkRequest {
            req_type: 0,
            reserved: 0,
            sector: 0,
            data: [0; SECTOR_SIZE],
            status: 0,
        },
        capacity_sectors,
    });
}

/// Reads or writes one `SECTOR_SIZE`-byte sector. On a read, `buf` is
/// overwritten with the sector contents; on a write, `buf`'s contents
/// are sent to the device. Out-of-range sectors and a nonzero device
/// status are both soft errors (spec §4.5/§7): logged, no I/O performed
/// (out-of-range case) or no data copied back (bad-status case), `buf`
/// otherwise left untouched, and nothing is surfaced to the caller.
pub fn read_write_disk(buf: &mut [u8; SECTOR_SIZE], sector: u32, is_write: bool) {
    let mut guard = DEVICE.lock();
    let device = guard
        .as_mut()
        .expect("read_write_disk: virtio_blk::init was not called");

    if sector as u64 >= device.capacity_sectors {
        log::warn!(
            "virtio_blk: sector {} is out of range (capacity {} sectors)",
            sector,
            device.capacity_sectors
        );
        return;
    }

    device.request.req_type = if is_write { BLK_T_OUT } else { BLK_T_IN };
    device.request.sector = sector as u64;
    device.request.status = 0;
    if is_write {
        device.request.data.copy_from_slice(buf);
    }

    let req_addr = &raw const device.request as u32;
    let header_len = 2 * core::mem::size_of::<u32>() as u32 + core::mem::size_of::<u64>() as u32;
    let data_addr = req_addr + header_len;
    let status_addr = data_addr + SECTOR_SIZE as u32;

    let data_flags = if is_write { 0 } else { DescFlags::WRITE.bits() };
    device.queue.submit_chain(&[
        (req_addr, header_len, 0),
        (data_addr, SECTOR_SIZE as u32, data_flags),
        (status_addr, 1, DescFlags::WRITE.bits()),
    ]);
    device.queue.wait_for_completion();

    if device.request.status != 0 {
        log::warn!(
            "virtio_blk: request for sector {} failed with status {}",
            sector,
            device.request.status
        );
        return;
    }

    if !is_write {
        buf.copy_from_slice(&device.request.data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blk_request_header_is_sixteen_bytes() {
        let header_len =
            2 * core::mem::size_of::<u32>() + core::mem::size_of::<u64>();
        assert_eq!(header_len, 16);
    }
}
