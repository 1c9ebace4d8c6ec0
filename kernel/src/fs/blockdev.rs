//! Thin sector-addressed wrapper around [`crate::drivers::virtio`].
//!
//! `fs::tar` only ever needs whole-disk read and whole-disk write; this
//! module is just the loop over sectors that `fs_init`/`fs_flush` build
//! on, kept separate so the tar (de)serialization logic doesn't also
//! have to know about `SECTOR_SIZE` bookkeeping.

use crate::config::SECTOR_SIZE;
use crate::drivers::virtio;

/// Reads `buf.len()` bytes (rounded up to whole sectors) starting at
/// sector 0 into `buf`. `buf.len()` must be a multiple of `SECTOR_SIZE`.
pub fn read_disk(buf: &mut [u8]) {
    assert!(
        buf.len() % SECTOR_SIZE == 0,
        "read_disk: buffer is not a whole number of sectors"
    );
    for (sector, chunk) in buf.chunks_mut(SECTOR_SIZE).enumerate() {
        let sector_buf: &mut [u8; SECTOR_SIZE] = chunk
            .try_into()
            .expect("read_disk: chunks_mut(SECTOR_SIZE) always yields full sectors");
        virtio::read_write_disk(sector_buf, sector as u32, false);
    }
}

/// Writes `buf.len()` bytes (rounded up to whole sectors) to sector 0
/// onward. `buf.len()` must be a multiple of `SECTOR_SIZE`.
pub fn write_disk(buf: &[u8]) {
    assert!(
        buf.len() % SECTOR_SIZE == 0,
        "write_disk: buffer is not a whole number of sectors"
    );
    for (sector, chunk) in buf.chunks(SECTOR_SIZE).enumerate() {
        let mut sector_buf = [0u8; SECTOR_SIZE];
        sector_buf.copy_from_slice(chunk);
        virtio::read_write_disk(&mut sector_buf, sector as u32, true);
    }
}
