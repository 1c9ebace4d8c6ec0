//! Tar-backed flat file store.
//!
//! A fixed `FILES_MAX`-entry table, loaded wholesale from an in-memory
//! disk image at boot ([`init`]) and rewritten wholesale on demand
//! ([`flush`]). There is no directory structure, no path resolution, no
//! incremental writes -- the entire store is load-everything /
//! save-everything, matching the original's `fs_init`/`fs_flush` (spec
//! §4.6).

pub mod blockdev;
pub mod tar;

use crate::config::{FILES_MAX, FILE_MAX_SIZE, SECTOR_SIZE};

const HEADER_SIZE: usize = 512;

/// One file's worth of capacity: a header-sized record plus its payload,
/// rounded up to a whole number of sectors.
const RECORD_SIZE: usize = {
    let unrounded = HEADER_SIZE + FILE_MAX_SIZE;
    (unrounded + SECTOR_SIZE - 1) / SECTOR_SIZE * SECTOR_SIZE
};

/// Total size of the in-memory disk image: enough sectors for
/// `FILES_MAX` maximally sized records.
pub const DISK_SIZE: usize = FILES_MAX * RECORD_SIZE;

/// One slot in the flat file table.
#[derive(Clone, Copy)]
pub struct FileEntry {
    pub in_use: bool,
    pub name: [u8; 100],
    pub size: u32,
    pub data: [u8; FILE_MAX_SIZE],
}

impl FileEntry {
    pub const fn unused() -> Self {
        FileEntry {
            in_use: false,
            name: [0; 100],
            size: 0,
            data: [0; FILE_MAX_SIZE],
        }
    }
}

#[cfg(target_os = "none")]
mod device {
    use spin::Mutex;

    use super::{blockdev, tar, FileEntry, DISK_SIZE};
    use crate::config::FILES_MAX;

    pub static FILES: Mutex<[FileEntry; FILES_MAX]> = Mutex::new([FileEntry::unused(); FILES_MAX]);
    static DISK: Mutex<[u8; DISK_SIZE]> = Mutex::new([0; DISK_SIZE]);

    /// Reads the whole disk image into [`DISK`], then parses it into
    /// [`FILES`]. Must be called once, after [`crate::drivers::init`].
    pub fn init() {
        let mut disk = DISK.lock();
        blockdev::read_disk(&mut *disk);
        tar::parse_records(&*disk, &mut *FILES.lock());
    }

    /// Rebuilds the disk image from the current [`FILES`] table and
    /// writes it back in full. Any sector not covered by an in-use file
    /// is left zeroed (spec DESIGN.md open question (d)).
    pub fn flush() {
        let mut disk = DISK.lock();
        disk.fill(0);
        tar::build_records(&FILES.lock(), &mut *disk)
            .unwrap_or_else(|e| panic!("fs_flush: {:?}", e));
        blockdev::write_disk(&*disk);
    }
}

#[cfg(target_os = "none")]
pub use device::{flush, init, FILES};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_size_is_sector_aligned() {
        assert_eq!(RECORD_SIZE % SECTOR_SIZE, 0);
    }

    #[test]
    fn disk_size_holds_every_file_at_max_size() {
        assert_eq!(DISK_SIZE, FILES_MAX * (HEADER_SIZE + FILE_MAX_SIZE));
    }
}
