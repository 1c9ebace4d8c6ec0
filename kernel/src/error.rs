//! Kernel error types.
//!
//! Per the design's own non-goal ("recoverable kernel errors"), almost
//! everything here panics directly on an invariant violation, the same way
//! the original C kernel's `PANIC()` macro does -- the trap dispatcher,
//! scheduler, and page allocator never return a `Result`. The one call site
//! where recovery is meaningful is rebuilding a tar image whose in-memory
//! file table doesn't fit back into the disk buffer.

use core::fmt;

/// Tar-backed file store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// A file entry's name or data doesn't fit back into its ustar record.
    Truncated,
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "file entry does not fit its ustar record"),
        }
    }
}
