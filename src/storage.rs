//! Storage collaborator.
//!
//! The config document lives on a FAT volume that the host also sees as a
//! USB mass-storage drive. While the host owns the volume the app side cannot
//! read it. When the host ejects or unmounts the drive, its writes are on the
//! medium and the volume returns to the app, which raises the
//! contents-changed signal that triggers a re-parse.
//!
//! ```text
//! Host (MSC)            StorageEvents         Config core
//! claims volume   ──▶ writing = true
//! ejects volume   ──▶ changed = true ────▶ take_changed() → reload
//! ```

use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::ReadError;

/// Result of asking for app-side access to the volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    /// Mounted on the app side and readable.
    Mounted,
    /// The USB host owns the volume. It comes back on eject.
    HostBusy,
    /// No filesystem found.
    Unformatted,
}

/// Read access to the volume holding the config document.
pub trait ConfigSource {
    /// Make the volume readable by the app. Called before every reload and
    /// must be a no-op when already mounted.
    fn mount(&mut self) -> MountState;

    /// Drop any cached file data so the next read sees host writes.
    fn invalidate(&mut self) {}

    /// Size of the file at `path` in bytes.
    fn file_size(&mut self, path: &str) -> Result<usize, ReadError>;

    /// Read from the start of `path` into `buf`. Returns bytes read.
    fn read(&mut self, path: &str, buf: &mut [u8]) -> Result<usize, ReadError>;
}

/// Signals raised by the mass-storage side, consumed by the config loader.
pub struct StorageEvents {
    changed: AtomicBool,
    writing: AtomicBool,
    flushes: AtomicU32,
}

impl StorageEvents {
    /// Starts with `changed` set so the first poll loads the document.
    pub const fn new() -> Self {
        Self {
            changed: AtomicBool::new(true),
            writing: AtomicBool::new(false),
            flushes: AtomicU32::new(0),
        }
    }

    /// Host took the volume and may be writing blocks.
    #[inline]
    pub fn write_started(&self) {
        self.writing.store(true, Ordering::Release);
    }

    /// Host released the volume with its writes on the medium.
    #[inline]
    pub fn flushed(&self) {
        self.writing.store(false, Ordering::Release);
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.mark_changed();
    }

    /// Request a reload without a host write (retry path).
    #[inline]
    pub fn mark_changed(&self) {
        self.changed.store(true, Ordering::Release);
    }

    /// Consume the changed signal.
    #[inline]
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub fn is_writing(&self) -> bool {
        self.writing.load(Ordering::Acquire)
    }

    #[inline]
    pub fn flush_count(&self) -> u32 {
        self.flushes.load(Ordering::Relaxed)
    }
}

impl Default for StorageEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Raised by the MSC callbacks, polled by the config loop.
pub static STORAGE_EVENTS: StorageEvents = StorageEvents::new();

/// Read the whole document at `path`.
///
/// Fails with `TooLarge` above `limit` and with `ShortRead` if fewer bytes
/// arrive than the reported size. Partial documents are never returned.
pub fn read_document<S: ConfigSource + ?Sized>(
    source: &mut S,
    path: &str,
    limit: usize,
) -> Result<Vec<u8>, ReadError> {
    let size = source.file_size(path)?;
    if size > limit {
        return Err(ReadError::TooLarge { size, limit });
    }

    let mut buf = vec![0u8; size];
    let actual = source.read(path, &mut buf)?;
    if actual < size {
        return Err(ReadError::ShortRead { expected: size, actual });
    }
    Ok(buf)
}
