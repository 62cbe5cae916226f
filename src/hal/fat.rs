//! Config document access on the FAT volume shared with the USB host.

use core::ffi::{c_void, CStr};

use esp_idf_svc::sys;
use esp_idf_svc::sys::tinyusb as tusb;

use crate::config::ReadError;
use crate::storage::{ConfigSource, MountState};

/// VFS mount point of the storage partition.
pub const BASE_PATH: &CStr = c"/fat";

/// Longest path accepted, including the terminator.
const MAX_PATH: usize = 64;

/// Reads files through newlib on the app-side FAT mount.
pub struct FatSource {
    _private: (),
}

impl FatSource {
    /// The MSC storage must already be initialised (see `hal::usb::install`).
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for FatSource {
    fn default() -> Self {
        Self::new()
    }
}

/// `path` as a NUL-terminated C string in `buf`.
fn c_path<'b>(path: &str, buf: &'b mut [u8; MAX_PATH]) -> Result<&'b CStr, ReadError> {
    let bytes = path.as_bytes();
    if bytes.len() >= MAX_PATH || bytes.contains(&0) {
        return Err(ReadError::NotFound);
    }
    buf[..bytes.len()].copy_from_slice(bytes);
    buf[bytes.len()] = 0;
    CStr::from_bytes_until_nul(&buf[..]).map_err(|_| ReadError::NotFound)
}

fn errno() -> i32 {
    // SAFETY: newlib per-task errno
    unsafe { *sys::__errno() }
}

impl ConfigSource for FatSource {
    fn mount(&mut self) -> MountState {
        // SAFETY: plain IDF calls; the path is static
        unsafe {
            if tusb::tinyusb_msc_storage_in_use_by_usb_host() {
                return MountState::HostBusy;
            }
            // Returns ESP_OK without remounting when the app already holds it
            if tusb::tinyusb_msc_storage_mount(BASE_PATH.as_ptr()) == sys::ESP_OK {
                MountState::Mounted
            } else {
                MountState::Unformatted
            }
        }
    }

    fn file_size(&mut self, path: &str) -> Result<usize, ReadError> {
        let mut buf = [0u8; MAX_PATH];
        let path = c_path(path, &mut buf)?;

        // SAFETY: `st` is plain data filled by stat
        let mut st: sys::stat = unsafe { core::mem::zeroed() };
        if unsafe { sys::stat(path.as_ptr(), &mut st) } != 0 {
            return Err(match errno() as u32 {
                sys::ENOENT => ReadError::NotFound,
                _ => ReadError::Io { code: errno() },
            });
        }
        Ok(st.st_size as usize)
    }

    fn read(&mut self, path: &str, buf: &mut [u8]) -> Result<usize, ReadError> {
        let mut name = [0u8; MAX_PATH];
        let path = c_path(path, &mut name)?;

        // SAFETY: file handle is checked and closed on every path
        unsafe {
            let file = sys::fopen(path.as_ptr(), c"rb".as_ptr());
            if file.is_null() {
                return Err(ReadError::NotFound);
            }
            let n = sys::fread(buf.as_mut_ptr() as *mut c_void, 1, buf.len() as _, file);
            let failed = sys::ferror(file) != 0;
            sys::fclose(file);
            if failed {
                return Err(ReadError::Io { code: errno() });
            }
            Ok(n as usize)
        }
    }
}
