//! Configuration fault state.
//!
//! Set by the config loader when a load fails, read by the scan core to
//! drive the accent LED. A fault never stops key output: the last good
//! configuration stays in effect while the fault is shown.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Why the last configuration load failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// The document was read but failed validation.
    ConfigInvalid = 1,

    /// The document could not be read (unformatted volume, missing file,
    /// oversized file, short read).
    ConfigUnreadable = 2,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::ConfigInvalid,
            2 => FaultCode::ConfigUnreadable,
            _ => FaultCode::None,
        }
    }
}

/// Thread-safe fault state.
///
/// ```ignore
/// static CONFIG_FAULT: FaultState = FaultState::new();
///
/// // Config core, after a failed load:
/// CONFIG_FAULT.set(FaultCode::ConfigInvalid, failures);
///
/// // Scan core, every cycle:
/// if blinker.update(&CONFIG_FAULT, &mut indicators, brightness) {
///     show_page(&mut indicators, registry.get(active).as_ref(), brightness);
/// }
/// ```
pub struct FaultState {
    active: AtomicBool,

    code: AtomicU8,

    /// Consecutive failed loads at the time of the fault.
    data: AtomicU32,

    /// Total fault count since boot (never cleared).
    count: AtomicU32,
}

impl FaultState {
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicU32::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Raise a fault. Increments the fault counter.
    #[inline]
    pub fn set(&self, code: FaultCode, data: u32) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Only meaningful while `is_active()`.
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Acquire)
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Clear the active flag. The counter is kept.
    #[inline]
    pub fn clear(&self) {
        self.active.store(false, Ordering::Release);
    }

    #[inline]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            active: self.is_active(),
            code: self.code(),
            data: self.data(),
            count: self.count(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: u32,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_set_and_clear() {
        let fault = FaultState::new();
        assert!(!fault.is_active());
        assert_eq!(fault.code(), FaultCode::None);

        fault.set(FaultCode::ConfigInvalid, 2);
        let snap = fault.snapshot();
        assert!(snap.active);
        assert_eq!(snap.code, FaultCode::ConfigInvalid);
        assert_eq!(snap.data, 2);

        fault.clear();
        assert!(!fault.is_active());
        assert_eq!(fault.count(), 1);
    }

    #[test]
    fn test_unknown_code_reads_as_none() {
        assert_eq!(FaultCode::from_u8(2), FaultCode::ConfigUnreadable);
        assert_eq!(FaultCode::from_u8(9), FaultCode::None);
    }
}
