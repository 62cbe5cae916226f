//! One-shot cross-core handoff.
//!
//! Moves a `&'static T` from the core that builds it to the core that uses
//! it, exactly once. Used at startup to give the scan core the address of
//! the page registry.
//!
//! ```text
//! Core 1                    Handoff                  Core 0
//! publish(&REGISTRY) ──▶ AtomicPtr (null → ptr) ──▶ receive_blocking()
//! ```
//!
//! # Rules
//!
//! - Single producer, single consumer
//! - The first publish wins; later publishes are rejected, never overwrite
//! - Release on publish, Acquire on receive: the receiver sees everything
//!   written to `T` before it was published
//! - Receiving never blocks inside the primitive; the caller supplies the
//!   wait between polls

use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use thiserror::Error;

/// Handoff failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffError {
    #[error("value already published")]
    AlreadyPublished,
}

/// Single-value, publish-once channel.
pub struct Handoff<T: 'static> {
    value: AtomicPtr<T>,
}

impl<T: Sync + 'static> Handoff<T> {
    /// Create an empty handoff (nothing published).
    pub const fn new() -> Self {
        Self {
            value: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Publish `value`. Only the first call succeeds.
    pub fn publish(&self, value: &'static T) -> Result<(), HandoffError> {
        let p = value as *const T as *mut T;
        self.value
            .compare_exchange(ptr::null_mut(), p, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| HandoffError::AlreadyPublished)
    }

    /// Non-blocking receive.
    #[inline]
    pub fn try_receive(&self) -> Option<&'static T> {
        let p = self.value.load(Ordering::Acquire);
        // SAFETY: Only ever null or derived from a `&'static T` in `publish`.
        unsafe { p.as_ref() }
    }

    /// Poll until published, calling `wait` between polls.
    ///
    /// Returns immediately if the value is already there.
    pub fn receive_blocking(&self, mut wait: impl FnMut()) -> &'static T {
        loop {
            if let Some(value) = self.try_receive() {
                return value;
            }
            wait();
        }
    }

    #[inline]
    pub fn is_published(&self) -> bool {
        !self.value.load(Ordering::Acquire).is_null()
    }
}

impl<T: Sync + 'static> Default for Handoff<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_until_published() {
        static VALUE: u32 = 7;
        let handoff: Handoff<u32> = Handoff::new();
        assert!(!handoff.is_published());
        assert_eq!(handoff.try_receive(), None);

        handoff.publish(&VALUE).unwrap();
        assert!(handoff.is_published());
        assert_eq!(handoff.try_receive(), Some(&7));
    }

    #[test]
    fn test_second_publish_rejected() {
        static FIRST: u32 = 1;
        static SECOND: u32 = 2;
        let handoff: Handoff<u32> = Handoff::new();
        handoff.publish(&FIRST).unwrap();
        assert_eq!(handoff.publish(&SECOND), Err(HandoffError::AlreadyPublished));
        assert!(ptr::eq(handoff.try_receive().unwrap(), &FIRST));
    }

    #[test]
    fn test_receive_blocking_counts_waits() {
        static VALUE: u32 = 3;
        let handoff: Handoff<u32> = Handoff::new();
        let mut waits = 0;
        let got = handoff.receive_blocking(|| {
            waits += 1;
            if waits == 5 {
                handoff.publish(&VALUE).unwrap();
            }
        });
        assert_eq!(*got, 3);
        assert_eq!(waits, 5);
    }
}
