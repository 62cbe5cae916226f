//! USB HID boot-keyboard output.
//!
//! Report layout (8 bytes): modifier, reserved, 6 keycodes.

use crate::keycodes::KEY_NONE;
use crate::page::Modifiers;

/// Keycodes per report (boot protocol limit).
pub const MAX_REPORT_KEYS: usize = 6;

/// One boot-keyboard input report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyboardReport {
    pub modifier: Modifiers,
    pub keycodes: [u8; MAX_REPORT_KEYS],
}

impl KeyboardReport {
    /// All keys released.
    pub const RELEASE: Self = Self {
        modifier: Modifiers::NONE,
        keycodes: [KEY_NONE; MAX_REPORT_KEYS],
    };

    /// Append a keycode. Returns false if the report is full.
    pub fn push(&mut self, keycode: u8) -> bool {
        match self.keycodes.iter_mut().find(|k| **k == KEY_NONE) {
            Some(slot) => {
                *slot = keycode;
                true
            }
            None => false,
        }
    }

    /// Number of keycodes set.
    pub fn len(&self) -> usize {
        self.keycodes.iter().filter(|k| **k != KEY_NONE).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.modifier.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() == MAX_REPORT_KEYS
    }

    /// Wire format.
    pub fn to_bytes(&self) -> [u8; 8] {
        let k = self.keycodes;
        [self.modifier.bits(), 0, k[0], k[1], k[2], k[3], k[4], k[5]]
    }
}

/// HID output collaborator.
pub trait HidOutput {
    /// True if the endpoint can accept a new report.
    fn ready(&mut self) -> bool;

    /// True if the host has suspended the bus.
    fn suspended(&mut self) -> bool {
        false
    }

    /// Ask a suspended host to resume.
    fn remote_wakeup(&mut self) {}

    /// Queue a report. Only called after `ready()` returned true.
    fn send(&mut self, report: &KeyboardReport);
}
