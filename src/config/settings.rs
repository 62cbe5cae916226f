//! Firmware tunables.

/// Compile-time firmware settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    /// VFS path of the keymap document.
    pub config_path: &'static str,
    /// Documents larger than this are rejected unread.
    pub max_config_bytes: usize,
    /// Per-row settling delay while a column is driven.
    pub settle_delay_ms: u32,
    /// Scan core poll interval while waiting for the registry handoff.
    pub handoff_poll_ms: u32,
    /// Delay before re-reading after a read error.
    pub fs_retry_ms: u32,
    /// Config core loop period (storage poll and log drain).
    pub config_poll_ms: u32,
    /// Pause between scan cycles.
    pub scan_period_ms: u32,
    /// Brightness (0-255) applied to the accent color.
    pub neopixel_brightness: u8,
    /// Scan cycles per half-period of the fault blink.
    pub fault_blink_cycles: u32,
}

impl Settings {
    pub const DEFAULT: Self = Self {
        config_path: "/fat/config.json",
        max_config_bytes: 16 * 1024,
        settle_delay_ms: 1,
        handoff_poll_ms: 100,
        fs_retry_ms: 1000,
        config_poll_ms: 50,
        scan_period_ms: 2,
        neopixel_brightness: 50,
        fault_blink_cycles: 64,
    };
}

impl Default for Settings {
    fn default() -> Self {
        Self::DEFAULT
    }
}
