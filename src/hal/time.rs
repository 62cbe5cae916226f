//! Millisecond timebase.

use esp_idf_svc::sys;

/// Milliseconds since boot. Wraps after ~49 days.
#[inline]
pub fn now_ms() -> u32 {
    // SAFETY: esp_timer is started by the IDF before app_main
    let us = unsafe { sys::esp_timer_get_time() };
    (us / 1000) as u32
}
