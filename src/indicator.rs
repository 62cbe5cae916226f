//! Status indicators: three discrete status LEDs, three indicator LEDs and
//! one RGB accent pixel.

use crate::fault::FaultState;
use crate::page::{Color, Keypage, LED_COUNT};

/// Status indicator collaborator.
pub trait Indicators {
    fn set_status_led(&mut self, index: usize, on: bool);
    fn set_indicator_led(&mut self, index: usize, on: bool);
    /// `color` is unscaled; the implementation applies `brightness`.
    fn set_accent(&mut self, color: Color, brightness: u8);
}

/// Show a page's LED state. `None` turns everything off.
pub fn show_page<I: Indicators + ?Sized>(ind: &mut I, page: Option<&Keypage>, brightness: u8) {
    let blank = Keypage::blank(0);
    let page = page.unwrap_or(&blank);
    for i in 0..LED_COUNT {
        ind.set_status_led(i, page.status_leds[i]);
        ind.set_indicator_led(i, page.indicator_leds[i]);
    }
    ind.set_accent(page.accent_color, brightness);
}

/// Blinks the accent red while a config fault is active.
pub struct FaultBlinker {
    half_period: u32,
    cycles: u32,
    lit: bool,
    showing: bool,
}

impl FaultBlinker {
    /// `half_period` is counted in scan cycles.
    pub const fn new(half_period: u32) -> Self {
        Self {
            half_period: if half_period == 0 { 1 } else { half_period },
            cycles: 0,
            lit: false,
            showing: false,
        }
    }

    /// True while the blinker owns the accent pixel.
    #[inline]
    pub fn is_showing(&self) -> bool {
        self.showing
    }

    /// Forget the blink phase. Called after the page repainted the accent,
    /// so an active fault takes the pixel back on the next update.
    pub fn restart(&mut self) {
        self.showing = false;
        self.cycles = 0;
        self.lit = false;
    }

    /// Advance one scan cycle.
    ///
    /// Returns true when the fault just cleared and the caller must restore
    /// the active page's accent.
    pub fn update<I: Indicators + ?Sized>(
        &mut self,
        fault: &FaultState,
        ind: &mut I,
        brightness: u8,
    ) -> bool {
        if !fault.is_active() {
            let cleared = self.showing;
            self.showing = false;
            self.cycles = 0;
            self.lit = false;
            return cleared;
        }

        if !self.showing || self.cycles == 0 {
            self.showing = true;
            self.lit = !self.lit;
            let color = if self.lit { Color::RED } else { Color::OFF };
            ind.set_accent(color, brightness);
        }
        self.cycles = (self.cycles + 1) % self.half_period;
        false
    }
}
