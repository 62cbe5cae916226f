//! Status LEDs, RGB indicator LED, WS2812 accent pixel and the storage
//! activity LED.

use core::time::Duration;

use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, OutputPin, PinDriver};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::rmt::config::TransmitConfig;
use esp_idf_svc::hal::rmt::{FixedLengthSignal, PinState, Pulse, RmtChannel, TxRmtDriver};
use esp_idf_svc::sys::EspError;

use crate::indicator::Indicators;
use crate::page::{Color, LED_COUNT};

/// One WS2812 pixel driven over RMT.
pub struct Ws2812<'d> {
    tx: TxRmtDriver<'d>,
}

impl<'d> Ws2812<'d> {
    pub fn new<C: RmtChannel>(
        channel: impl Peripheral<P = C> + 'd,
        pin: impl Peripheral<P = impl OutputPin> + 'd,
    ) -> Result<Self, EspError> {
        let config = TransmitConfig::new().clock_divider(1);
        let tx = TxRmtDriver::new(channel, pin, &config)?;
        Ok(Self { tx })
    }

    /// Send one color (GRB on the wire, MSB first).
    pub fn write(&mut self, color: Color) -> Result<(), EspError> {
        let ticks_hz = self.tx.counter_clock()?;
        let pulse = |state, ns| Pulse::new_with_duration(ticks_hz, state, &Duration::from_nanos(ns));
        let zero = (pulse(PinState::High, 350)?, pulse(PinState::Low, 800)?);
        let one = (pulse(PinState::High, 700)?, pulse(PinState::Low, 600)?);

        let grb = (color.g() as u32) << 16 | (color.r() as u32) << 8 | color.b() as u32;
        let mut signal = FixedLengthSignal::<24>::new();
        for i in 0..24 {
            let bit = grb & (1 << (23 - i)) != 0;
            signal.set(i, if bit { &one } else { &zero })?;
        }
        self.tx.start_blocking(&signal)
    }
}

/// Everything the scan core lights up.
///
/// Status LEDs are active-high; the RGB indicator LED is common-anode
/// (active-low).
pub struct BoardIndicators<'d> {
    status: [PinDriver<'d, AnyOutputPin, Output>; LED_COUNT],
    indicator: [PinDriver<'d, AnyOutputPin, Output>; LED_COUNT],
    pixel: Ws2812<'d>,
}

impl<'d> BoardIndicators<'d> {
    pub fn new(
        status: [AnyOutputPin; LED_COUNT],
        indicator: [AnyOutputPin; LED_COUNT],
        pixel: Ws2812<'d>,
    ) -> Result<Self, EspError> {
        let [s1, s2, s3] = status;
        let [r, g, b] = indicator;
        let mut leds = Self {
            status: [PinDriver::output(s1)?, PinDriver::output(s2)?, PinDriver::output(s3)?],
            indicator: [PinDriver::output(r)?, PinDriver::output(g)?, PinDriver::output(b)?],
            pixel,
        };
        for i in 0..LED_COUNT {
            leds.set_status_led(i, false);
            leds.set_indicator_led(i, false);
        }
        leds.pixel.write(Color::OFF)?;
        Ok(leds)
    }
}

impl Indicators for BoardIndicators<'_> {
    fn set_status_led(&mut self, index: usize, on: bool) {
        if let Some(pin) = self.status.get_mut(index) {
            let _ = pin.set_level(on.into());
        }
    }

    fn set_indicator_led(&mut self, index: usize, on: bool) {
        if let Some(pin) = self.indicator.get_mut(index) {
            let _ = pin.set_level((!on).into());
        }
    }

    fn set_accent(&mut self, color: Color, brightness: u8) {
        let _ = self.pixel.write(color.scaled(brightness));
    }
}

/// On-board LED mirroring host write activity on the storage volume.
pub struct ActivityLed<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
    on: bool,
}

impl<'d> ActivityLed<'d> {
    pub fn new(pin: AnyOutputPin) -> Result<Self, EspError> {
        let mut pin = PinDriver::output(pin)?;
        // Active-low
        pin.set_high()?;
        Ok(Self { pin, on: false })
    }

    pub fn set(&mut self, on: bool) {
        if on != self.on {
            let _ = self.pin.set_level((!on).into());
            self.on = on;
        }
    }
}
