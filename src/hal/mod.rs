//! Hardware Abstraction Layer for RustMacroPad.
//!
//! Thin wrappers around ESP-IDF peripherals. Each one implements a
//! collaborator trait from the core modules; business logic stays there.

pub mod fat;
pub mod leds;
pub mod matrix;
pub mod time;
pub mod usb;

pub use fat::FatSource;
pub use leds::{ActivityLed, BoardIndicators, Ws2812};
pub use matrix::GpioMatrix;
pub use usb::UsbKeyboard;
