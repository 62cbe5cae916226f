//! # RustMacroPad
//!
//! 3×3 macro keypad firmware. The keymap is a `config.json` document on a
//! FAT volume the host sees as a USB drive; the keypad itself is a USB
//! boot keyboard.
//!
//! ## Architecture
//!
//! ```text
//! Core 1 (config)                                   Core 0 (scan)
//! ───────────────                                   ─────────────
//! StorageEvents ─▶ ConfigLoader ─commit()─▶ PageRegistry ◀─get()─ ScanEngine
//!                                              │                    │
//!                  Handoff<PageRegistry> ──────┴── once at boot ───▶│
//!                                                                   ▼
//!                                                      HID report / LEDs
//! ```
//!
//! - The registry is the only state shared between cores. One writer,
//!   versioned reads, storage that never moves.
//! - Everything except `hal` is hardware-free and tested on the host.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod engine;
pub mod fault;
pub mod handoff;
pub mod hid;
pub mod indicator;
pub mod keycodes;
pub mod log_globals;
pub mod logging;
pub mod matrix;
pub mod page;
pub mod registry;
pub mod storage;
pub mod uart_logger;

#[cfg(target_os = "espidf")]
pub mod hal;

pub use config::{ConfigLoader, LoadError, ReadError, Settings, ValidationError};
pub use engine::{CycleOutcome, ScanEngine};
pub use fault::{FaultCode, FaultState};
pub use handoff::{Handoff, HandoffError};
pub use hid::{HidOutput, KeyboardReport};
pub use indicator::Indicators;
pub use log_globals::{CONFIG_LOG_STREAM, SCAN_LOG_STREAM};
pub use matrix::MatrixIo;
pub use page::{Color, KeyAction, Keypage, Modifiers, PageSet};
pub use registry::PageRegistry;
pub use storage::{ConfigSource, MountState, StorageEvents, STORAGE_EVENTS};
