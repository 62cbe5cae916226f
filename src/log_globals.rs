//! Global log stream instances.
//!
//! One stream per core so each ring keeps a single producer.

use crate::logging::LogStream;

/// Scan core (core 0) log stream.
///
/// Single producer (scan task), single consumer (UART drain).
pub static SCAN_LOG_STREAM: LogStream = LogStream::new();

/// Config core (core 1) log stream.
///
/// Single producer (config task), single consumer (UART drain).
pub static CONFIG_LOG_STREAM: LogStream = LogStream::new();
