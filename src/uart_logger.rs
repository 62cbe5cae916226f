//! UART log output.
//!
//! Drains both log streams on the config core and writes them to UART1 TX.
//! Requires an external USB-UART adapter; the native USB port is busy with
//! HID and mass storage.
//!
//! ```text
//! ESP32-S3 GPIO43 (TX) ──────▶ USB-UART RX
//! ```

use core::fmt::Write;

use crate::logging::{BufWriter, LogEntry, LogStream};

#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::gpio;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::peripheral::Peripheral;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::uart::{self, UartTxDriver};

/// Interval between dropped-message reports.
pub const DROPPED_REPORT_INTERVAL_MS: u32 = 10_000;

/// UART configuration for logging.
pub struct UartLoggerConfig {
    pub baud_rate: u32,
    pub tx_pin: u8,
}

impl Default for UartLoggerConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            tx_pin: 43,
        }
    }
}

/// Format: `[timestamp_ms] LEVEL: message\n`
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter::new(buf);
    let _ = write!(
        writer,
        "[{:10}] {}: {}\n",
        entry.timestamp_ms,
        entry.level.as_str(),
        entry.text()
    );
    writer.len()
}

/// Drains log streams into any byte sink, in priority order.
pub struct LogDrain<'a> {
    streams: [&'a LogStream; 2],
    last_dropped_report_ms: u32,
}

impl<'a> LogDrain<'a> {
    /// `scan` is drained before `config` on every pass.
    pub fn new(scan: &'a LogStream, config: &'a LogStream) -> Self {
        Self {
            streams: [scan, config],
            last_dropped_report_ms: 0,
        }
    }

    /// Write every pending entry to `sink`. Returns true if anything was written.
    pub fn pass(&mut self, now_ms: u32, mut sink: impl FnMut(&[u8])) -> bool {
        let mut format_buf = [0u8; 256];
        let mut work_done = false;

        for stream in self.streams {
            while let Some(entry) = stream.drain() {
                let len = format_log_entry(&entry, &mut format_buf);
                sink(&format_buf[..len]);
                work_done = true;
            }
        }

        if now_ms.wrapping_sub(self.last_dropped_report_ms) >= DROPPED_REPORT_INTERVAL_MS {
            let [scan, config] = self.streams;
            let (scan_dropped, config_dropped) = (scan.dropped(), config.dropped());
            if scan_dropped > 0 || config_dropped > 0 {
                let mut writer = BufWriter::new(&mut format_buf);
                let _ = write!(writer, "[WARN] Dropped: SCAN={}, CONFIG={}\n", scan_dropped, config_dropped);
                let len = writer.len();
                sink(&format_buf[..len]);
                scan.reset_dropped();
                config.reset_dropped();
                work_done = true;
            }
            self.last_dropped_report_ms = now_ms;
        }

        work_done
    }
}

/// Initialize UART1 TX-only for logging output.
#[cfg(target_os = "espidf")]
pub fn init_uart_logger<'d>(
    uart: impl Peripheral<P = esp_idf_svc::hal::uart::UART1> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    config: &UartLoggerConfig,
) -> Result<UartTxDriver<'d>, esp_idf_svc::sys::EspError> {
    let uart_config = uart::config::Config::default()
        .baudrate(esp_idf_svc::hal::units::Hertz(config.baud_rate));

    UartTxDriver::new(
        uart,
        tx_pin,
        Option::<gpio::AnyIOPin>::None, // CTS
        Option::<gpio::AnyIOPin>::None, // RTS
        &uart_config,
    )
}

/// Write everything pending to UART. Called from the config loop.
#[cfg(target_os = "espidf")]
pub fn drain_to_uart(drain: &mut LogDrain<'_>, uart: &mut UartTxDriver<'_>, now_ms: u32) -> bool {
    drain.pass(now_ms, |bytes| {
        let _ = uart.write(bytes);
    })
}
