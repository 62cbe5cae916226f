//! RustMacroPad - Main entry point
//!
//! 1. Bring up UART logging, the storage partition and USB (HID + MSC),
//!    then publish the registry holding the built-in page
//! 2. Start the scan task on core 0: receive the registry, then scan,
//!    dispatch and report forever
//! 3. Start the config task on core 1: reload `config.json` on change,
//!    drain logs to UART

#![cfg_attr(target_os = "espidf", no_std)]
#![cfg_attr(target_os = "espidf", no_main)]

#[cfg(target_os = "espidf")]
extern crate alloc;

#[cfg(target_os = "espidf")]
#[no_mangle]
fn main() {
    use rust_macro_pad::hal::time::now_ms;
    use rust_macro_pad::{rt_error, CONFIG_LOG_STREAM};

    // No reset: USB and any task already started keep running. The config
    // task never started, so this is the only producer on the stream.
    if let Err(err) = firmware::run() {
        rt_error!(CONFIG_LOG_STREAM, now_ms(), "startup failed: {}", err);
    }
}

/// The firmware only runs on the device.
#[cfg(not(target_os = "espidf"))]
fn main() {}

#[cfg(target_os = "espidf")]
mod firmware {
    use alloc::boxed::Box;
    use core::ffi::{c_void, CStr};
    use core::ptr;

    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::gpio::{InputPin, OutputPin};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::uart::UartTxDriver;
    use esp_idf_svc::sys::{self, EspError};

    use rust_macro_pad::hal::{fat, time::now_ms, usb};
    use rust_macro_pad::hal::{ActivityLed, BoardIndicators, FatSource, GpioMatrix, UsbKeyboard, Ws2812};
    use rust_macro_pad::uart_logger::{drain_to_uart, init_uart_logger, LogDrain, UartLoggerConfig};
    use rust_macro_pad::{rt_error, rt_info};
    use rust_macro_pad::{
        ConfigLoader, FaultState, Handoff, PageRegistry, ScanEngine, Settings, CONFIG_LOG_STREAM,
        SCAN_LOG_STREAM, STORAGE_EVENTS,
    };

    const SETTINGS: Settings = Settings::DEFAULT;

    const TASK_STACK_SIZE: u32 = 8192;
    const SCAN_CORE: i32 = 0;
    const SCAN_PRIORITY: u32 = 10;
    const CONFIG_CORE: i32 = 1;
    const CONFIG_PRIORITY: u32 = 5;

    // Static allocations. The registry holds the built-in default page
    // until the first config load commits.
    static PAGE_REGISTRY: PageRegistry = PageRegistry::with_default_page();
    static REGISTRY_HANDOFF: Handoff<PageRegistry> = Handoff::new();
    static CONFIG_FAULT: FaultState = FaultState::new();

    /// Peripherals owned by the scan task.
    struct ScanHardware {
        matrix: GpioMatrix<'static>,
        indicators: BoardIndicators<'static>,
        keyboard: UsbKeyboard,
    }

    /// Peripherals owned by the config task.
    struct ConfigHardware {
        uart: UartTxDriver<'static>,
        activity: ActivityLed<'static>,
    }

    pub fn run() -> Result<(), EspError> {
        sys::link_patches();

        let p = Peripherals::take()?;
        let pins = p.pins;

        let uart = init_uart_logger(p.uart1, pins.gpio43, &UartLoggerConfig::default())?;
        rt_info!(CONFIG_LOG_STREAM, now_ms(), "{}", env!("VERSION_STRING"));

        usb::install(fat::BASE_PATH)?;

        let matrix = GpioMatrix::new(
            [pins.gpio7.downgrade_output(), pins.gpio8.downgrade_output(), pins.gpio9.downgrade_output()],
            [pins.gpio2.downgrade_input(), pins.gpio3.downgrade_input(), pins.gpio4.downgrade_input()],
        )?;
        let pixel = Ws2812::new(p.rmt.channel0, pins.gpio48)?;
        let indicators = BoardIndicators::new(
            [pins.gpio1.downgrade_output(), pins.gpio5.downgrade_output(), pins.gpio6.downgrade_output()],
            [pins.gpio10.downgrade_output(), pins.gpio11.downgrade_output(), pins.gpio12.downgrade_output()],
            pixel,
        )?;
        let activity = ActivityLed::new(pins.gpio21.downgrade_output())?;

        if let Err(err) = REGISTRY_HANDOFF.publish(&PAGE_REGISTRY) {
            rt_error!(CONFIG_LOG_STREAM, now_ms(), "registry handoff: {}", err);
        }

        // The config task goes last: until it runs, this task is the only
        // producer on CONFIG_LOG_STREAM.
        spawn(
            c"scan",
            SCAN_CORE,
            SCAN_PRIORITY,
            scan_task,
            ScanHardware { matrix, indicators, keyboard: UsbKeyboard::new() },
        )?;
        spawn(
            c"config",
            CONFIG_CORE,
            CONFIG_PRIORITY,
            config_task,
            ConfigHardware { uart, activity },
        )?;

        Ok(())
    }

    /// Start a FreeRTOS task pinned to `core` that takes ownership of `hw`.
    fn spawn<T>(
        name: &CStr,
        core: i32,
        priority: u32,
        entry: unsafe extern "C" fn(*mut c_void),
        hw: T,
    ) -> Result<(), EspError> {
        let arg = Box::into_raw(Box::new(hw)) as *mut c_void;

        // SAFETY: `entry` reclaims `arg` as a Box<T>
        let created = unsafe {
            sys::xTaskCreatePinnedToCore(
                Some(entry),
                name.as_ptr(),
                TASK_STACK_SIZE,
                arg,
                priority,
                ptr::null_mut(),
                core,
            )
        };
        if created != 1 {
            // SAFETY: the task was not created, nobody else owns `arg`
            drop(unsafe { Box::from_raw(arg as *mut T) });
            return Err(EspError::from_infallible::<{ sys::ESP_ERR_NO_MEM }>());
        }
        Ok(())
    }

    unsafe extern "C" fn config_task(arg: *mut c_void) {
        let hw = Box::from_raw(arg as *mut ConfigHardware);
        config_loop(*hw)
    }

    unsafe extern "C" fn scan_task(arg: *mut c_void) {
        let hw = Box::from_raw(arg as *mut ScanHardware);
        scan_loop(*hw)
    }

    /// Core 1: config reload, storage activity LED, log drain.
    fn config_loop(mut hw: ConfigHardware) -> ! {
        let mut loader = ConfigLoader::new(
            FatSource::new(),
            &PAGE_REGISTRY,
            &CONFIG_FAULT,
            &CONFIG_LOG_STREAM,
            SETTINGS,
        );
        let mut drain = LogDrain::new(&SCAN_LOG_STREAM, &CONFIG_LOG_STREAM);

        loop {
            let now = now_ms();
            loader.poll(&STORAGE_EVENTS, now);
            hw.activity.set(STORAGE_EVENTS.is_writing());
            drain_to_uart(&mut drain, &mut hw.uart, now);
            FreeRtos::delay_ms(SETTINGS.config_poll_ms);
        }
    }

    /// Core 0: scan, dispatch, report.
    fn scan_loop(mut hw: ScanHardware) -> ! {
        let registry = REGISTRY_HANDOFF.receive_blocking(|| FreeRtos::delay_ms(SETTINGS.handoff_poll_ms));
        rt_info!(SCAN_LOG_STREAM, now_ms(), "registry received at {:#x}", registry.storage_addr());

        let mut engine = ScanEngine::new(registry, &CONFIG_FAULT, &SCAN_LOG_STREAM, &SETTINGS);
        loop {
            engine.tick(now_ms(), &mut hw.matrix, &mut hw.keyboard, &mut hw.indicators);
            FreeRtos::delay_ms(SETTINGS.scan_period_ms);
        }
    }
}
