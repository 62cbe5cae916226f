//! TinyUSB composite device: boot keyboard (HID) plus the storage
//! partition as a mass-storage drive (MSC).
//!
//! ```text
//! Host ──HID IN──▶ keystrokes
//! Host ◀─MSC────▶ "storage" partition (FAT, wear-levelled)
//!                   │ host ejects / USB unmount
//!                   ▼
//!            STORAGE_EVENTS.flushed() ─▶ config reload
//! ```
//!
//! esp_tinyusb only hands the volume back to the app on eject or unmount,
//! so edits apply when the host ejects the drive, not on each write.

use core::ffi::CStr;

use esp_idf_svc::sys::tinyusb as tusb;
use esp_idf_svc::sys::{self, esp, EspError};

use crate::hid::{HidOutput, KeyboardReport};
use crate::storage::STORAGE_EVENTS;

const HID_INSTANCE: u8 = 0;

/// Boot keyboard report: modifier byte, reserved byte, 6 keycodes, plus
/// the 5 LED output bits. Keycodes range over the full usage page.
static HID_REPORT_DESCRIPTOR: [u8; 65] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0xE0, //   Usage Minimum (224)
    0x29, 0xE7, //   Usage Maximum (231)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (1)
    0x29, 0x05, //   Usage Maximum (5)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0x00, //   Usage Minimum (0)
    0x2A, 0xFF, 0x00, // Usage Maximum (255)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
];

const CONFIG_TOTAL_LEN: u8 = 9 + (9 + 9 + 7) + (9 + 7 + 7);

/// Configuration descriptor: interface 0 HID keyboard, interface 1 MSC.
static CONFIGURATION_DESCRIPTOR: [u8; CONFIG_TOTAL_LEN as usize] = [
    // Configuration: 2 interfaces, bus powered, remote wakeup, 100 mA
    0x09, 0x02, CONFIG_TOTAL_LEN, 0x00, 0x02, 0x01, 0x00, 0xA0, 0x32,
    // Interface 0: HID, boot subclass, keyboard protocol
    0x09, 0x04, 0x00, 0x00, 0x01, 0x03, 0x01, 0x01, 0x00,
    // HID 1.11, one report descriptor
    0x09, 0x21, 0x11, 0x01, 0x00, 0x01, 0x22, HID_REPORT_DESCRIPTOR.len() as u8, 0x00,
    // EP1 IN, interrupt, 8 bytes, 10 ms
    0x07, 0x05, 0x81, 0x03, 0x08, 0x00, 0x0A,
    // Interface 1: MSC, SCSI transparent, bulk-only
    0x09, 0x04, 0x01, 0x00, 0x02, 0x08, 0x06, 0x50, 0x00,
    // EP2 OUT, bulk, 64 bytes
    0x07, 0x05, 0x02, 0x02, 0x40, 0x00, 0x00,
    // EP2 IN, bulk, 64 bytes
    0x07, 0x05, 0x82, 0x02, 0x40, 0x00, 0x00,
];

/// Bring up the storage partition and the USB device.
///
/// The FAT volume starts mounted on the app side so the first config load
/// can run before the host claims it.
pub fn install(base_path: &CStr) -> Result<(), EspError> {
    // SAFETY: one-time init from the main task; all pointers outlive the calls
    unsafe {
        let partition = sys::esp_partition_find_first(
            sys::esp_partition_type_t_ESP_PARTITION_TYPE_DATA,
            sys::esp_partition_subtype_t_ESP_PARTITION_SUBTYPE_DATA_FAT,
            c"storage".as_ptr(),
        );
        if partition.is_null() {
            return Err(EspError::from_infallible::<{ sys::ESP_ERR_NOT_FOUND }>());
        }

        let mut wl_handle = sys::WL_INVALID_HANDLE as sys::wl_handle_t;
        esp!(sys::wl_mount(partition, &mut wl_handle))?;

        let mut msc: tusb::tinyusb_msc_spiflash_config_t = core::mem::zeroed();
        msc.wl_handle = wl_handle as _;
        msc.callback_mount_changed = Some(on_mount_changed);
        esp!(tusb::tinyusb_msc_storage_init_spiflash(&msc))?;
        esp!(tusb::tinyusb_msc_storage_mount(base_path.as_ptr()))?;

        let mut config: tusb::tinyusb_config_t = core::mem::zeroed();
        config.__bindgen_anon_2.configuration_descriptor = CONFIGURATION_DESCRIPTOR.as_ptr();
        config.external_phy = false;
        esp!(tusb::tinyusb_driver_install(&config))?;
    }
    Ok(())
}

/// The volume moved between host and app.
///
/// Unmounted from the app: the host owns it and may be writing.
/// Mounted back: the host is done, so the document may have changed.
unsafe extern "C" fn on_mount_changed(event: *mut tusb::tinyusb_msc_event_t) {
    let Some(event) = event.as_ref() else {
        return;
    };
    if event.__bindgen_anon_1.mount_changed_data.is_mounted {
        STORAGE_EVENTS.flushed();
    } else {
        STORAGE_EVENTS.write_started();
    }
}

#[no_mangle]
extern "C" fn tud_hid_descriptor_report_cb(_instance: u8) -> *const u8 {
    HID_REPORT_DESCRIPTOR.as_ptr()
}

#[no_mangle]
extern "C" fn tud_hid_get_report_cb(
    _instance: u8,
    _report_id: u8,
    _report_type: tusb::hid_report_type_t,
    _buffer: *mut u8,
    _reqlen: u16,
) -> u16 {
    0
}

#[no_mangle]
extern "C" fn tud_hid_set_report_cb(
    _instance: u8,
    _report_id: u8,
    _report_type: tusb::hid_report_type_t,
    _buffer: *const u8,
    _bufsize: u16,
) {
}

/// HID keyboard endpoint.
pub struct UsbKeyboard {
    _private: (),
}

impl UsbKeyboard {
    /// Requires [`install`] to have succeeded.
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for UsbKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl HidOutput for UsbKeyboard {
    fn ready(&mut self) -> bool {
        // SAFETY: TinyUSB device stack is running
        unsafe { tusb::tud_mounted() && tusb::tud_hid_n_ready(HID_INSTANCE) }
    }

    fn suspended(&mut self) -> bool {
        unsafe { tusb::tud_suspended() }
    }

    fn remote_wakeup(&mut self) {
        unsafe {
            tusb::tud_remote_wakeup();
        }
    }

    fn send(&mut self, report: &KeyboardReport) {
        let keycodes = report.keycodes;
        // SAFETY: TinyUSB copies the 6 keycodes before returning
        unsafe {
            tusb::tud_hid_n_keyboard_report(HID_INSTANCE, 0, report.modifier.bits(), keycodes.as_ptr());
        }
    }
}
