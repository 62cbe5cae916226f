//! Config loader tests: change-driven reload, read errors, fault signalling

use rust_macro_pad::config::{ConfigLoader, LoadError, ReadError, Settings, ValidationError};
use rust_macro_pad::fault::{FaultCode, FaultState};
use rust_macro_pad::logging::{LogLevel, LogStream};
use rust_macro_pad::page::Keypage;
use rust_macro_pad::storage::{ConfigSource, MountState, StorageEvents};
use rust_macro_pad::PageRegistry;

const GOOD: &str = r##"{"pages": [
  {"page": 0,
   "keys": {"1": "a", "2": "b", "3": "c", "4": "d", "5": "page 1",
            "6": "f", "7": "g", "8": "h", "9": "i"},
   "leds": {"led1": true, "led2": false, "led3": false,
            "ledR": false, "ledG": false, "ledB": true, "neopixel": "#FF8000"}},
  {"page": 1,
   "keys": {"1": "ctl+c", "2": "ctl+v", "3": "ctl+x", "4": "ctl+z", "5": "page 0",
            "6": "F13", "7": "mute", "8": "vol_up", "9": "vol_down"},
   "leds": {"led1": false, "led2": true, "led3": false,
            "ledR": false, "ledG": true, "ledB": false, "neopixel": "00FF00"}}
]}"##;

/// In-memory volume.
struct MemVolume {
    formatted: bool,
    /// The host holds the volume.
    host_busy: bool,
    file: Option<Vec<u8>>,
    /// Bytes `read` delivers, if fewer than the file size.
    truncate_to: Option<usize>,
    mounts: u32,
    invalidations: u32,
}

impl MemVolume {
    fn with(text: &str) -> Self {
        Self {
            formatted: true,
            host_busy: false,
            file: Some(text.as_bytes().to_vec()),
            truncate_to: None,
            mounts: 0,
            invalidations: 0,
        }
    }
}

impl ConfigSource for MemVolume {
    fn mount(&mut self) -> MountState {
        self.mounts += 1;
        if self.host_busy {
            MountState::HostBusy
        } else if self.formatted {
            MountState::Mounted
        } else {
            MountState::Unformatted
        }
    }

    fn invalidate(&mut self) {
        self.invalidations += 1;
    }

    fn file_size(&mut self, _path: &str) -> Result<usize, ReadError> {
        self.file.as_ref().map(Vec::len).ok_or(ReadError::NotFound)
    }

    fn read(&mut self, _path: &str, buf: &mut [u8]) -> Result<usize, ReadError> {
        let file = self.file.as_ref().ok_or(ReadError::NotFound)?;
        let n = self.truncate_to.unwrap_or(file.len()).min(buf.len());
        buf[..n].copy_from_slice(&file[..n]);
        Ok(n)
    }
}

fn settings() -> Settings {
    Settings { fs_retry_ms: 100, ..Settings::DEFAULT }
}

#[test]
fn test_first_poll_loads_document() {
    let registry = PageRegistry::with_default_page();
    let (fault, log, events) = (FaultState::new(), LogStream::new(), StorageEvents::new());
    let mut loader = ConfigLoader::new(MemVolume::with(GOOD), &registry, &fault, &log, settings());

    assert_eq!(loader.poll(&events, 0), Some(Ok(2)));
    assert!(registry.is_initialized());
    assert!(registry.get(1).is_some());
    assert_ne!(registry.get(0), Some(Keypage::DEFAULT));
    assert!(!fault.is_active());

    // Nothing changed since
    assert_eq!(loader.poll(&events, 10), None);
    assert_eq!(loader.source_mut().invalidations, 1);
}

#[test]
fn test_flush_triggers_reload() {
    let registry = PageRegistry::new();
    let (fault, log, events) = (FaultState::new(), LogStream::new(), StorageEvents::new());
    let mut loader = ConfigLoader::new(MemVolume::with(GOOD), &registry, &fault, &log, settings());
    loader.poll(&events, 0);

    events.write_started();
    assert_eq!(loader.poll(&events, 10), None);
    events.flushed();
    assert_eq!(loader.poll(&events, 20), Some(Ok(2)));
    assert_eq!(registry.generation(), 2);
    assert_eq!(loader.source_mut().mounts, 2);
}

#[test]
fn test_invalid_document_sets_fault_and_keeps_pages() {
    let registry = PageRegistry::with_default_page();
    let (fault, log, events) = (FaultState::new(), LogStream::new(), StorageEvents::new());
    let mut loader = ConfigLoader::new(MemVolume::with("{\"pages\": []}"), &registry, &fault, &log, settings());

    assert_eq!(
        loader.poll(&events, 0),
        Some(Err(LoadError::Invalid(ValidationError::EmptyPages)))
    );
    assert!(fault.is_active());
    assert_eq!(fault.code(), FaultCode::ConfigInvalid);
    assert_eq!(registry.get(0), Some(Keypage::DEFAULT));

    // Validation errors wait for the next host write
    assert_eq!(loader.poll(&events, 5_000), None);

    let entries: Vec<_> = std::iter::from_fn(|| log.drain()).collect();
    let last = entries.last().unwrap();
    assert_eq!(last.level, LogLevel::Error);
    assert_eq!(last.text(), "invalid config: \"pages\" must have at least one element");
    assert!(entries[..entries.len() - 1].iter().all(|e| e.level == LogLevel::Info));
}

#[test]
fn test_fault_clears_after_fix() {
    let registry = PageRegistry::new();
    let (fault, log, events) = (FaultState::new(), LogStream::new(), StorageEvents::new());
    let mut loader = ConfigLoader::new(MemVolume::with("not json"), &registry, &fault, &log, settings());

    assert!(matches!(
        loader.poll(&events, 0),
        Some(Err(LoadError::Invalid(ValidationError::Syntax { .. })))
    ));
    assert!(fault.is_active());
    assert_eq!(loader.failures(), 1);

    loader.source_mut().file = Some(GOOD.as_bytes().to_vec());
    events.flushed();
    assert_eq!(loader.poll(&events, 10), Some(Ok(2)));
    assert!(!fault.is_active());
    assert_eq!(loader.failures(), 0);
    assert_eq!(fault.count(), 1);
}

#[test]
fn test_short_read_is_retried() {
    let registry = PageRegistry::new();
    let (fault, log, events) = (FaultState::new(), LogStream::new(), StorageEvents::new());
    let mut volume = MemVolume::with(GOOD);
    volume.truncate_to = Some(10);
    let mut loader = ConfigLoader::new(volume, &registry, &fault, &log, settings());

    let expected = ReadError::ShortRead { expected: GOOD.len(), actual: 10 };
    assert_eq!(loader.poll(&events, 0), Some(Err(LoadError::Read(expected))));
    assert_eq!(fault.code(), FaultCode::ConfigUnreadable);
    assert!(!registry.is_initialized());
    assert!(loader.retry_pending());

    // Not yet due
    assert_eq!(loader.poll(&events, 50), None);

    loader.source_mut().truncate_to = None;
    assert_eq!(loader.poll(&events, 100), Some(Ok(2)));
    assert!(!loader.retry_pending());
    assert!(!fault.is_active());
}

#[test]
fn test_unformatted_volume_remounts() {
    let registry = PageRegistry::with_default_page();
    let (fault, log, events) = (FaultState::new(), LogStream::new(), StorageEvents::new());
    let mut volume = MemVolume::with(GOOD);
    volume.formatted = false;
    let mut loader = ConfigLoader::new(volume, &registry, &fault, &log, settings());

    assert_eq!(
        loader.poll(&events, 0),
        Some(Err(LoadError::Read(ReadError::NotFormatted)))
    );
    assert!(!loader.is_mounted());
    assert_eq!(fault.data(), 1);

    assert!(matches!(loader.poll(&events, 100), Some(Err(_))));
    assert_eq!(fault.data(), 2);

    loader.source_mut().formatted = true;
    assert_eq!(loader.poll(&events, 200), Some(Ok(2)));
    assert!(loader.is_mounted());
    assert_eq!(loader.source_mut().mounts, 3);
}

#[test]
fn test_host_owned_volume_waits_for_eject() {
    let registry = PageRegistry::with_default_page();
    let (fault, log, events) = (FaultState::new(), LogStream::new(), StorageEvents::new());
    let mut volume = MemVolume::with(GOOD);
    volume.host_busy = true;
    let mut loader = ConfigLoader::new(volume, &registry, &fault, &log, settings());

    assert_eq!(loader.poll(&events, 0), Some(Err(LoadError::HostBusy)));
    assert!(!fault.is_active());
    assert_eq!(fault.count(), 0);
    assert_eq!(loader.failures(), 0);
    assert!(!loader.retry_pending());
    assert!(!loader.is_mounted());
    assert_eq!(registry.get(0), Some(Keypage::DEFAULT));

    // No retry while the host holds the volume
    assert_eq!(loader.poll(&events, 5_000), None);

    let entries: Vec<_> = std::iter::from_fn(|| log.drain()).collect();
    assert!(entries.iter().all(|e| e.level == LogLevel::Info));
    assert_eq!(
        entries.last().map(|e| e.text()),
        Some("volume in use by host, waiting for eject")
    );

    // Host ejects: the volume comes back and the change signal fires
    events.write_started();
    loader.source_mut().host_busy = false;
    events.flushed();
    assert_eq!(loader.poll(&events, 5_010), Some(Ok(2)));
    assert!(loader.is_mounted());
    assert!(!fault.is_active());
}

#[test]
fn test_host_claim_after_load_keeps_pages() {
    let registry = PageRegistry::new();
    let (fault, log, events) = (FaultState::new(), LogStream::new(), StorageEvents::new());
    let mut loader = ConfigLoader::new(MemVolume::with(GOOD), &registry, &fault, &log, settings());
    assert_eq!(loader.poll(&events, 0), Some(Ok(2)));

    loader.source_mut().host_busy = true;
    events.mark_changed();
    assert_eq!(loader.poll(&events, 10), Some(Err(LoadError::HostBusy)));
    assert_eq!(registry.generation(), 1);
    assert!(registry.get(1).is_some());
    assert!(!fault.is_active());
}

#[test]
fn test_missing_file() {
    let registry = PageRegistry::new();
    let (fault, log, events) = (FaultState::new(), LogStream::new(), StorageEvents::new());
    let mut volume = MemVolume::with("");
    volume.file = None;
    let mut loader = ConfigLoader::new(volume, &registry, &fault, &log, settings());

    assert_eq!(loader.poll(&events, 0), Some(Err(LoadError::Read(ReadError::NotFound))));
    assert_eq!(fault.code(), FaultCode::ConfigUnreadable);
}

#[test]
fn test_oversized_file_rejected_unread() {
    let registry = PageRegistry::new();
    let (fault, log, events) = (FaultState::new(), LogStream::new(), StorageEvents::new());
    let big = " ".repeat(64);
    let settings = Settings { max_config_bytes: 32, ..settings() };
    let mut loader = ConfigLoader::new(MemVolume::with(&big), &registry, &fault, &log, settings);

    assert_eq!(
        loader.poll(&events, 0),
        Some(Err(LoadError::Read(ReadError::TooLarge { size: 64, limit: 32 })))
    );
}
