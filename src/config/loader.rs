//! Config reload cycle, run on the config core.
//!
//! ```text
//! StorageEvents.changed ──▶ mount? ──▶ invalidate cache ──▶ read whole file
//!                                                          │
//!                     FaultState ◀── error ── parse ◀──────┘
//!                                               │ ok
//!                                               ▼
//!                                        registry.commit()
//! ```
//!
//! A failed load leaves the registry at its last good contents. Read errors
//! schedule a retry `fs_retry_ms` later; validation errors wait for the host
//! to write the file again. A volume held by the host is not a failure: the
//! loader raises no fault and waits for the eject to signal a change.

use super::error::{LoadError, ReadError};
use super::parser::parse;
use super::settings::Settings;
use crate::fault::{FaultCode, FaultState};
use crate::logging::LogStream;
use crate::registry::PageRegistry;
use crate::storage::{read_document, ConfigSource, MountState, StorageEvents};
use crate::{rt_error, rt_info, rt_warn};

pub struct ConfigLoader<'a, S: ConfigSource> {
    source: S,
    registry: &'a PageRegistry,
    fault: &'a FaultState,
    log: &'a LogStream,
    settings: Settings,
    mounted: bool,
    /// Consecutive failed loads.
    failures: u32,
    /// Time of the next retry after a read error.
    retry_at_ms: Option<u32>,
}

impl<'a, S: ConfigSource> ConfigLoader<'a, S> {
    pub fn new(
        source: S,
        registry: &'a PageRegistry,
        fault: &'a FaultState,
        log: &'a LogStream,
        settings: Settings,
    ) -> Self {
        Self {
            source,
            registry,
            fault,
            log,
            settings,
            mounted: false,
            failures: 0,
            retry_at_ms: None,
        }
    }

    #[inline]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Read and parse the document once. Returns the number of pages loaded.
    pub fn reload(&mut self, now_ms: u32) -> Result<usize, LoadError> {
        match self.source.mount() {
            MountState::Mounted => {
                if !self.mounted {
                    self.mounted = true;
                    rt_info!(self.log, now_ms, "volume mounted");
                }
            }
            MountState::HostBusy => {
                self.mounted = false;
                return Err(LoadError::HostBusy);
            }
            MountState::Unformatted => {
                self.mounted = false;
                return Err(ReadError::NotFormatted.into());
            }
        }

        self.source.invalidate();
        let document = read_document(
            &mut self.source,
            self.settings.config_path,
            self.settings.max_config_bytes,
        )?;
        rt_info!(self.log, now_ms, "{}: {} bytes", self.settings.config_path, document.len());

        Ok(parse(&document, self.registry)?)
    }

    /// True while a read retry is scheduled.
    #[inline]
    pub fn retry_pending(&self) -> bool {
        self.retry_at_ms.is_some()
    }

    /// Reload if the storage reported a change or a read retry is due.
    ///
    /// Returns `None` when there was nothing to do.
    pub fn poll(&mut self, events: &StorageEvents, now_ms: u32) -> Option<Result<usize, LoadError>> {
        let changed = events.take_changed();
        let retry_due = self
            .retry_at_ms
            .is_some_and(|at| now_ms.wrapping_sub(at) as i32 >= 0);
        if !changed && !retry_due {
            return None;
        }
        self.retry_at_ms = None;

        let result = self.reload(now_ms);
        match &result {
            Ok(pages) => {
                rt_info!(self.log, now_ms, "config loaded: {} pages", pages);
                self.failures = 0;
                self.fault.clear();
            }
            Err(LoadError::HostBusy) => {
                rt_info!(self.log, now_ms, "volume in use by host, waiting for eject");
            }
            Err(err) => {
                self.failures = self.failures.saturating_add(1);
                let code = match err {
                    LoadError::Invalid(_) => FaultCode::ConfigInvalid,
                    _ => FaultCode::ConfigUnreadable,
                };
                self.fault.set(code, self.failures);

                if let LoadError::Read(_) = err {
                    rt_warn!(self.log, now_ms, "{} (retry {})", err, self.failures);
                    self.retry_at_ms = Some(now_ms.wrapping_add(self.settings.fs_retry_ms));
                } else {
                    rt_error!(self.log, now_ms, "{}", err);
                }
            }
        }
        Some(result)
    }
}
