//! Key scan and dispatch engine.
//!
//! Runs on the scan core. Each [`ScanEngine::tick`] is one scan cycle:
//!
//! ```text
//! registry generation changed? ──▶ cursor = page 0, dirty
//! scan matrix (≤ 6 keys)
//! dispatch each key on the active page:
//!   Output  → OR modifiers, append keycode
//!   Page(p) → on press edge, switch to p (dirty if changed)
//! dirty? ──▶ re-apply page LEDs
//! emit: keys → report | first idle cycle → release | else nothing
//! ```
//!
//! Pure logic. Hardware is reached through [`MatrixIo`], [`HidOutput`] and
//! [`Indicators`], so the whole cycle runs on the host in tests.

use crate::config::Settings;
use crate::fault::FaultState;
use crate::hid::{HidOutput, KeyboardReport};
use crate::indicator::{show_page, FaultBlinker, Indicators};
use crate::keycodes::KEY_NONE;
use crate::logging::LogStream;
use crate::matrix::{MatrixIo, MatrixScanner, PressedKeys};
use crate::page::{KeyAction, Keypage};
use crate::registry::PageRegistry;
use crate::{rt_debug, rt_info, rt_trace};

/// What a cycle sent to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing to send.
    Idle,
    /// Report with at least one output key.
    Sent(KeyboardReport),
    /// The single all-zero report after the last key was released.
    Released,
    /// A report was due but the endpoint was not ready.
    Skipped,
}

/// Scan-core state. Owns the runtime cursor and report state exclusively.
pub struct ScanEngine<'r> {
    registry: &'r PageRegistry,
    fault: &'r FaultState,
    log: &'r LogStream,
    scanner: MatrixScanner,
    blinker: FaultBlinker,
    brightness: u8,

    active_page: u8,
    page_dirty: bool,
    generation: u32,
    /// Positions captured last cycle, for transition edge detection.
    held_last_cycle: u16,
    /// Last report sent carried keys; a release is owed.
    reported_last_cycle: bool,
}

impl<'r> ScanEngine<'r> {
    pub fn new(
        registry: &'r PageRegistry,
        fault: &'r FaultState,
        log: &'r LogStream,
        settings: &Settings,
    ) -> Self {
        Self {
            registry,
            fault,
            log,
            scanner: MatrixScanner::new(settings.settle_delay_ms),
            blinker: FaultBlinker::new(settings.fault_blink_cycles),
            brightness: settings.neopixel_brightness,
            active_page: 0,
            page_dirty: true,
            generation: registry.generation(),
            held_last_cycle: 0,
            reported_last_cycle: false,
        }
    }

    #[inline]
    pub fn active_page(&self) -> u8 {
        self.active_page
    }

    /// Registry generation the cursor belongs to.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Run one scan cycle.
    pub fn tick<M, H, I>(&mut self, now_ms: u32, matrix: &mut M, hid: &mut H, ind: &mut I) -> CycleOutcome
    where
        M: MatrixIo + ?Sized,
        H: HidOutput + ?Sized,
        I: Indicators + ?Sized,
    {
        let generation = self.registry.generation();
        if generation != self.generation {
            rt_info!(self.log, now_ms, "config generation {} -> {}, page 0", self.generation, generation);
            self.generation = generation;
            self.active_page = 0;
            self.page_dirty = true;
        }
        self.refresh_indicators(ind);

        let keys = self.scanner.scan(matrix);
        let report = self.dispatch(now_ms, &keys);
        self.held_last_cycle = keys.mask();

        self.refresh_indicators(ind);
        if self.blinker.update(self.fault, ind, self.brightness) {
            self.show_active_page(ind);
        }

        self.emit(now_ms, report, hid)
    }

    /// Resolve captured keys against the active page.
    ///
    /// Returns the report to send, `None` if no output key was captured.
    fn dispatch(&mut self, now_ms: u32, keys: &PressedKeys) -> Option<KeyboardReport> {
        let mut page = self.registry.get(self.active_page);
        let mut report = KeyboardReport::RELEASE;
        let mut outputs = 0;

        for position in keys.iter() {
            let Some(action) = page.as_ref().and_then(|p| p.action(position)) else {
                continue;
            };

            match action {
                KeyAction::Output { keycode, modifiers } => {
                    report.modifier.insert(modifiers);
                    if keycode != KEY_NONE {
                        report.push(keycode);
                    }
                    outputs += 1;
                }
                KeyAction::Page(target) => {
                    if self.held_last_cycle & (1 << position) != 0 {
                        continue;
                    }
                    let Some(next) = self.registry.get(target) else {
                        rt_debug!(self.log, now_ms, "key {}: page {} not loaded", position + 1, target);
                        continue;
                    };
                    if target != self.active_page {
                        rt_debug!(self.log, now_ms, "page {} -> {}", self.active_page, target);
                        self.active_page = target;
                        self.page_dirty = true;
                    }
                    page = Some(next);
                }
            }
        }

        (outputs > 0).then_some(report)
    }

    fn emit<H: HidOutput + ?Sized>(
        &mut self,
        now_ms: u32,
        report: Option<KeyboardReport>,
        hid: &mut H,
    ) -> CycleOutcome {
        match report {
            Some(report) => {
                if hid.suspended() {
                    hid.remote_wakeup();
                }
                if !hid.ready() {
                    rt_trace!(self.log, now_ms, "hid not ready, report skipped");
                    return CycleOutcome::Skipped;
                }
                hid.send(&report);
                self.reported_last_cycle = true;
                CycleOutcome::Sent(report)
            }
            None if self.reported_last_cycle => {
                if !hid.ready() {
                    rt_trace!(self.log, now_ms, "hid not ready, release deferred");
                    return CycleOutcome::Skipped;
                }
                hid.send(&KeyboardReport::RELEASE);
                self.reported_last_cycle = false;
                CycleOutcome::Released
            }
            None => CycleOutcome::Idle,
        }
    }

    fn refresh_indicators<I: Indicators + ?Sized>(&mut self, ind: &mut I) {
        if self.page_dirty {
            self.show_active_page(ind);
            self.page_dirty = false;
            self.blinker.restart();
        }
    }

    fn show_active_page<I: Indicators + ?Sized>(&self, ind: &mut I) {
        let page: Option<Keypage> = self.registry.get(self.active_page);
        show_page(ind, page.as_ref(), self.brightness);
    }
}
