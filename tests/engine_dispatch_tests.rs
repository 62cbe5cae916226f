//! Scan engine tests: dispatch, page transitions and report emission

use rust_macro_pad::engine::{CycleOutcome, ScanEngine};
use rust_macro_pad::fault::{FaultCode, FaultState};
use rust_macro_pad::hid::{HidOutput, KeyboardReport};
use rust_macro_pad::indicator::Indicators;
use rust_macro_pad::logging::{LogLevel, LogStream};
use rust_macro_pad::matrix::{MatrixIo, COLS};
use rust_macro_pad::page::{Color, KeyAction, Keypage, Modifiers, PageSet};
use rust_macro_pad::{PageRegistry, Settings};

/// Matrix whose held keys are set per cycle.
#[derive(Default)]
struct FakeMatrix {
    held: [bool; 9],
    driven: Option<usize>,
}

impl FakeMatrix {
    fn hold(&mut self, positions: &[usize]) {
        self.held = [false; 9];
        for &p in positions {
            self.held[p] = true;
        }
    }
}

impl MatrixIo for FakeMatrix {
    fn drive_column(&mut self, col: usize, active: bool) {
        if active {
            self.driven = Some(col);
        } else if self.driven == Some(col) {
            self.driven = None;
        }
    }

    fn read_row(&mut self, row: usize) -> bool {
        self.driven.is_some_and(|col| self.held[row * COLS + col])
    }

    fn settle(&mut self, _ms: u32) {}
}

struct FakeHid {
    ready: bool,
    suspended: bool,
    wakeups: u32,
    sent: Vec<KeyboardReport>,
}

impl Default for FakeHid {
    fn default() -> Self {
        Self { ready: true, suspended: false, wakeups: 0, sent: Vec::new() }
    }
}

impl HidOutput for FakeHid {
    fn ready(&mut self) -> bool {
        self.ready
    }

    fn suspended(&mut self) -> bool {
        self.suspended
    }

    fn remote_wakeup(&mut self) {
        self.wakeups += 1;
        self.suspended = false;
    }

    fn send(&mut self, report: &KeyboardReport) {
        self.sent.push(*report);
    }
}

#[derive(Default)]
struct FakeLeds {
    status: [bool; 3],
    indicator: [bool; 3],
    accent: Vec<Color>,
}

impl Indicators for FakeLeds {
    fn set_status_led(&mut self, index: usize, on: bool) {
        self.status[index] = on;
    }

    fn set_indicator_led(&mut self, index: usize, on: bool) {
        self.indicator[index] = on;
    }

    fn set_accent(&mut self, color: Color, _brightness: u8) {
        self.accent.push(color);
    }
}

struct Rig {
    matrix: FakeMatrix,
    hid: FakeHid,
    leds: FakeLeds,
    now: u32,
}

impl Rig {
    fn new() -> Self {
        Self { matrix: FakeMatrix::default(), hid: FakeHid::default(), leds: FakeLeds::default(), now: 0 }
    }

    fn cycle(&mut self, engine: &mut ScanEngine<'_>, held: &[usize]) -> CycleOutcome {
        self.matrix.hold(held);
        self.now += 2;
        engine.tick(self.now, &mut self.matrix, &mut self.hid, &mut self.leds)
    }
}

const K0: u8 = 0x04; // a
const K1: u8 = 0x05; // b

/// Page 0: slot 0 sends K0, slot 4 goes to page 1.
/// Page 1: slot 0 sends K1 with shift, slot 4 goes back to page 0.
fn two_pages() -> PageSet {
    let mut p0 = Keypage::blank(0);
    p0.keys[0] = KeyAction::key(K0);
    p0.keys[4] = KeyAction::Page(1);
    p0.status_leds = [true, false, false];

    let mut p1 = Keypage::blank(1);
    p1.keys[0] = KeyAction::Output { keycode: K1, modifiers: Modifiers::SHIFT };
    p1.keys[4] = KeyAction::Page(0);
    p1.status_leds = [false, true, false];
    p1.accent_color = Color::new(0x0000FF);

    let mut set = PageSet::new();
    set.insert(p0);
    set.insert(p1);
    set
}

fn report(modifier: Modifiers, keys: &[u8]) -> KeyboardReport {
    let mut r = KeyboardReport::RELEASE;
    r.modifier = modifier;
    for &k in keys {
        r.push(k);
    }
    r
}

#[test]
fn test_press_release_then_silence() {
    let registry = PageRegistry::new();
    registry.commit(&two_pages());
    let (fault, log) = (FaultState::new(), LogStream::new());
    let mut engine = ScanEngine::new(&registry, &fault, &log, &Settings::DEFAULT);
    let mut rig = Rig::new();

    let pressed = report(Modifiers::NONE, &[K0]);
    assert_eq!(rig.cycle(&mut engine, &[0]), CycleOutcome::Sent(pressed));
    assert_eq!(rig.cycle(&mut engine, &[]), CycleOutcome::Released);
    assert_eq!(rig.cycle(&mut engine, &[]), CycleOutcome::Idle);

    assert_eq!(rig.hid.sent, vec![pressed, KeyboardReport::RELEASE]);
}

#[test]
fn test_transition_key_switches_page_without_output() {
    let registry = PageRegistry::new();
    registry.commit(&two_pages());
    let (fault, log) = (FaultState::new(), LogStream::new());
    let mut engine = ScanEngine::new(&registry, &fault, &log, &Settings::DEFAULT);
    let mut rig = Rig::new();

    assert_eq!(rig.cycle(&mut engine, &[4]), CycleOutcome::Idle);
    assert_eq!(engine.active_page(), 1);
    assert!(rig.hid.sent.is_empty());
    assert_eq!(rig.leds.status, [false, true, false]);
    assert_eq!(rig.leds.accent.last(), Some(&Color::new(0x0000FF)));

    rig.cycle(&mut engine, &[]);
    let outcome = rig.cycle(&mut engine, &[0]);
    assert_eq!(outcome, CycleOutcome::Sent(report(Modifiers::SHIFT, &[K1])));
}

#[test]
fn test_held_transition_key_does_not_toggle() {
    let registry = PageRegistry::new();
    registry.commit(&two_pages());
    let (fault, log) = (FaultState::new(), LogStream::new());
    let mut engine = ScanEngine::new(&registry, &fault, &log, &Settings::DEFAULT);
    let mut rig = Rig::new();

    rig.cycle(&mut engine, &[4]);
    assert_eq!(engine.active_page(), 1);
    for _ in 0..5 {
        rig.cycle(&mut engine, &[4]);
        assert_eq!(engine.active_page(), 1);
    }

    rig.cycle(&mut engine, &[]);
    rig.cycle(&mut engine, &[4]);
    assert_eq!(engine.active_page(), 0);
}

#[test]
fn test_output_keys_and_modifiers_combine() {
    let mut page = Keypage::blank(0);
    page.keys[0] = KeyAction::Output { keycode: K0, modifiers: Modifiers::CTRL };
    page.keys[1] = KeyAction::Output { keycode: K1, modifiers: Modifiers::ALT };
    page.keys[2] = KeyAction::Output { keycode: 0, modifiers: Modifiers::GUI };
    let mut set = PageSet::new();
    set.insert(page);

    let registry = PageRegistry::new();
    registry.commit(&set);
    let (fault, log) = (FaultState::new(), LogStream::new());
    let mut engine = ScanEngine::new(&registry, &fault, &log, &Settings::DEFAULT);
    let mut rig = Rig::new();

    let expected = report(
        Modifiers::CTRL.union(Modifiers::ALT).union(Modifiers::GUI),
        &[K0, K1],
    );
    assert_eq!(rig.cycle(&mut engine, &[0, 1, 2]), CycleOutcome::Sent(expected));
}

#[test]
fn test_report_capped_at_six_keys() {
    let mut page = Keypage::blank(0);
    for (i, key) in page.keys.iter_mut().enumerate() {
        *key = KeyAction::key(0x04 + i as u8);
    }
    let mut set = PageSet::new();
    set.insert(page);

    let registry = PageRegistry::new();
    registry.commit(&set);
    let (fault, log) = (FaultState::new(), LogStream::new());
    let mut engine = ScanEngine::new(&registry, &fault, &log, &Settings::DEFAULT);
    let mut rig = Rig::new();

    match rig.cycle(&mut engine, &[0, 1, 2, 3, 4, 5, 6, 7, 8]) {
        CycleOutcome::Sent(r) => {
            assert!(r.is_full());
            // Column order: 0, 3, 6, 1, 4, 7
            assert_eq!(r.keycodes, [0x04, 0x07, 0x0A, 0x05, 0x08, 0x0B]);
        }
        other => panic!("expected a report, got {:?}", other),
    }
}

#[test]
fn test_not_ready_skips_then_sends() {
    let registry = PageRegistry::new();
    registry.commit(&two_pages());
    let (fault, log) = (FaultState::new(), LogStream::new());
    let mut engine = ScanEngine::new(&registry, &fault, &log, &Settings::DEFAULT);
    let mut rig = Rig::new();

    rig.hid.ready = false;
    assert_eq!(rig.cycle(&mut engine, &[0]), CycleOutcome::Skipped);
    assert!(rig.hid.sent.is_empty());

    rig.hid.ready = true;
    assert!(matches!(rig.cycle(&mut engine, &[0]), CycleOutcome::Sent(_)));

    // Release is deferred, not lost
    rig.hid.ready = false;
    assert_eq!(rig.cycle(&mut engine, &[]), CycleOutcome::Skipped);
    rig.hid.ready = true;
    assert_eq!(rig.cycle(&mut engine, &[]), CycleOutcome::Released);
}

#[test]
fn test_suspended_host_is_woken() {
    let registry = PageRegistry::new();
    registry.commit(&two_pages());
    let (fault, log) = (FaultState::new(), LogStream::new());
    let mut engine = ScanEngine::new(&registry, &fault, &log, &Settings::DEFAULT);
    let mut rig = Rig::new();

    rig.hid.suspended = true;
    rig.cycle(&mut engine, &[0]);
    assert_eq!(rig.hid.wakeups, 1);

    // Transition-only cycles send nothing, so never wake the host
    rig.hid.suspended = true;
    rig.cycle(&mut engine, &[]);
    rig.cycle(&mut engine, &[4]);
    assert_eq!(rig.hid.wakeups, 1);
}

#[test]
fn test_reload_resets_cursor_to_page_zero() {
    let registry = PageRegistry::new();
    registry.commit(&two_pages());
    let (fault, log) = (FaultState::new(), LogStream::new());
    let mut engine = ScanEngine::new(&registry, &fault, &log, &Settings::DEFAULT);
    let mut rig = Rig::new();

    rig.cycle(&mut engine, &[4]);
    assert_eq!(engine.active_page(), 1);

    registry.commit(&two_pages());
    rig.cycle(&mut engine, &[]);
    assert_eq!(engine.active_page(), 0);
    assert_eq!(engine.generation(), 2);
    assert_eq!(rig.leds.status, [true, false, false]);
}

#[test]
fn test_empty_registry_produces_nothing() {
    let registry = PageRegistry::new();
    let (fault, log) = (FaultState::new(), LogStream::new());
    let mut engine = ScanEngine::new(&registry, &fault, &log, &Settings::DEFAULT);
    let mut rig = Rig::new();

    assert_eq!(rig.cycle(&mut engine, &[0, 1, 2]), CycleOutcome::Idle);
    assert!(rig.hid.sent.is_empty());
    assert_eq!(rig.leds.accent, vec![Color::OFF]);
}

#[test]
fn test_default_page_types_digits() {
    let registry = PageRegistry::with_default_page();
    let (fault, log) = (FaultState::new(), LogStream::new());
    let mut engine = ScanEngine::new(&registry, &fault, &log, &Settings::DEFAULT);
    let mut rig = Rig::new();

    // Position 8 is key "9"
    assert_eq!(rig.cycle(&mut engine, &[8]), CycleOutcome::Sent(report(Modifiers::NONE, &[0x26])));
}

#[test]
fn test_fault_blinks_accent_then_restores_page() {
    let registry = PageRegistry::new();
    registry.commit(&two_pages());
    let (fault, log) = (FaultState::new(), LogStream::new());
    let settings = Settings { fault_blink_cycles: 1, ..Settings::DEFAULT };
    let mut engine = ScanEngine::new(&registry, &fault, &log, &settings);
    let mut rig = Rig::new();

    rig.cycle(&mut engine, &[]);
    fault.set(FaultCode::ConfigInvalid, 1);
    rig.cycle(&mut engine, &[]);
    rig.cycle(&mut engine, &[]);
    assert_eq!(&rig.leds.accent[1..], &[Color::RED, Color::OFF]);

    fault.clear();
    rig.cycle(&mut engine, &[]);
    assert_eq!(rig.leds.accent.last(), Some(&Color::OFF));
    assert_eq!(rig.leds.accent.len(), 4);
}

#[test]
fn test_page_transitions_are_logged() {
    let registry = PageRegistry::new();
    registry.commit(&two_pages());
    let (fault, log) = (FaultState::new(), LogStream::new());
    log.set_min_level(LogLevel::Debug);
    let mut engine = ScanEngine::new(&registry, &fault, &log, &Settings::DEFAULT);
    let mut rig = Rig::new();

    rig.cycle(&mut engine, &[4]);
    let entry = log.drain().unwrap();
    assert_eq!(entry.level, LogLevel::Debug);
    assert_eq!(entry.text(), "page 0 -> 1");
}
