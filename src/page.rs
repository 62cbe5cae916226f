//! Module: page
//!
//! Purpose: Page Model. One [`Keypage`] holds the complete assignment of the
//! 3×3 key matrix plus the indicator state shown while that page is active.
//!
//! Architecture:
//! - Fixed layout: 9 key positions, 3 status LEDs, 3 indicator LEDs, 1 RGB accent
//! - A key position is either an output (keycode + modifiers) or a page
//!   transition, never both ([`KeyAction`])
//! - All types are `Copy` so pages can be copied out of the registry by value
//!
//! Key positions are numbered row-major from 0, so `config.json` key `"1"`
//! is position 0 and key `"9"` is position 8.
//!
//! Safety: Safe. No unsafe blocks. Copy types only.

use crate::keycodes::KEY_NONE;

/// Maximum number of pages (page ids 0..=8).
pub const MAX_PAGES: usize = 9;

/// Physical key positions per page.
pub const KEYS_PER_PAGE: usize = 9;

/// Discrete status LEDs (and indicator LEDs) per page.
pub const LED_COUNT: usize = 3;

/// Highest valid page id.
pub const MAX_PAGE_ID: u8 = (MAX_PAGES - 1) as u8;

/// HID boot-keyboard modifier bitmask.
///
/// Only the left-hand modifier bits are produced by the keymap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Self = Self(0x00);
    pub const CTRL: Self = Self(0x01);
    pub const SHIFT: Self = Self(0x02);
    pub const ALT: Self = Self(0x04);
    pub const GUI: Self = Self(0x08);

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// What a key position does when pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Send `keycode` with `modifiers` held.
    Output { keycode: u8, modifiers: Modifiers },
    /// Switch the active page. Emits nothing.
    Page(u8),
}

impl KeyAction {
    /// Output action with no modifiers.
    pub const fn key(keycode: u8) -> Self {
        KeyAction::Output { keycode, modifiers: Modifiers::NONE }
    }

    /// Output action that sends nothing at all.
    pub const NOTHING: Self = KeyAction::key(KEY_NONE);
}

impl Default for KeyAction {
    fn default() -> Self {
        Self::NOTHING
    }
}

/// 24-bit RGB color, `0xRRGGBB`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color(u32);

impl Color {
    pub const OFF: Self = Self(0);
    pub const RED: Self = Self(0xFF0000);

    /// Build from a packed value. Bits above 24 are discarded.
    #[inline]
    pub const fn new(rgb: u32) -> Self {
        Self(rgb & 0x00FF_FFFF)
    }

    #[inline]
    pub const fn rgb(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    /// Scale each channel by `brightness / 256` (255 ≈ full).
    pub const fn scaled(self, brightness: u8) -> Self {
        let scale = brightness as u32 + 1;
        let r = (self.r() as u32 * scale) >> 8;
        let g = (self.g() as u32 * scale) >> 8;
        let b = (self.b() as u32 * scale) >> 8;
        Self((r << 16) | (g << 8) | b)
    }
}

/// One page of key assignments and indicator state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Keypage {
    /// Page id, 0..=8.
    pub page_id: u8,
    /// Per-position action, row-major.
    pub keys: [KeyAction; KEYS_PER_PAGE],
    /// `led1..led3`
    pub status_leds: [bool; LED_COUNT],
    /// `ledR`, `ledG`, `ledB`
    pub indicator_leds: [bool; LED_COUNT],
    /// `neopixel`
    pub accent_color: Color,
}

impl Keypage {
    /// Page with every key sending nothing and all indicators off.
    pub const fn blank(page_id: u8) -> Self {
        Self {
            page_id,
            keys: [KeyAction::NOTHING; KEYS_PER_PAGE],
            status_leds: [false; LED_COUNT],
            indicator_leds: [false; LED_COUNT],
            accent_color: Color::OFF,
        }
    }

    /// Built-in page 0 used until a configuration is loaded:
    /// the nine keys type the digits 1..9.
    pub const DEFAULT: Self = Self {
        page_id: 0,
        keys: [
            KeyAction::key(0x1E), KeyAction::key(0x1F), KeyAction::key(0x20),
            KeyAction::key(0x21), KeyAction::key(0x22), KeyAction::key(0x23),
            KeyAction::key(0x24), KeyAction::key(0x25), KeyAction::key(0x26),
        ],
        status_leds: [false; LED_COUNT],
        indicator_leds: [false; LED_COUNT],
        accent_color: Color::OFF,
    };

    /// Action at a key position, `None` if out of range.
    #[inline]
    pub fn action(&self, position: usize) -> Option<KeyAction> {
        self.keys.get(position).copied()
    }

    /// Page ids this page can switch to.
    pub fn transition_targets(&self) -> impl Iterator<Item = u8> + '_ {
        self.keys.iter().filter_map(|k| match *k {
            KeyAction::Page(target) => Some(target),
            KeyAction::Output { .. } => None,
        })
    }
}

/// A validated set of pages, at most one per page id.
///
/// This is what a successful parse produces and what the registry commits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageSet {
    slots: [Option<Keypage>; MAX_PAGES],
}

impl PageSet {
    pub const fn new() -> Self {
        Self { slots: [None; MAX_PAGES] }
    }

    /// Set holding only [`Keypage::DEFAULT`].
    pub const fn with_default() -> Self {
        let mut slots = [None; MAX_PAGES];
        slots[0] = Some(Keypage::DEFAULT);
        Self { slots }
    }

    /// Store `page` in the slot for its id, returning what was there.
    ///
    /// Pages with an id above [`MAX_PAGE_ID`] are ignored.
    pub fn insert(&mut self, page: Keypage) -> Option<Keypage> {
        self.slots
            .get_mut(page.page_id as usize)
            .and_then(|slot| slot.replace(page))
    }

    #[inline]
    pub fn get(&self, page_id: u8) -> Option<&Keypage> {
        self.slots.get(page_id as usize).and_then(Option::as_ref)
    }

    #[inline]
    pub fn contains(&self, page_id: u8) -> bool {
        self.get(page_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pages in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Keypage> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    #[inline]
    pub const fn slots(&self) -> &[Option<Keypage>; MAX_PAGES] {
        &self.slots
    }
}
