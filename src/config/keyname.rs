//! Key string grammar.
//!
//! ```text
//! key      = page | output
//! page     = "page" digit            ; case-insensitive, spaces ignored
//! output   = [ anything "+" ] symbol ; spaces ignored
//! ```
//!
//! Modifiers are found by substring search over the whole (space-stripped)
//! string: `alt`, `ctl`/`ctrl`, `shift`, `gui` may appear anywhere, in any
//! case, any number of times. `"ctl+shift+F5"`, `"shift+ctl+F5"` and
//! `"ctlshift+F5"` all resolve to the same action.
//!
//! The symbol is the text after the last `+` (or the whole string) and is
//! looked up case-sensitively in [`crate::keycodes`]. An unknown symbol is
//! not an error: the key sends its modifiers with keycode NONE.

use alloc::string::String;

use crate::keycodes;
use crate::page::{KeyAction, Modifiers};

/// Modifier keywords and the bit each one sets.
const MODIFIER_KEYWORDS: &[(&str, Modifiers)] = &[
    ("alt", Modifiers::ALT),
    ("ctl", Modifiers::CTRL),
    ("ctrl", Modifiers::CTRL),
    ("shift", Modifiers::SHIFT),
    ("gui", Modifiers::GUI),
];

/// Resolve one `keys."N"` string.
pub fn parse_key(raw: &str) -> KeyAction {
    let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    if let Some(target) = page_target(&stripped) {
        return KeyAction::Page(target);
    }

    KeyAction::Output {
        keycode: keycodes::lookup(symbol(&stripped)),
        modifiers: modifiers(&stripped),
    }
}

/// `pageN` → `Some(N)` for a single digit N.
fn page_target(stripped: &str) -> Option<u8> {
    let bytes = stripped.as_bytes();
    if bytes.len() != 5 || !bytes[..4].eq_ignore_ascii_case(b"page") {
        return None;
    }
    let digit = bytes[4];
    digit.is_ascii_digit().then(|| digit - b'0')
}

/// Modifier bits named anywhere in the string.
pub fn modifiers(stripped: &str) -> Modifiers {
    let mut mods = Modifiers::NONE;
    for &(keyword, bit) in MODIFIER_KEYWORDS {
        if contains_ignore_case(stripped, keyword) {
            mods.insert(bit);
        }
    }
    mods
}

/// Text after the last `+`, or the whole string.
pub fn symbol(stripped: &str) -> &str {
    match stripped.rfind('+') {
        Some(pos) => &stripped[pos + 1..],
        None => stripped,
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle))
}
