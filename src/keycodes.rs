//! Module: keycodes
//!
//! Purpose: Key Symbol Table. Maps the human-readable key names used in
//! `config.json` to USB HID keyboard usage codes (usage page 0x07).
//!
//! Architecture:
//! - One static table, built at compile time, never mutated
//! - Names are case-sensitive and unique
//! - Unknown names resolve to [`KEY_NONE`], never to an error
//!
//! Modifiers (Ctrl/Shift/Alt/GUI) are not in this table. They are resolved
//! from the key string separately, see [`crate::config::keyname`].
//!
//! Safety: Safe. Pure lookup data.

/// Usage code meaning "no key". Also what the host sees for an empty slot.
pub const KEY_NONE: u8 = 0x00;

/// Name → usage code table.
pub static KEY_SYMBOLS: &[(&str, u8)] = &[
    // Letters
    ("a", 0x04), ("b", 0x05), ("c", 0x06), ("d", 0x07), ("e", 0x08),
    ("f", 0x09), ("g", 0x0A), ("h", 0x0B), ("i", 0x0C), ("j", 0x0D),
    ("k", 0x0E), ("l", 0x0F), ("m", 0x10), ("n", 0x11), ("o", 0x12),
    ("p", 0x13), ("q", 0x14), ("r", 0x15), ("s", 0x16), ("t", 0x17),
    ("u", 0x18), ("v", 0x19), ("w", 0x1A), ("x", 0x1B), ("y", 0x1C),
    ("z", 0x1D),

    // Number row
    ("1", 0x1E), ("2", 0x1F), ("3", 0x20), ("4", 0x21), ("5", 0x22),
    ("6", 0x23), ("7", 0x24), ("8", 0x25), ("9", 0x26), ("0", 0x27),
    ("grave", 0x35),
    ("minus", 0x2D),
    ("equal", 0x2E),
    ("backspace", 0x2A),

    // Punctuation
    ("left_bracket", 0x2F),
    ("right_bracket", 0x30),
    ("backslash", 0x31),
    ("semicolon", 0x33),
    ("apostrophe", 0x34),
    ("comma", 0x36),
    ("period", 0x37),
    ("slash", 0x38),

    // Function keys
    ("F1", 0x3A), ("F2", 0x3B), ("F3", 0x3C), ("F4", 0x3D),
    ("F5", 0x3E), ("F6", 0x3F), ("F7", 0x40), ("F8", 0x41),
    ("F9", 0x42), ("F10", 0x43), ("F11", 0x44), ("F12", 0x45),
    ("F13", 0x68), ("F14", 0x69), ("F15", 0x6A), ("F16", 0x6B),
    ("F17", 0x6C), ("F18", 0x6D), ("F19", 0x6E), ("F20", 0x6F),
    ("F21", 0x70), ("F22", 0x71), ("F23", 0x72), ("F24", 0x73),

    // Control
    ("escape", 0x29),
    ("enter", 0x28),
    ("space", 0x2C),
    ("tab", 0x2B),
    ("caps_lock", 0x39),
    ("print_screen", 0x46),
    ("scroll_lock", 0x47),
    ("pause", 0x48),

    // Navigation / editing
    ("insert", 0x49),
    ("delete", 0x4C),
    ("home", 0x4A),
    ("end", 0x4D),
    ("page_up", 0x4B),
    ("page_down", 0x4E),
    ("up", 0x52),
    ("down", 0x51),
    ("left", 0x50),
    ("right", 0x4F),

    // Keypad
    ("num_lock", 0x53),
    ("key_0", 0x62), ("key_1", 0x59), ("key_2", 0x5A), ("key_3", 0x5B),
    ("key_4", 0x5C), ("key_5", 0x5D), ("key_6", 0x5E), ("key_7", 0x5F),
    ("key_8", 0x60), ("key_9", 0x61),
    ("key_plus", 0x57),
    ("key_comma", 0x85),
    ("key_period", 0x63),
    ("key_slash", 0x54),
    ("key_enter", 0x58),
    ("key_equal", 0x67),
    ("key_equal_sign", 0x86),
    ("key_asterisk", 0x55),
    ("key_minus", 0x56),

    // Editing commands
    ("undo", 0x7A),
    ("cut", 0x7B),
    ("copy", 0x7C),
    ("paste", 0x7D),
    ("find", 0x7E),

    // Media / system
    ("mute", 0x7F),
    ("vol_up", 0x80),
    ("vol_down", 0x81),
    ("power", 0x66),
    ("compose", 0x65),
];

/// Look up a key name. Returns `None` for unknown names.
#[inline]
pub fn find(name: &str) -> Option<u8> {
    KEY_SYMBOLS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, code)| code)
}

/// Look up a key name, degrading unknown names to [`KEY_NONE`].
#[inline]
pub fn lookup(name: &str) -> u8 {
    find(name).unwrap_or(KEY_NONE)
}

/// Reverse lookup, for diagnostics.
pub fn name_of(code: u8) -> Option<&'static str> {
    KEY_SYMBOLS
        .iter()
        .find(|&&(_, c)| c == code)
        .map(|&(n, _)| n)
}
