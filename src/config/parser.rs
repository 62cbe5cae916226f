//! `config.json` parser and validator.
//!
//! Document schema:
//!
//! ```text
//! {"pages": [
//!   {"page": 0,
//!    "keys": {"1": "a", ..., "9": "page 1"},
//!    "leds": {"led1": true, "led2": false, "led3": false,
//!             "ledR": false, "ledG": true, "ledB": false,
//!             "neopixel": "00FF00"}},
//!   ...
//! ]}
//! ```
//!
//! Validation is all-or-nothing. The first violation, in document order,
//! aborts the parse and nothing is committed. Checks run in this order:
//!
//! 1. Structure of every `pages` element (`keys`, then `page`, then `leds`)
//! 2. Page ids are unique
//! 3. Page 0 exists
//! 4. Every `page N` transition names a page defined in the document

use alloc::string::String;

use serde_json::{Map, Value};

use super::error::ValidationError;
use super::keyname::parse_key;
use crate::page::{Color, KeyAction, Keypage, PageSet, KEYS_PER_PAGE, LED_COUNT, MAX_PAGE_ID};
use crate::registry::PageRegistry;

/// Key names, in position order.
const KEY_NAMES: [&str; KEYS_PER_PAGE] = ["1", "2", "3", "4", "5", "6", "7", "8", "9"];

const STATUS_LED_FIELDS: [&str; LED_COUNT] = ["led1", "led2", "led3"];
const INDICATOR_LED_FIELDS: [&str; LED_COUNT] = ["ledR", "ledG", "ledB"];
const COLOR_FIELD: &str = "neopixel";

/// Number of fields a `leds` object must have.
const LED_FIELD_COUNT: usize = 2 * LED_COUNT + 1;

/// Validate a document and build its page set.
pub fn parse_document(document: &[u8]) -> Result<PageSet, ValidationError> {
    let root: Value = serde_json::from_slice(document).map_err(|e| ValidationError::Syntax {
        line: e.line(),
        column: e.column(),
    })?;

    let root = root.as_object().ok_or(ValidationError::RootNotObject)?;
    let elements = root
        .get("pages")
        .and_then(Value::as_array)
        .ok_or(ValidationError::MissingPages)?;
    if elements.is_empty() {
        return Err(ValidationError::EmptyPages);
    }

    let mut set = PageSet::new();
    for (index, element) in elements.iter().enumerate() {
        let page = parse_page(index, element)?;
        if set.insert(page).is_some() {
            return Err(ValidationError::DuplicatePage { page: page.page_id });
        }
    }

    if !set.contains(0) {
        return Err(ValidationError::MissingPageZero);
    }

    check_transitions(&set)?;

    Ok(set)
}

/// Validate a document and commit it to `registry`.
///
/// On error the registry is not touched. Returns the number of pages loaded.
pub fn parse(document: &[u8], registry: &PageRegistry) -> Result<usize, ValidationError> {
    let set = parse_document(document)?;
    registry.commit(&set);
    Ok(set.len())
}

fn parse_page(index: usize, element: &Value) -> Result<Keypage, ValidationError> {
    let obj = element
        .as_object()
        .ok_or(ValidationError::PageNotObject { index })?;

    let keys = parse_keys(index, obj)?;
    let page_id = parse_page_id(index, obj)?;
    let mut page = Keypage::blank(page_id);
    page.keys = keys;
    parse_leds(index, obj, &mut page)?;

    Ok(page)
}

fn parse_keys(
    index: usize,
    obj: &Map<String, Value>,
) -> Result<[KeyAction; KEYS_PER_PAGE], ValidationError> {
    let keys = obj
        .get("keys")
        .ok_or(ValidationError::MissingKeys { index })?
        .as_object()
        .ok_or(ValidationError::KeysNotObject { index })?;

    if keys.len() != KEYS_PER_PAGE || !KEY_NAMES.iter().all(|k| keys.contains_key(*k)) {
        return Err(ValidationError::KeyCount { index });
    }

    let mut actions = [KeyAction::NOTHING; KEYS_PER_PAGE];
    for (position, name) in KEY_NAMES.iter().enumerate() {
        let raw = keys
            .get(*name)
            .and_then(Value::as_str)
            .ok_or(ValidationError::KeyNotString { index, key: position as u8 + 1 })?;
        actions[position] = parse_key(raw);
    }
    Ok(actions)
}

fn parse_page_id(index: usize, obj: &Map<String, Value>) -> Result<u8, ValidationError> {
    let value = obj.get("page").ok_or(ValidationError::MissingPage { index })?;

    let page = match value.as_i64() {
        Some(page) => page,
        // Positive but beyond i64
        None if value.is_u64() => i64::MAX,
        None => return Err(ValidationError::PageNotInteger { index }),
    };

    if !(0..=MAX_PAGE_ID as i64).contains(&page) {
        return Err(ValidationError::PageOutOfRange { index, page });
    }
    Ok(page as u8)
}

fn parse_leds(
    index: usize,
    obj: &Map<String, Value>,
    page: &mut Keypage,
) -> Result<(), ValidationError> {
    let leds = obj
        .get("leds")
        .ok_or(ValidationError::MissingLeds { index })?
        .as_object()
        .ok_or(ValidationError::LedsNotObject { index })?;

    let all_present = STATUS_LED_FIELDS
        .iter()
        .chain(INDICATOR_LED_FIELDS.iter())
        .chain(core::iter::once(&COLOR_FIELD))
        .all(|f| leds.contains_key(*f));
    if leds.len() != LED_FIELD_COUNT || !all_present {
        return Err(ValidationError::LedFields { index });
    }

    for (i, field) in STATUS_LED_FIELDS.iter().enumerate() {
        page.status_leds[i] = led_bool(index, leds, field)?;
    }
    for (i, field) in INDICATOR_LED_FIELDS.iter().enumerate() {
        page.indicator_leds[i] = led_bool(index, leds, field)?;
    }

    page.accent_color = leds
        .get(COLOR_FIELD)
        .and_then(Value::as_str)
        .and_then(parse_color)
        .ok_or(ValidationError::InvalidColor { index })?;

    Ok(())
}

fn led_bool(
    index: usize,
    leds: &Map<String, Value>,
    field: &'static str,
) -> Result<bool, ValidationError> {
    leds.get(field)
        .and_then(Value::as_bool)
        .ok_or(ValidationError::LedNotBool { index, field })
}

/// Parse `RRGGBB` (optionally `#RRGGBB` or `0xRRGGBB`).
pub fn parse_color(text: &str) -> Option<Color> {
    let text = text.trim();
    let hex = text
        .strip_prefix('#')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    // from_str_radix would accept a leading '+'
    if hex.is_empty() || hex.len() > 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let rgb = u32::from_str_radix(hex, 16).ok()?;
    (rgb <= 0x00FF_FFFF).then(|| Color::new(rgb))
}

fn check_transitions(set: &PageSet) -> Result<(), ValidationError> {
    for page in set.iter() {
        for (position, action) in page.keys.iter().enumerate() {
            if let KeyAction::Page(target) = *action {
                if !set.contains(target) {
                    return Err(ValidationError::UnknownTransitionTarget {
                        page: page.page_id,
                        key: position as u8 + 1,
                        target,
                    });
                }
            }
        }
    }
    Ok(())
}
