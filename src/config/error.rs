//! Keymap load errors.
//!
//! Nothing here is fatal. On any error the registry keeps its last good
//! contents and the loader retries on the next storage change.

use thiserror::Error;

/// The keymap document is malformed or incomplete.
///
/// `index` is the position of the offending element in the `pages` array.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("not valid JSON (line {line}, column {column})")]
    Syntax { line: usize, column: usize },

    #[error("config root must be an object")]
    RootNotObject,

    #[error("config must contain a \"pages\" array")]
    MissingPages,

    #[error("\"pages\" must have at least one element")]
    EmptyPages,

    #[error("pages[{index}]: must be an object")]
    PageNotObject { index: usize },

    #[error("pages[{index}]: missing \"keys\"")]
    MissingKeys { index: usize },

    #[error("pages[{index}]: \"keys\" must be an object")]
    KeysNotObject { index: usize },

    #[error("pages[{index}]: \"keys\" must have only elements 1-9")]
    KeyCount { index: usize },

    #[error("pages[{index}]: key \"{key}\" must be a string")]
    KeyNotString { index: usize, key: u8 },

    #[error("pages[{index}]: missing \"page\"")]
    MissingPage { index: usize },

    #[error("pages[{index}]: \"page\" must be an integer")]
    PageNotInteger { index: usize },

    #[error("pages[{index}]: page {page} out of range (max 8)")]
    PageOutOfRange { index: usize, page: i64 },

    #[error("page {page} is defined more than once")]
    DuplicatePage { page: u8 },

    #[error("pages[{index}]: missing \"leds\"")]
    MissingLeds { index: usize },

    #[error("pages[{index}]: \"leds\" must be an object")]
    LedsNotObject { index: usize },

    #[error("pages[{index}]: \"leds\" must have only led1,led2,led3,ledR,ledG,ledB,neopixel")]
    LedFields { index: usize },

    #[error("pages[{index}]: \"{field}\" must be true or false")]
    LedNotBool { index: usize, field: &'static str },

    #[error("pages[{index}]: \"neopixel\" must be a hex color RRGGBB")]
    InvalidColor { index: usize },

    #[error("no page 0 defined")]
    MissingPageZero,

    #[error("page {page} key {key}: switches to page {target}, which is not defined")]
    UnknownTransitionTarget { page: u8, key: u8, target: u8 },
}

/// The keymap document could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("filesystem not formatted")]
    NotFormatted,

    #[error("config file not found")]
    NotFound,

    #[error("config file too large ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("short read ({actual} of {expected} bytes)")]
    ShortRead { expected: usize, actual: usize },

    #[error("I/O error {code}")]
    Io { code: i32 },
}

/// Anything that stops a reload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Not a failure: the host owns the volume and the reload waits for eject.
    #[error("volume in use by host")]
    HostBusy,

    #[error("read failed: {0}")]
    Read(#[from] ReadError),

    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationError),
}
