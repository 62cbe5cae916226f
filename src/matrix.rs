//! 3×3 key matrix scanning.
//!
//! Columns are driven one at a time; rows are sampled after a fixed
//! settling delay. There is no software debounce beyond that delay.
//!
//! ```text
//!          col0  col1  col2
//! row0  →   0     1     2
//! row1  →   3     4     5
//! row2  →   6     7     8
//! ```
//!
//! Position = row * 3 + col, matching key names "1".."9" minus one.

use crate::hid::MAX_REPORT_KEYS;

pub const ROWS: usize = 3;
pub const COLS: usize = 3;

/// Pin access for the matrix.
pub trait MatrixIo {
    /// Drive a column active (true) or inactive (false).
    fn drive_column(&mut self, col: usize, active: bool);

    /// Sample a row. True when a key on the driven column is closed.
    fn read_row(&mut self, row: usize) -> bool;

    /// Electrical settling delay.
    fn settle(&mut self, ms: u32);
}

/// Keys captured in one scan cycle, in scan order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PressedKeys {
    positions: [u8; MAX_REPORT_KEYS],
    count: u8,
    mask: u16,
}

impl PressedKeys {
    fn push(&mut self, position: usize) -> bool {
        if self.is_full() {
            return false;
        }
        self.positions[self.count as usize] = position as u8;
        self.count += 1;
        self.mask |= 1 << position;
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == MAX_REPORT_KEYS
    }

    /// Bit `n` set if position `n` was captured.
    #[inline]
    pub fn mask(&self) -> u16 {
        self.mask
    }

    pub fn contains(&self, position: usize) -> bool {
        position < 16 && self.mask & (1 << position) != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions[..self.len()].iter().map(|&p| p as usize)
    }

    /// Build from positions (scan order). Extra positions past the cap are ignored.
    pub fn from_positions(positions: &[usize]) -> Self {
        let mut keys = Self::default();
        for &p in positions {
            keys.push(p);
        }
        keys
    }
}

/// Column-driven matrix scanner.
pub struct MatrixScanner {
    settle_ms: u32,
}

impl MatrixScanner {
    pub const fn new(settle_ms: u32) -> Self {
        Self { settle_ms }
    }

    /// One full scan. Stops capturing after [`MAX_REPORT_KEYS`] keys.
    pub fn scan<M: MatrixIo + ?Sized>(&self, io: &mut M) -> PressedKeys {
        let mut keys = PressedKeys::default();
        for col in 0..COLS {
            if keys.is_full() {
                break;
            }
            self.scan_column(io, col, &mut keys);
        }
        keys
    }

    fn scan_column<M: MatrixIo + ?Sized>(&self, io: &mut M, col: usize, keys: &mut PressedKeys) {
        for c in 0..COLS {
            io.drive_column(c, c == col);
        }

        for row in 0..ROWS {
            io.settle(self.settle_ms);
            if io.read_row(row) && !keys.push(row * COLS + col) {
                break;
            }
        }

        io.drive_column(col, false);
    }
}
