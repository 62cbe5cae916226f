//! GPIO key matrix: columns are push-pull outputs, rows are pulled-down inputs.

use esp_idf_svc::hal::delay::Ets;
use esp_idf_svc::hal::gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_svc::sys::EspError;

use crate::matrix::{MatrixIo, COLS, ROWS};

pub struct GpioMatrix<'d> {
    cols: [PinDriver<'d, AnyOutputPin, Output>; COLS],
    rows: [PinDriver<'d, AnyInputPin, Input>; ROWS],
}

impl<'d> GpioMatrix<'d> {
    pub fn new(cols: [AnyOutputPin; COLS], rows: [AnyInputPin; ROWS]) -> Result<Self, EspError> {
        let [c1, c2, c3] = cols;
        let [r1, r2, r3] = rows;

        let mut cols = [PinDriver::output(c1)?, PinDriver::output(c2)?, PinDriver::output(c3)?];
        for col in cols.iter_mut() {
            col.set_low()?;
        }

        let mut rows = [PinDriver::input(r1)?, PinDriver::input(r2)?, PinDriver::input(r3)?];
        for row in rows.iter_mut() {
            row.set_pull(Pull::Down)?;
        }

        Ok(Self { cols, rows })
    }
}

impl MatrixIo for GpioMatrix<'_> {
    fn drive_column(&mut self, col: usize, active: bool) {
        if let Some(pin) = self.cols.get_mut(col) {
            let _ = pin.set_level(active.into());
        }
    }

    fn read_row(&mut self, row: usize) -> bool {
        self.rows.get(row).is_some_and(|pin| pin.is_high())
    }

    fn settle(&mut self, ms: u32) {
        // Busy wait: the scan core must not yield mid-column
        Ets::delay_ms(ms);
    }
}
