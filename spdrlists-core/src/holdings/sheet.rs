//! Holdings workbook parsing.
//!
//! A holdings workbook has one worksheet of fund constituents. Data starts at
//! a fixed row; each row carries the ticker and sector in fixed columns. The
//! first row whose sector equals the sentinel (`Unassigned`) ends the
//! holdings list; cash, futures and other non-equity lines follow it and are
//! never read.

use calamine::{open_workbook, Data, Range, Reader, Xlsx, XlsxError};
use std::io::{Read, Seek};
use std::iter::FusedIterator;
use std::path::Path;
use thiserror::Error;

use crate::config::{ConfigError, WatchlistConfig};

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] XlsxError),

    #[error("worksheet '{name}' not found (available: {})", available.join(", "))]
    MissingWorksheet { name: String, available: Vec<String> },
}

/// Where the holdings live inside the workbook. Rows and columns are zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub worksheet: String,
    pub first_row: u32,
    pub ticker_col: u32,
    pub sector_col: u32,
    pub sentinel_sector: String,
}

impl SheetLayout {
    pub fn from_config(config: &WatchlistConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            worksheet: config.worksheet.clone(),
            first_row: config.first_row - 1,
            ticker_col: config.ticker_index()?,
            sector_col: config.sector_index()?,
            sentinel_sector: config.sentinel_sector.clone(),
        })
    }
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            worksheet: "holdings".into(),
            first_row: 5,
            ticker_col: 1,
            sector_col: 5,
            sentinel_sector: "Unassigned".into(),
        }
    }
}

/// One holdings line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldingRow {
    /// 1-based spreadsheet row, for diagnostics.
    pub row: u32,
    pub sector: String,
    pub ticker: String,
}

/// The holdings worksheet of one downloaded workbook.
pub struct HoldingsSheet {
    range: Range<Data>,
    layout: SheetLayout,
}

impl HoldingsSheet {
    /// Open a workbook file and select the holdings worksheet.
    pub fn open(path: &Path, layout: &SheetLayout) -> Result<Self, SheetError> {
        let workbook: Xlsx<_> = open_workbook(path)?;
        Self::from_workbook(workbook, layout)
    }

    /// Read a workbook from any seekable reader (an in-memory buffer in tests).
    pub fn from_reader<RS: Read + Seek>(
        reader: RS,
        layout: &SheetLayout,
    ) -> Result<Self, SheetError> {
        let workbook = Xlsx::new(reader)?;
        Self::from_workbook(workbook, layout)
    }

    fn from_workbook<RS: Read + Seek>(
        mut workbook: Xlsx<RS>,
        layout: &SheetLayout,
    ) -> Result<Self, SheetError> {
        let available = workbook.sheet_names();
        if !available.iter().any(|n| n == &layout.worksheet) {
            return Err(SheetError::MissingWorksheet {
                name: layout.worksheet.clone(),
                available,
            });
        }
        let range = workbook.worksheet_range(&layout.worksheet)?;
        Ok(Self {
            range,
            layout: layout.clone(),
        })
    }

    /// Consume the sheet into its holdings rows.
    pub fn rows(self) -> HoldingRows {
        let last_row = self.range.end().map(|(row, _)| row);
        HoldingRows {
            next_row: self.layout.first_row,
            last_row,
            range: self.range,
            layout: self.layout,
            finished: false,
        }
    }
}

/// Holdings rows in sheet order, ending at the sentinel sector or the end of
/// the sheet, whichever comes first. Cannot be restarted.
pub struct HoldingRows {
    range: Range<Data>,
    layout: SheetLayout,
    next_row: u32,
    last_row: Option<u32>,
    finished: bool,
}

impl Iterator for HoldingRows {
    type Item = HoldingRow;

    fn next(&mut self) -> Option<HoldingRow> {
        if self.finished {
            return None;
        }
        let row = match self.last_row {
            Some(last) if self.next_row <= last => self.next_row,
            _ => {
                self.finished = true;
                return None;
            }
        };
        self.next_row += 1;

        let sector = cell_text(self.range.get_value((row, self.layout.sector_col)));
        if sector == self.layout.sentinel_sector {
            self.finished = true;
            return None;
        }
        let ticker = cell_text(self.range.get_value((row, self.layout.ticker_col)));

        Some(HoldingRow {
            row: row + 1,
            sector,
            ticker,
        })
    }
}

impl FusedIterator for HoldingRows {}

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}
