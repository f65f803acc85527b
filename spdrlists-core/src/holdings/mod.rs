//! Holdings download and spreadsheet parsing

pub mod provider;
pub mod sheet;
pub mod ssga;

pub use provider::{
    FetchError, FetchProgress, FetchedHoldings, HoldingsSource, SilentProgress, StdoutProgress,
};
pub use sheet::{HoldingRow, HoldingRows, HoldingsSheet, SheetError, SheetLayout};
pub use ssga::SsgaProvider;
