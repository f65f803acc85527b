//! SPDR Watchlists Core — holdings download, sector grouping, TWS watchlist export.
//!
//! This crate turns State Street's daily fund holdings spreadsheets into
//! watchlist files for the TWS import dialog:
//! - Run configuration with the standard fund batches built in
//! - Holdings sources (the SSGA site, or anything implementing `HoldingsSource`)
//! - Workbook parsing that stops at the sentinel sector
//! - Sector suffix table for simulated per-sector watchlists
//! - Watchlist CSV emission and the batch pipeline tying it together

pub mod config;
pub mod emit;
pub mod environment;
pub mod grouping;
pub mod holdings;
pub mod pipeline;
pub mod sectors;

pub use config::{ConfigError, FundBatch, WatchlistConfig};
pub use emit::{write_watchlists, Destination, EmitError};
pub use environment::{EnvError, Environment, ScratchFile};
pub use grouping::{apply_rows, ExtractError, ExtractOptions, Groupings, TickerGroup};
pub use holdings::{
    FetchError, FetchProgress, FetchedHoldings, HoldingRow, HoldingsSheet, HoldingsSource,
    SheetError, SheetLayout, SilentProgress, SsgaProvider, StdoutProgress,
};
pub use pipeline::{run, run_in, BatchReport, Extraction, PipelineError, RunSummary};
pub use sectors::SectorSuffixes;
