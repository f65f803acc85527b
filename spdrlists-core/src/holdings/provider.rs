//! Holdings source trait and fetch error types.
//!
//! `HoldingsSource` abstracts over where a fund's holdings spreadsheet comes
//! from so the pipeline can run against the State Street site or a test fake.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("network error fetching {symbol}: {message}")]
    Network { symbol: String, message: String },

    #[error("no holdings available for {symbol}")]
    NotAvailable { symbol: String },
}

/// Raw spreadsheet document for one fund.
#[derive(Debug, Clone)]
pub struct FetchedHoldings {
    /// Where the document was fetched from, for error reports.
    pub url: String,
    pub bytes: Vec<u8>,
}

/// Trait for holdings spreadsheet sources.
pub trait HoldingsSource {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch the holdings document for a fund symbol.
    fn fetch(&self, symbol: &str) -> Result<FetchedHoldings, FetchError>;
}

/// Progress callback for the per-fund fetch loop.
pub trait FetchProgress {
    /// Called when starting to fetch a fund.
    fn on_start(&self, batch: &str, symbol: &str, index: usize, total: usize);

    /// Called after a fund's rows have been extracted.
    fn on_extracted(&self, symbol: &str, rows: usize);

    /// Called when a batch's files have been written.
    fn on_batch_complete(&self, batch: &str, files: usize);
}

/// Prints progress to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, batch: &str, symbol: &str, index: usize, total: usize) {
        println!("[{batch} {}/{}] Fetching {symbol}...", index + 1, total);
    }

    fn on_extracted(&self, symbol: &str, rows: usize) {
        println!("  OK: {symbol} ({rows} holdings)");
    }

    fn on_batch_complete(&self, batch: &str, files: usize) {
        println!("{batch}: wrote {files} watchlist(s)\n");
    }
}

/// Discards all progress events.
pub struct SilentProgress;

impl FetchProgress for SilentProgress {
    fn on_start(&self, _batch: &str, _symbol: &str, _index: usize, _total: usize) {}
    fn on_extracted(&self, _symbol: &str, _rows: usize) {}
    fn on_batch_complete(&self, _batch: &str, _files: usize) {}
}
