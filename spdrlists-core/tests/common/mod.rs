//! Shared fixtures: in-memory holdings workbooks and a fake holdings source.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use spdrlists_core::{FetchError, FetchedHoldings, FundBatch, HoldingsSource, WatchlistConfig};

/// Build a holdings workbook laid out like the SSGA files: a short preamble,
/// a header on row 5, holdings from row 6 with ticker in B and sector in F.
pub fn holdings_workbook(sheet: &str, rows: &[(&str, &str)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.set_name(sheet).unwrap();
    ws.write_string(0, 0, "Fund Name:").unwrap();
    ws.write_string(1, 0, "Ticker Symbol:").unwrap();
    ws.write_string(4, 0, "Name").unwrap();
    ws.write_string(4, 1, "Ticker").unwrap();
    ws.write_string(4, 2, "Identifier").unwrap();
    ws.write_string(4, 4, "Weight").unwrap();
    ws.write_string(4, 5, "Sector").unwrap();
    for (i, (ticker, sector)) in rows.iter().enumerate() {
        let r = 5 + i as u32;
        ws.write_string(r, 0, format!("{ticker} INC")).unwrap();
        ws.write_string(r, 1, *ticker).unwrap();
        ws.write_number(r, 4, 1.5).unwrap();
        ws.write_string(r, 5, *sector).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

/// Serves pre-built workbooks by fund symbol and records every request.
#[derive(Default)]
pub struct FixtureSource {
    books: HashMap<String, Vec<u8>>,
    pub requests: RefCell<Vec<String>>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fund(mut self, symbol: &str, rows: &[(&str, &str)]) -> Self {
        self.books
            .insert(symbol.to_string(), holdings_workbook("holdings", rows));
        self
    }

    pub fn with_raw(mut self, symbol: &str, bytes: Vec<u8>) -> Self {
        self.books.insert(symbol.to_string(), bytes);
        self
    }
}

impl HoldingsSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    fn fetch(&self, symbol: &str) -> Result<FetchedHoldings, FetchError> {
        self.requests.borrow_mut().push(symbol.to_string());
        let bytes = self
            .books
            .get(symbol)
            .cloned()
            .ok_or_else(|| FetchError::NotAvailable {
                symbol: symbol.to_string(),
            })?;
        Ok(FetchedHoldings {
            url: format!("fixture://{symbol}"),
            bytes,
        })
    }
}

/// A `Jts` tree inside a fresh temp dir.
pub struct TwsHome {
    pub dir: tempfile::TempDir,
}

impl TwsHome {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Jts")).unwrap();
        Self { dir }
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    pub fn jts(&self) -> PathBuf {
        self.dir.path().join("Jts")
    }

    pub fn config(&self, batches: Vec<FundBatch>) -> WatchlistConfig {
        WatchlistConfig {
            base_dir: Some(self.base().to_path_buf()),
            batches,
            ..WatchlistConfig::default()
        }
    }
}

pub fn batch(name: &str, funds: &[&str]) -> FundBatch {
    FundBatch {
        name: name.to_string(),
        funds: funds.iter().map(|f| f.to_string()).collect(),
        subdir: None,
        learn_suffixes: false,
        split_sectors: false,
    }
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
