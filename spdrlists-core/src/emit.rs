//! TWS watchlist export.
//!
//! The TWS import format is a headerless CSV: a `COLUMN,0` line, then one
//! `DES` line per contract. The trailing empty fields are positional
//! placeholders TWS requires, so every line carries all nine fields.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::environment::{ensure_dir, EnvError};
use crate::grouping::{Groupings, TickerGroup};

/// Routing for contracts on US listings.
pub const DEFAULT_EXCHANGE: &str = "SMART/AMEX";

#[derive(Debug, Error)]
pub enum EmitError {
    #[error(transparent)]
    Dir(#[from] EnvError),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a batch's watchlist files go, relative to the output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination<'a> {
    /// Directly in the output root.
    Root,
    /// One fixed subdirectory for every file.
    Subdir(&'a str),
    /// A subdirectory named after each group's base fund.
    PerBaseFund,
}

impl<'a> Destination<'a> {
    /// A fixed subdirectory wins; otherwise split batches go per base fund.
    pub fn for_batch(subdir: Option<&'a str>, split_sectors: bool) -> Self {
        match subdir {
            Some(dir) if !dir.is_empty() => Destination::Subdir(dir),
            _ if split_sectors => Destination::PerBaseFund,
            _ => Destination::Root,
        }
    }

    pub fn dir_for(&self, root: &Path, group: &TickerGroup) -> PathBuf {
        match self {
            Destination::Root => root.to_path_buf(),
            Destination::Subdir(dir) => root.join(dir),
            Destination::PerBaseFund => root.join(&group.base_fund),
        }
    }
}

/// Render one watchlist file.
pub fn watchlist_csv<'t, I>(tickers: I) -> Result<String, EmitError>
where
    I: IntoIterator<Item = &'t String>,
{
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(vec![]);

    wtr.write_record(["COLUMN", "0"])?;
    for ticker in tickers {
        wtr.write_record([
            "DES",
            ticker.as_str(),
            "STK",
            DEFAULT_EXCHANGE,
            "",
            "",
            "",
            "",
            "",
        ])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| EmitError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Write every group as `<key>.csv` under its destination directory.
///
/// Existing files are replaced. Returns the written paths in key order.
pub fn write_watchlists(
    groups: &Groupings,
    root: &Path,
    dest: Destination<'_>,
) -> Result<Vec<PathBuf>, EmitError> {
    let mut written = Vec::with_capacity(groups.len());

    for (key, group) in groups.iter() {
        let dir = dest.dir_for(root, group);
        ensure_dir(&dir)?;

        let path = dir.join(format!("{key}.csv"));
        let body = watchlist_csv(&group.tickers)?;
        std::fs::write(&path, body).map_err(|source| EmitError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), tickers = group.tickers.len(), "watchlist written");
        written.push(path);
    }

    Ok(written)
}
