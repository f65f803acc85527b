//! Ticker groupings: which tickers go into which watchlist file.
//!
//! A batch builds one `Groupings` from the rows of all its funds. The group
//! key is the watchlist name: the fund symbol itself, or the fund symbol plus
//! a sector suffix when the batch splits funds into simulated sector lists.

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{FundBatch, WatchlistConfig};
use crate::environment::EnvError;
use crate::holdings::{FetchError, HoldingRow, SheetError};
use crate::sectors::SectorSuffixes;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{symbol} ({url}): {source}")]
    Sheet {
        symbol: String,
        url: String,
        #[source]
        source: SheetError,
    },

    #[error(transparent)]
    Scratch(#[from] EnvError),

    #[error("{symbol} row {row}: no suffix for sector '{sector}'")]
    UnknownSector {
        symbol: String,
        sector: String,
        row: u32,
    },
}

/// Tickers destined for one watchlist file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerGroup {
    /// The real fund the tickers came from.
    pub base_fund: String,
    pub tickers: BTreeSet<String>,
}

/// Watchlist name -> tickers, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Groupings {
    groups: BTreeMap<String, TickerGroup>,
}

impl Groupings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ticker to the group `key`, creating it for `base_fund` if needed.
    ///
    /// The fund that first creates a key owns it; tickers from any other
    /// fund producing the same key merge into that group.
    /// Returns whether the ticker was new to the group.
    pub fn add(&mut self, key: &str, base_fund: &str, ticker: &str) -> bool {
        let group = self
            .groups
            .entry(key.to_string())
            .or_insert_with(|| TickerGroup {
                base_fund: base_fund.to_string(),
                tickers: BTreeSet::new(),
            });
        if group.base_fund != base_fund {
            warn!(
                key,
                owner = %group.base_fund,
                fund = base_fund,
                "watchlist name shared by two funds, merging"
            );
        }
        group.tickers.insert(ticker.to_string())
    }

    pub fn get(&self, key: &str) -> Option<&TickerGroup> {
        self.groups.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TickerGroup)> {
        self.groups.iter().map(|(k, g)| (k.as_str(), g))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// How a batch turns rows into groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub learn_suffixes: bool,
    pub split_sectors: bool,
    pub suffix_prefix_len: usize,
}

impl ExtractOptions {
    pub fn for_batch(batch: &FundBatch, config: &WatchlistConfig) -> Self {
        Self {
            learn_suffixes: batch.learn_suffixes,
            split_sectors: batch.split_sectors,
            suffix_prefix_len: config.suffix_prefix_len,
        }
    }

    /// Sector suffix a fund contributes when learning: the symbol past the
    /// fixed prefix (`xlre` -> `re`).
    pub fn suffix_code(&self, symbol: &str) -> String {
        symbol.chars().skip(self.suffix_prefix_len).collect()
    }
}

/// Fold one fund's rows into `groups`.
///
/// With `learn_suffixes` set, every row's sector is mapped to this fund's
/// suffix code before the row is grouped, so later rows and later funds see
/// the update. Returns the number of tickers taken from the fund.
pub fn apply_rows<I>(
    symbol: &str,
    rows: I,
    opts: &ExtractOptions,
    suffixes: &mut SectorSuffixes,
    groups: &mut Groupings,
) -> Result<usize, ExtractError>
where
    I: IntoIterator<Item = HoldingRow>,
{
    let own_code = opts.suffix_code(symbol);
    let mut taken = 0;

    for row in rows {
        if opts.learn_suffixes {
            if let Some(prev) = suffixes.record(&row.sector, &own_code) {
                if prev != own_code {
                    debug!(
                        sector = %row.sector,
                        from = %prev,
                        to = %own_code,
                        "sector suffix reassigned"
                    );
                }
            }
        }

        let key = if opts.split_sectors {
            let code = suffixes
                .get(&row.sector)
                .ok_or_else(|| ExtractError::UnknownSector {
                    symbol: symbol.to_string(),
                    sector: row.sector.clone(),
                    row: row.row,
                })?;
            format!("{symbol}{code}")
        } else {
            symbol.to_string()
        };

        if row.ticker.is_empty() {
            warn!(symbol, row = row.row, sector = %row.sector, "skipping holding with no ticker");
            continue;
        }

        groups.add(&key, symbol, &row.ticker);
        taken += 1;
    }

    Ok(taken)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(n: u32, ticker: &str, sector: &str) -> HoldingRow {
        HoldingRow {
            row: n,
            sector: sector.into(),
            ticker: ticker.into(),
        }
    }

    fn opts(learn: bool, split: bool) -> ExtractOptions {
        ExtractOptions {
            learn_suffixes: learn,
            split_sectors: split,
            suffix_prefix_len: 2,
        }
    }

    #[test]
    fn plain_grouping_uses_fund_symbol() {
        let mut suffixes = SectorSuffixes::seeded();
        let mut groups = Groupings::new();
        let rows = vec![
            row(6, "AAPL", "Information Technology"),
            row(7, "MSFT", "Information Technology"),
            row(8, "AAPL", "Information Technology"),
        ];
        let taken =
            apply_rows("xlk", rows, &opts(false, false), &mut suffixes, &mut groups).unwrap();

        assert_eq!(taken, 3);
        assert_eq!(groups.len(), 1);
        let g = groups.get("xlk").unwrap();
        assert_eq!(g.base_fund, "xlk");
        assert_eq!(
            g.tickers.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["AAPL", "MSFT"]
        );
    }

    #[test]
    fn split_grouping_appends_sector_suffix() {
        let mut suffixes = SectorSuffixes::seeded();
        let mut groups = Groupings::new();
        let rows = vec![row(6, "XOM", "Energy"), row(7, "JPM", "Financials")];
        apply_rows("mdy", rows, &opts(false, true), &mut suffixes, &mut groups).unwrap();

        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["mdye", "mdyf"]);
        assert_eq!(groups.get("mdye").unwrap().base_fund, "mdy");
    }

    #[test]
    fn split_with_unknown_sector_fails() {
        let mut suffixes = SectorSuffixes::seeded();
        let mut groups = Groupings::new();
        let rows = vec![row(9, "ZZZ", "Crypto")];
        let err =
            apply_rows("sly", rows, &opts(false, true), &mut suffixes, &mut groups).unwrap_err();
        match err {
            ExtractError::UnknownSector { symbol, sector, row } => {
                assert_eq!(symbol, "sly");
                assert_eq!(sector, "Crypto");
                assert_eq!(row, 9);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn learning_records_fund_suffix() {
        let mut suffixes = SectorSuffixes::default();
        let mut groups = Groupings::new();
        apply_rows(
            "xlre",
            vec![row(6, "PLD", "Real Estate")],
            &opts(true, false),
            &mut suffixes,
            &mut groups,
        )
        .unwrap();
        assert_eq!(suffixes.get("Real Estate"), Some("re"));
    }

    #[test]
    fn learning_overwrites_previous_code() {
        let mut suffixes = SectorSuffixes::seeded();
        let mut groups = Groupings::new();
        apply_rows(
            "xlk",
            vec![row(6, "V", "Financials")],
            &opts(true, false),
            &mut suffixes,
            &mut groups,
        )
        .unwrap();
        assert_eq!(suffixes.get("Financials"), Some("k"));
    }

    #[test]
    fn empty_tickers_are_skipped() {
        let mut suffixes = SectorSuffixes::seeded();
        let mut groups = Groupings::new();
        let rows = vec![row(6, "", "Energy"), row(7, "XOM", "Energy")];
        let taken =
            apply_rows("xle", rows, &opts(false, false), &mut suffixes, &mut groups).unwrap();
        assert_eq!(taken, 1);
        assert_eq!(groups.get("xle").unwrap().tickers.len(), 1);
    }

    #[test]
    fn same_ticker_in_two_sectors_lands_in_both() {
        let mut suffixes = SectorSuffixes::seeded();
        let mut groups = Groupings::new();
        let rows = vec![
            row(6, "GOOG", "Communication Services"),
            row(7, "GOOG", "Information Technology"),
        ];
        apply_rows("spyg", rows, &opts(false, true), &mut suffixes, &mut groups).unwrap();
        assert!(groups.get("spygc").unwrap().tickers.contains("GOOG"));
        assert!(groups.get("spygk").unwrap().tickers.contains("GOOG"));
    }

    #[test]
    fn blank_ticker_with_unknown_sector_still_fails() {
        let mut suffixes = SectorSuffixes::seeded();
        let mut groups = Groupings::new();
        let rows = vec![row(6, "XOM", "Energy"), row(7, "", "Crypto")];
        let err =
            apply_rows("mdy", rows, &opts(false, true), &mut suffixes, &mut groups).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::UnknownSector { ref sector, row: 7, .. } if sector == "Crypto"
        ));
    }

    #[test]
    fn shared_key_merges_into_first_owner() {
        let mut groups = Groupings::new();
        assert!(groups.add("mdyve", "mdy", "A"));
        assert!(groups.add("mdyve", "mdyv", "B"));
        assert!(!groups.add("mdyve", "mdyv", "A"));

        let g = groups.get("mdyve").unwrap();
        assert_eq!(g.base_fund, "mdy");
        assert_eq!(
            g.tickers.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["A", "B"]
        );
    }

    #[test]
    fn suffix_code_drops_prefix() {
        let o = opts(true, false);
        assert_eq!(o.suffix_code("xlre"), "re");
        assert_eq!(o.suffix_code("xlk"), "k");
        assert_eq!(o.suffix_code("x"), "");
    }
}
