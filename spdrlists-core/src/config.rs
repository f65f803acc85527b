//! Run configuration: fund batches, spreadsheet layout, output layout.
//!
//! Every field defaults to the values State Street and TWS expect, so a run
//! with no config file behaves exactly like the built-in one. A TOML file can
//! override any subset of fields.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Download location for the daily holdings spreadsheets.
pub const SSGA_BASE_URL: &str =
    "https://www.ssga.com/library-content/products/fund-data/etfs/us/holdings-daily-us-en-";

/// Select Sector SPDR ETFs.
pub const SELECT_SECTOR_SPDRS: &[&str] = &[
    "xlb", "xlc", "xle", "xlf", "xli", "xlk", "xlp", "xlre", "xlu", "xlv", "xly",
];

/// SPDR Industry Group ETFs.
pub const INDUSTRY_GROUP_ETFS: &[&str] = &[
    "kbe", "kre", "kie", "xar", "xtn", "xbi", "xph", "xhe", "xhs", "xop", "xes", "xme", "xrt",
    "xhb", "xsd", "xsw", "xntk", "xitk", "xtl", "xweb",
];

/// Broad funds that get split into simulated per-sector watchlists.
pub const SIMULATED_SOURCE_ETFS: &[&str] =
    &["mdy", "mdyg", "mdyv", "sly", "slyg", "slyv", "spyg", "spyv"];

/// Generic sector designations used by the Select Sector SPDRs.
pub const DEFAULT_SECTOR_SUFFIXES: &[(&str, &str)] = &[
    ("Materials", "b"),
    ("Communication Services", "c"),
    ("Energy", "e"),
    ("Financials", "f"),
    ("Industrials", "i"),
    ("Information Technology", "k"),
    ("Consumer Staples", "p"),
    ("Real Estate", "re"),
    ("Utilities", "u"),
    ("Health Care", "v"),
    ("Consumer Discretionary", "y"),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One group of funds processed together and emitted together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundBatch {
    pub name: String,
    pub funds: Vec<String>,
    /// Fixed subdirectory of the output root for every file in the batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdir: Option<String>,
    /// Record each observed sector under the fund's suffix code.
    #[serde(default)]
    pub learn_suffixes: bool,
    /// Emit one watchlist per (fund, sector suffix) instead of one per fund.
    #[serde(default)]
    pub split_sectors: bool,
}

impl FundBatch {
    fn from_symbols(name: &str, symbols: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            funds: symbols.iter().map(|s| s.to_string()).collect(),
            subdir: None,
            learn_suffixes: false,
            split_sectors: false,
        }
    }

    /// The three batches of a standard run, in the order they must execute:
    /// the sector funds seed the suffix table the simulated batch relies on.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                learn_suffixes: true,
                ..Self::from_symbols("select-sector", SELECT_SECTOR_SPDRS)
            },
            Self {
                subdir: Some("spy".into()),
                ..Self::from_symbols("industry-group", INDUSTRY_GROUP_ETFS)
            },
            Self {
                split_sectors: true,
                ..Self::from_symbols("simulated", SIMULATED_SOURCE_ETFS)
            },
        ]
    }
}

/// Complete configuration for a watchlist run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistConfig {
    /// Overrides the platform base directory (drive root or home directory).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    /// TWS settings directory under the base directory.
    pub tws_dir: String,
    /// Watchlist directory under the TWS directory. Empty writes straight into it.
    pub watchlists: String,
    pub base_url: String,
    pub extension: String,
    pub worksheet: String,
    /// 1-based spreadsheet row of the first holding.
    pub first_row: u32,
    pub ticker_column: String,
    pub sector_column: String,
    /// Sector value marking the end of the holdings rows.
    pub sentinel_sector: String,
    /// Characters of a fund symbol skipped to form its sector suffix (`xlre` -> `re`).
    pub suffix_prefix_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    pub user_agent: String,
    pub sector_suffixes: BTreeMap<String, String>,
    pub batches: Vec<FundBatch>,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            tws_dir: "Jts".into(),
            watchlists: "watchlists".into(),
            base_url: SSGA_BASE_URL.into(),
            extension: ".xlsx".into(),
            worksheet: "holdings".into(),
            first_row: 6,
            ticker_column: "B".into(),
            sector_column: "F".into(),
            sentinel_sector: "Unassigned".into(),
            suffix_prefix_len: 2,
            request_timeout_secs: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            sector_suffixes: DEFAULT_SECTOR_SUFFIXES
                .iter()
                .map(|(sector, code)| (sector.to_string(), code.to_string()))
                .collect(),
            batches: FundBatch::defaults(),
        }
    }
}

impl WatchlistConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_row == 0 {
            return Err(ConfigError::Invalid("first_row is 1-based and must be > 0".into()));
        }
        if self.tws_dir.is_empty() {
            return Err(ConfigError::Invalid("tws_dir must not be empty".into()));
        }
        self.ticker_index()?;
        self.sector_index()?;
        for batch in &self.batches {
            if batch.funds.iter().any(|f| f.is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "batch '{}' contains an empty fund symbol",
                    batch.name
                )));
            }
        }
        Ok(())
    }

    /// Zero-based column index of the ticker column.
    pub fn ticker_index(&self) -> Result<u32, ConfigError> {
        column_index(&self.ticker_column)
    }

    /// Zero-based column index of the sector column.
    pub fn sector_index(&self) -> Result<u32, ConfigError> {
        column_index(&self.sector_column)
    }

    /// Holdings spreadsheet URL for one fund.
    pub fn holdings_url(&self, symbol: &str) -> String {
        format!("{}{symbol}{}", self.base_url, self.extension)
    }
}

/// Convert a spreadsheet column name (`A`, `F`, `AB`) to a zero-based index.
pub fn column_index(column: &str) -> Result<u32, ConfigError> {
    if column.is_empty() {
        return Err(ConfigError::Invalid("empty column name".into()));
    }
    let mut index: u32 = 0;
    for c in column.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(ConfigError::Invalid(format!("bad column name '{column}'")));
        }
        let digit = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        index = index
            .checked_mul(26)
            .and_then(|i| i.checked_add(digit))
            .ok_or_else(|| ConfigError::Invalid(format!("column '{column}' out of range")))?;
    }
    Ok(index - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standard_run() {
        let cfg = WatchlistConfig::default();
        assert_eq!(cfg.batches.len(), 3);
        assert!(cfg.batches[0].learn_suffixes);
        assert_eq!(cfg.batches[1].subdir.as_deref(), Some("spy"));
        assert!(cfg.batches[2].split_sectors);
        assert_eq!(cfg.sector_suffixes["Real Estate"], "re");
        assert_eq!(cfg.sector_suffixes.len(), 11);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn holdings_url_substitutes_symbol() {
        let cfg = WatchlistConfig::default();
        assert_eq!(
            cfg.holdings_url("xlk"),
            "https://www.ssga.com/library-content/products/fund-data/etfs/us/holdings-daily-us-en-xlk.xlsx"
        );
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_index("A").unwrap(), 0);
        assert_eq!(column_index("B").unwrap(), 1);
        assert_eq!(column_index("f").unwrap(), 5);
        assert_eq!(column_index("Z").unwrap(), 25);
        assert_eq!(column_index("AA").unwrap(), 26);
        assert!(column_index("").is_err());
        assert!(column_index("B2").is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = WatchlistConfig::from_toml("watchlists = \"\"\nfirst_row = 7\n").unwrap();
        assert_eq!(cfg.watchlists, "");
        assert_eq!(cfg.first_row, 7);
        assert_eq!(cfg.worksheet, "holdings");
        assert_eq!(cfg.batches.len(), 3);
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = WatchlistConfig::default();
        let text = cfg.to_toml().unwrap();
        let parsed = WatchlistConfig::from_toml(&text).unwrap();
        assert_eq!(cfg, parsed);
    }

    #[test]
    fn zero_first_row_rejected() {
        let err = WatchlistConfig::from_toml("first_row = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn custom_batches_parse() {
        let cfg = WatchlistConfig::from_toml(
            r#"
[[batches]]
name = "tech"
funds = ["xlk"]
learn_suffixes = true
"#,
        )
        .unwrap();
        assert_eq!(cfg.batches.len(), 1);
        assert_eq!(cfg.batches[0].funds, vec!["xlk".to_string()]);
        assert!(!cfg.batches[0].split_sectors);
        assert!(cfg.batches[0].subdir.is_none());
    }
}
