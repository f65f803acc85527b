//! Watchlist run orchestration.
//!
//! Setup, then for each batch in order: fetch every fund into the scratch
//! file, fold its rows into groupings, and write the batch's watchlists. The
//! suffix table flows from batch to batch, so the sector funds must run
//! before any batch that splits by sector. The first error ends the run;
//! files already written stay on disk, and the scratch file is removed on
//! drop either way.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, info_span};

use crate::config::{ConfigError, FundBatch, WatchlistConfig};
use crate::emit::{write_watchlists, Destination, EmitError};
use crate::environment::{EnvError, Environment, ScratchFile};
use crate::grouping::{apply_rows, ExtractError, ExtractOptions, Groupings};
use crate::holdings::{FetchProgress, HoldingsSheet, HoldingsSource, SheetLayout};
use crate::sectors::SectorSuffixes;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("setup failed: {0}")]
    Env(#[from] EnvError),

    #[error("batch '{batch}': {source}")]
    Extract {
        batch: String,
        #[source]
        source: ExtractError,
    },

    #[error("batch '{batch}': {source}")]
    Emit {
        batch: String,
        #[source]
        source: EmitError,
    },
}

/// Result of extracting one batch.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub groups: Groupings,
    /// The suffix table after this batch, including anything it learned.
    pub suffixes: SectorSuffixes,
    pub holdings: usize,
}

/// What one batch produced.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub name: String,
    pub funds: usize,
    pub holdings: usize,
    pub files: Vec<PathBuf>,
}

/// What a whole run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_root: PathBuf,
    pub batches: Vec<BatchReport>,
    pub suffixes: SectorSuffixes,
}

impl RunSummary {
    pub fn files_written(&self) -> usize {
        self.batches.iter().map(|b| b.files.len()).sum()
    }
}

/// Fetch and group every fund of one batch.
///
/// `suffixes` is the table as of the start of the batch; the returned
/// `Extraction` carries the table the next batch should use.
pub fn extract_batch(
    source: &dyn HoldingsSource,
    batch: &FundBatch,
    opts: &ExtractOptions,
    layout: &SheetLayout,
    suffixes: &SectorSuffixes,
    scratch: &mut ScratchFile,
    progress: &dyn FetchProgress,
) -> Result<Extraction, ExtractError> {
    let mut table = suffixes.clone();
    let mut groups = Groupings::new();
    let mut holdings = 0;
    let total = batch.funds.len();

    for (i, symbol) in batch.funds.iter().enumerate() {
        progress.on_start(&batch.name, symbol, i, total);

        let fetched = source.fetch(symbol)?;
        scratch.overwrite(&fetched.bytes)?;

        let sheet =
            HoldingsSheet::open(scratch.path(), layout).map_err(|source| ExtractError::Sheet {
                symbol: symbol.clone(),
                url: fetched.url.clone(),
                source,
            })?;
        let taken = apply_rows(symbol, sheet.rows(), opts, &mut table, &mut groups)?;

        progress.on_extracted(symbol, taken);
        holdings += taken;
    }

    Ok(Extraction {
        groups,
        suffixes: table,
        holdings,
    })
}

/// Run one batch end to end against an already prepared output root.
pub fn run_batch(
    source: &dyn HoldingsSource,
    config: &WatchlistConfig,
    batch: &FundBatch,
    output_root: &Path,
    suffixes: &SectorSuffixes,
    scratch: &mut ScratchFile,
    progress: &dyn FetchProgress,
) -> Result<(BatchReport, SectorSuffixes), PipelineError> {
    let _span = info_span!("batch", name = %batch.name).entered();
    let layout = SheetLayout::from_config(config)?;
    let opts = ExtractOptions::for_batch(batch, config);

    let extraction = extract_batch(source, batch, &opts, &layout, suffixes, scratch, progress)
        .map_err(|source| PipelineError::Extract {
            batch: batch.name.clone(),
            source,
        })?;

    let dest = Destination::for_batch(batch.subdir.as_deref(), batch.split_sectors);
    let files = write_watchlists(&extraction.groups, output_root, dest).map_err(|source| {
        PipelineError::Emit {
            batch: batch.name.clone(),
            source,
        }
    })?;
    progress.on_batch_complete(&batch.name, files.len());
    debug!(funds = batch.funds.len(), files = files.len(), "batch complete");

    let report = BatchReport {
        name: batch.name.clone(),
        funds: batch.funds.len(),
        holdings: extraction.holdings,
        files,
    };
    Ok((report, extraction.suffixes))
}

/// Run every configured batch in order.
///
/// `only`, when non-empty, restricts the run to batches with those names.
/// A skipped batch learns nothing, so skipping the sector batch leaves a
/// split batch on the seed suffix table.
pub fn run(
    source: &dyn HoldingsSource,
    config: &WatchlistConfig,
    only: &[String],
    progress: &dyn FetchProgress,
) -> Result<RunSummary, PipelineError> {
    config.validate()?;
    let env = Environment::prepare(config)?;
    run_in(source, config, env.output_root(), only, progress)
}

/// Like [`run`], but against an explicit output root that already exists.
pub fn run_in(
    source: &dyn HoldingsSource,
    config: &WatchlistConfig,
    output_root: &Path,
    only: &[String],
    progress: &dyn FetchProgress,
) -> Result<RunSummary, PipelineError> {
    let mut scratch = ScratchFile::create(&config.extension)?;
    let mut suffixes = SectorSuffixes::new(config.sector_suffixes.clone());
    let mut batches = Vec::new();

    info!(
        source = source.name(),
        output_root = %output_root.display(),
        "starting watchlist run"
    );

    for batch in &config.batches {
        if !only.is_empty() && !only.iter().any(|n| n == &batch.name) {
            continue;
        }
        let (report, next) = run_batch(
            source,
            config,
            batch,
            output_root,
            &suffixes,
            &mut scratch,
            progress,
        )?;
        suffixes = next;
        batches.push(report);
    }

    Ok(RunSummary {
        output_root: output_root.to_path_buf(),
        batches,
        suffixes,
    })
}
