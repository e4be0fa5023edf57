//! Command implementations behind the `berd` subcommands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use polars::prelude::DataFrame;
use tracing::{info, info_span};

use berd_freezing::{
    ApplyOutcome, ReviewOutcome, ReviewPaths, apply_review, prepare_review,
};
use berd_ingest::{LocalCsvStore, TableStore};
use berd_model::{OUTLIER, PipelineConfig, TemplateVars};
use berd_outliers::{ColumnSummary, combine_outlier_flags, flag_outliers};

use crate::cli::{ApplyArgs, OutliersArgs, ReviewArgs, RunArgs};

/// Result of `berd outliers`.
#[derive(Debug)]
pub struct OutliersResult {
    pub output: PathBuf,
    pub rows: usize,
    pub outliers: usize,
    pub columns: Vec<ColumnSummary>,
}

/// Result of `berd freeze review`.
#[derive(Debug)]
pub struct ReviewResult {
    pub paths: ReviewPaths,
    pub outcome: ReviewOutcome,
}

/// Result of `berd freeze apply`.
#[derive(Debug)]
pub struct ApplyResult {
    pub output: PathBuf,
    pub baseline_rows: usize,
    pub outcome: ApplyOutcome,
}

fn load_config(path: &Path) -> Result<PipelineConfig> {
    PipelineConfig::load(path).with_context(|| format!("load config {}", path.display()))
}

fn read_table(store: &LocalCsvStore, path: &Path) -> Result<DataFrame> {
    store
        .read_table(path)
        .with_context(|| format!("read {}", path.display()))
}

fn write_table(store: &LocalCsvStore, path: &Path, df: &mut DataFrame) -> Result<()> {
    store
        .write_table(path, df)
        .with_context(|| format!("write {}", path.display()))
}

/// `<dir>/<stem>_<suffix>.csv` beside `input`.
fn sibling_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    input.with_file_name(format!("{stem}_{suffix}.csv"))
}

fn template_vars(run: &RunArgs) -> TemplateVars {
    TemplateVars {
        date: run
            .date
            .clone()
            .unwrap_or_else(|| Local::now().format("%y-%m-%d").to_string()),
        run_id: run.run_id,
    }
}

fn review_paths(run: &RunArgs, config: &PipelineConfig) -> Result<ReviewPaths> {
    ReviewPaths::from_config(&run.review_dir, &config.freezing, &template_vars(run))
        .context("render review file names")
}

pub fn run_outliers(args: &OutliersArgs) -> Result<OutliersResult> {
    let span = info_span!("outliers", input = %args.input.display());
    let _guard = span.enter();

    let config = load_config(&args.config)?;
    let store = LocalCsvStore::default();
    let input = read_table(&store, &args.input)?;

    let flagged = flag_outliers(&input, &config.outliers, &config.columns)
        .context("flag outliers")?;
    let mut data = combine_outlier_flags(&flagged.data, config.outliers.manual_policy)
        .context("combine outlier flags")?;
    let outliers = data
        .column(OUTLIER)
        .and_then(|column| column.bool().cloned())
        .context("outlier column")?
        .into_iter()
        .filter(|flag| *flag == Some(true))
        .count();

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| sibling_output(&args.input, "outliers"));
    write_table(&store, &output, &mut data)?;
    info!(output = %output.display(), rows = data.height(), outliers, "flagged table written");

    Ok(OutliersResult {
        output,
        rows: data.height(),
        outliers,
        columns: flagged.summaries,
    })
}

pub fn run_freeze_review(args: &ReviewArgs) -> Result<ReviewResult> {
    let span = info_span!("freeze_review", baseline = %args.baseline.display());
    let _guard = span.enter();

    let config = load_config(&args.run.config)?;
    let store = LocalCsvStore::default();
    let baseline = read_table(&store, &args.baseline)?;
    let updated = read_table(&store, &args.updated)?;
    let paths = review_paths(&args.run, &config)?;

    let outcome = prepare_review(&store, &baseline, &updated, &config.freezing, &paths)
        .context("prepare review files")?;
    Ok(ReviewResult { paths, outcome })
}

pub fn run_freeze_apply(args: &ApplyArgs) -> Result<ApplyResult> {
    let span = info_span!("freeze_apply", baseline = %args.baseline.display());
    let _guard = span.enter();

    let config = load_config(&args.run.config)?;
    let store = LocalCsvStore::default();
    let baseline = read_table(&store, &args.baseline)?;
    let paths = review_paths(&args.run, &config)?;

    let mut outcome =
        apply_review(&store, &baseline, &config.freezing, &paths).context("apply review")?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| sibling_output(&args.baseline, "frozen"));
    write_table(&store, &output, &mut outcome.data)?;
    info!(output = %output.display(), rows = outcome.data.height(), "frozen snapshot written");

    Ok(ApplyResult {
        output,
        baseline_rows: baseline.height(),
        outcome,
    })
}
