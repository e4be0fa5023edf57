//! The freezing cycle: compute, write for review, read back, apply.

use std::fmt;
use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use tracing::{debug, info, info_span, warn};

use berd_ingest::{IngestError, TableStore};
use berd_model::{FreezingConfig, TemplateVars};

use crate::additions::{apply_additions, get_additions};
use crate::amendments::{apply_amendments, get_amendments};
use crate::error::Result;
use crate::frame::count_accepted;
use crate::split::bring_together_split_cases;

/// Stages of one reconciliation run. A human edits the review files between
/// [`WriteForReview`](Self::WriteForReview) and
/// [`ReadReviewed`](Self::ReadReviewed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileStage {
    ComputeDiff,
    WriteForReview,
    ReadReviewed,
    Apply,
    Done,
}

impl ReconcileStage {
    /// The stage that follows, or `None` once done.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::ComputeDiff => Some(Self::WriteForReview),
            Self::WriteForReview => Some(Self::ReadReviewed),
            Self::ReadReviewed => Some(Self::Apply),
            Self::Apply => Some(Self::Done),
            Self::Done => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ComputeDiff => "compute_diff",
            Self::WriteForReview => "write_for_review",
            Self::ReadReviewed => "read_reviewed",
            Self::Apply => "apply",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for ReconcileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the review files of one run live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPaths {
    pub amendments: PathBuf,
    pub additions: PathBuf,
}

impl ReviewPaths {
    /// Render the configured file name templates under `dir`.
    pub fn from_config(dir: &Path, config: &FreezingConfig, vars: &TemplateVars) -> Result<Self> {
        Ok(Self {
            amendments: dir.join(config.amendments_file(vars)?),
            additions: dir.join(config.additions_file(vars)?),
        })
    }
}

/// Counts from the compute and write stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewOutcome {
    /// Updated records matched in the baseline with no tracked change.
    pub unchanged: usize,
    /// Amendment rows written, split cases included.
    pub amendments: usize,
    /// Addition rows written.
    pub additions: usize,
    pub split_cases: usize,
    pub written: Vec<PathBuf>,
    /// Review files left by an earlier run that this run did not overwrite.
    pub stale: Vec<PathBuf>,
}

/// Result of reading a review file back.
#[derive(Debug, Clone)]
pub enum ReviewFile {
    /// No file: nothing was produced or it was removed.
    Missing,
    /// File present with no rows.
    Empty,
    /// File present but not parseable as a table.
    Unreadable { message: String },
    Loaded(DataFrame),
}

impl ReviewFile {
    pub fn into_table(self) -> Option<DataFrame> {
        match self {
            Self::Loaded(df) => Some(df),
            _ => None,
        }
    }
}

/// Counts and the final table from the read and apply stages.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub data: DataFrame,
    pub amendments_accepted: usize,
    pub additions_accepted: usize,
}

fn enter(stage: ReconcileStage) {
    debug!(%stage, "entering stage");
}

/// Compute amendments and additions and write them out for review.
///
/// Split cases are merged into the amendments first. Only non-empty review
/// sets are written. An existing file for an empty set is left in place and
/// reported in [`ReviewOutcome::stale`] with a warning: [`apply_review`]
/// still reads it.
pub fn prepare_review<S: TableStore>(
    store: &S,
    baseline: &DataFrame,
    updated: &DataFrame,
    config: &FreezingConfig,
    paths: &ReviewPaths,
) -> Result<ReviewOutcome> {
    let span = info_span!("prepare_review");
    let _guard = span.enter();

    enter(ReconcileStage::ComputeDiff);
    let amendments = get_amendments(baseline, updated, config)?;
    let additions = get_additions(baseline, updated, config)?;
    let amended_rows = amendments.as_ref().map_or(0, DataFrame::height);
    let added_rows = additions.as_ref().map_or(0, DataFrame::height);
    let unchanged = updated.height() - amended_rows - added_rows;

    let (additions, amendments, split_cases) = match (additions, amendments) {
        (Some(additions), Some(amendments)) => {
            let before = additions.height();
            let (remaining, merged) = bring_together_split_cases(&additions, &amendments, config)?;
            let moved = before - remaining.as_ref().map_or(0, DataFrame::height);
            (remaining, Some(merged), moved)
        }
        (additions, amendments) => (additions, amendments, 0),
    };

    enter(ReconcileStage::WriteForReview);
    let mut outcome = ReviewOutcome {
        unchanged,
        split_cases,
        ..ReviewOutcome::default()
    };
    match amendments {
        Some(mut df) => {
            store.write_table(&paths.amendments, &mut df)?;
            info!(path = %paths.amendments.display(), rows = df.height(), "amendments written for review");
            outcome.amendments = df.height();
            outcome.written.push(paths.amendments.clone());
        }
        None => note_stale(store, &paths.amendments, &mut outcome),
    }
    match additions {
        Some(mut df) => {
            store.write_table(&paths.additions, &mut df)?;
            info!(path = %paths.additions.display(), rows = df.height(), "additions written for review");
            outcome.additions = df.height();
            outcome.written.push(paths.additions.clone());
        }
        None => note_stale(store, &paths.additions, &mut outcome),
    }
    if outcome.written.is_empty() {
        info!("snapshots agree; nothing to review");
    }
    Ok(outcome)
}

fn note_stale<S: TableStore>(store: &S, path: &Path, outcome: &mut ReviewOutcome) {
    if store.exists(path) {
        warn!(
            path = %path.display(),
            "review file from an earlier run kept; it will be applied unless removed"
        );
        outcome.stale.push(path.to_path_buf());
    }
}

/// Read a reviewed file, classifying the expected ways it can be absent.
///
/// Any other storage failure is returned as an error.
pub fn read_review_file<S: TableStore>(store: &S, path: &Path) -> Result<ReviewFile> {
    if !store.exists(path) {
        info!(path = %path.display(), "no review file; nothing to apply");
        return Ok(ReviewFile::Missing);
    }
    match store.read_table(path) {
        Ok(df) if df.height() == 0 => {
            warn!(path = %path.display(), "review file has no rows; nothing to apply");
            Ok(ReviewFile::Empty)
        }
        Ok(df) => Ok(ReviewFile::Loaded(df)),
        Err(err) if err.is_empty_file() => {
            warn!(path = %path.display(), "review file is empty; nothing to apply");
            Ok(ReviewFile::Empty)
        }
        Err(IngestError::CsvParse { message, .. }) => {
            warn!(path = %path.display(), %message, "review file unreadable; nothing to apply");
            Ok(ReviewFile::Unreadable { message })
        }
        Err(err) => Err(err.into()),
    }
}

/// Read both review files back and apply the accepted rows to `baseline`.
///
/// Amendments are applied before additions are appended.
pub fn apply_review<S: TableStore>(
    store: &S,
    baseline: &DataFrame,
    config: &FreezingConfig,
    paths: &ReviewPaths,
) -> Result<ApplyOutcome> {
    let span = info_span!("apply_review", baseline_rows = baseline.height());
    let _guard = span.enter();

    enter(ReconcileStage::ReadReviewed);
    let amendments = read_review_file(store, &paths.amendments)?.into_table();
    let additions = read_review_file(store, &paths.additions)?.into_table();

    enter(ReconcileStage::Apply);
    let mut outcome = ApplyOutcome {
        data: baseline.clone(),
        amendments_accepted: 0,
        additions_accepted: 0,
    };
    if let Some(amendments) = amendments {
        outcome.amendments_accepted = count_accepted(&amendments)?;
        outcome.data = apply_amendments(&outcome.data, &amendments, config)?;
    }
    if let Some(additions) = additions {
        outcome.additions_accepted = count_accepted(&additions)?;
        outcome.data = apply_additions(&outcome.data, &additions, config)?;
    }

    enter(ReconcileStage::Done);
    info!(
        amendments_accepted = outcome.amendments_accepted,
        additions_accepted = outcome.additions_accepted,
        rows = outcome.data.height(),
        "review applied"
    );
    Ok(outcome)
}
