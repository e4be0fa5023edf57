//! Snapshot reconciliation ("freezing").
//!
//! A frozen baseline snapshot is compared against an updated snapshot on the
//! key columns. Changed records become amendments, unseen records become
//! additions, and both are written out for review. Reviewers set
//! `accept_changes` on the rows they approve; only those rows are applied
//! back onto the baseline.
//!
//! - **amendments**: diffing matched records and applying accepted changes
//! - **additions**: detecting new records and appending accepted ones
//! - **split**: keeping additions and amendments disjoint on key
//! - **workflow**: the compute / review / apply cycle over a [`TableStore`]
//!
//! [`TableStore`]: berd_ingest::TableStore

pub mod additions;
pub mod amendments;
pub mod error;
mod frame;
pub mod split;
pub mod workflow;

pub use additions::{apply_additions, get_additions};
pub use amendments::{apply_amendments, get_amendments};
pub use error::{FreezingError, Result};
pub use frame::count_accepted;
pub use split::bring_together_split_cases;
pub use workflow::{
    ApplyOutcome, ReconcileStage, ReviewFile, ReviewOutcome, ReviewPaths, apply_review,
    prepare_review, read_review_file,
};
