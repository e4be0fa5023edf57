//! The read / write / exists capability the pipeline core is given.

use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;

use crate::csv::{read_csv_table, write_csv_table};
use crate::error::Result;

/// Whole-table storage.
///
/// Implementations may be backed by a local disk, object storage or HDFS;
/// callers only rely on each call succeeding or failing as a unit.
pub trait TableStore {
    /// Read the table at `path`.
    fn read_table(&self, path: &Path) -> Result<DataFrame>;

    /// Write `df` to `path`, replacing anything already there.
    fn write_table(&self, path: &Path, df: &mut DataFrame) -> Result<()>;

    /// Whether a table exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// CSV files on the local filesystem, resolved against a root directory.
#[derive(Debug, Clone, Default)]
pub struct LocalCsvStore {
    root: PathBuf,
}

impl LocalCsvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute paths are used as given; relative paths join onto the root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl TableStore for LocalCsvStore {
    fn read_table(&self, path: &Path) -> Result<DataFrame> {
        read_csv_table(&self.resolve(path))
    }

    fn write_table(&self, path: &Path, df: &mut DataFrame) -> Result<()> {
        write_csv_table(&self.resolve(path), df)
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }
}
