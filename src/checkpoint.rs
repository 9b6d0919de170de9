use crate::record::ItemRecord;
use crate::table::write_table_atomic;
use crate::util::remove_with_backoff;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Single well-known snapshot of everything collected so far, overwritten in place.
#[derive(Clone, Debug)]
pub struct Checkpointer {
    path: PathBuf,
}

impl Checkpointer {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the full accumulator. An empty accumulator leaves the file untouched.
    pub fn save(&self, records: &[ItemRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let n = write_table_atomic(&self.path, records)?;
        tracing::debug!(path = %self.path.display(), rows = n, "checkpoint written");
        Ok(n)
    }

    pub fn clear(&self) -> Result<()> {
        remove_with_backoff(&self.path)
    }
}
