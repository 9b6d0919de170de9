//! CSV table writers: plain, create-new, and temp-then-rename.

use crate::util::{create_new_with_backoff, create_with_backoff, replace_file_atomic_backoff};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const WRITE_BUF: usize = 256 * 1024;

/// Buffered CSV writer; header row comes from the first serialized struct.
pub struct TableWriter {
    path: PathBuf,
    w: csv::Writer<BufWriter<File>>,
    rows: usize,
}

impl TableWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let f = create_with_backoff(path).with_context(|| format!("create {}", path.display()))?;
        Ok(Self::from_file(path, f))
    }

    /// Fails if `path` already exists.
    pub fn create_new(path: &Path) -> std::io::Result<Self> {
        let f = create_new_with_backoff(path)?;
        Ok(Self::from_file(path, f))
    }

    fn from_file(path: &Path, f: File) -> Self {
        let w = csv::Writer::from_writer(BufWriter::with_capacity(WRITE_BUF, f));
        Self { path: path.to_path_buf(), w, rows: 0 }
    }

    pub fn write_row<T: Serialize>(&mut self, row: &T) -> Result<()> {
        self.w
            .serialize(row)
            .with_context(|| format!("write row {} to {}", self.rows + 1, self.path.display()))?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_all<'a, T: Serialize + 'a>(&mut self, rows: impl IntoIterator<Item = &'a T>) -> Result<()> {
        for r in rows {
            self.write_row(r)?;
        }
        Ok(())
    }

    /// Flush and fsync. Returns rows written.
    pub fn finish(mut self) -> Result<usize> {
        self.w.flush().with_context(|| format!("flush {}", self.path.display()))?;
        let inner = self
            .w
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flush {}: {}", self.path.display(), e.error()))?;
        let f = inner
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flush {}: {}", self.path.display(), e.error()))?;
        f.sync_all().with_context(|| format!("sync {}", self.path.display()))?;
        Ok(self.rows)
    }

    /// Flush and atomically promote the temp file to `final_path`.
    pub fn finish_atomic(self, final_path: &Path) -> Result<usize> {
        let tmp = self.path.clone();
        let rows = self.finish()?;
        replace_file_atomic_backoff(&tmp, final_path)?;
        Ok(rows)
    }
}

/// Temp sibling used while a table is being rewritten.
pub fn inprogress_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".inprogress");
    path.with_file_name(name)
}

/// Overwrite `path` with `rows` without ever exposing a half-written file.
pub fn write_table_atomic<'a, T: Serialize + 'a>(path: &Path, rows: impl IntoIterator<Item = &'a T>) -> Result<usize> {
    let tmp = inprogress_path(path);
    let mut w = TableWriter::create(&tmp)?;
    w.write_all(rows)?;
    w.finish_atomic(path)
}
