//! Resume loader: seed the accumulator from a prior (partial or final) dataset.

use crate::error::ResumeError;
use crate::record::ItemRecord;
use std::io;
use std::path::Path;

/// Load a prior dataset. `Ok(None)` when nothing exists at `path`.
///
/// Extra columns (e.g. `text_length` from a finalized file) are ignored. Any row that
/// does not parse makes the whole load fail: resuming from a partial read would
/// silently drop prior work.
pub fn load(path: &Path) -> Result<Option<Vec<ItemRecord>>, ResumeError> {
    let mut rdr = match csv::ReaderBuilder::new().has_headers(true).from_path(path) {
        Ok(r) => r,
        Err(e) => {
            return match e.into_kind() {
                csv::ErrorKind::Io(io) if io.kind() == io::ErrorKind::NotFound => Ok(None),
                csv::ErrorKind::Io(io) => Err(ResumeError::Io { path: path.to_path_buf(), source: io }),
                other => Err(ResumeError::Corrupt {
                    path: path.to_path_buf(),
                    line: 1,
                    message: format!("{:?}", other),
                }),
            };
        }
    };

    let mut out = Vec::new();
    for row in rdr.deserialize::<ItemRecord>() {
        let rec = row.map_err(|e| ResumeError::Corrupt {
            path: path.to_path_buf(),
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        out.push(rec);
    }

    tracing::info!(path = %path.display(), rows = out.len(), "loaded prior dataset");
    Ok(Some(out))
}
