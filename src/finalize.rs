//! Terminal pass: dedup, length filter, derived columns, and persistence.

use crate::config::HarvestOptions;
use crate::record::{FinalRecord, ItemKind, ItemRecord};
use crate::table::{write_table_atomic, TableWriter};
use crate::util::remove_with_backoff;
use ahash::AHashSet;
use anyhow::{Context, Result};
use regex::Regex;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;
use time::macros::format_description;
use time::OffsetDateTime;

/// Rows below this many characters are dropped.
pub const MIN_TEXT_CHARS: usize = 30;

/// Substrings that flag a possible metaphor. Heuristic only; "is a" alone matches
/// most descriptive sentences.
pub const METAPHOR_KEYWORDS: [&str; 8] = ["like", "seems", "feels", "acts", "is a", "become", "as if", "reminds"];

fn metaphor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alts: Vec<String> = METAPHOR_KEYWORDS.iter().map(|k| regex::escape(k)).collect();
        // keyword list is static; a compile failure is a programming error
        Regex::new(&format!("(?i){}", alts.join("|"))).expect("metaphor keyword regex")
    })
}

pub fn has_metaphor_signal(text: &str) -> bool {
    metaphor_re().is_match(text)
}

/// Counts from the dedup/filter stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub raw: usize,
    pub duplicates_removed: usize,
    pub short_removed: usize,
}

/// Pure dedup → filter → derive. First occurrence of each `combined_text` wins and
/// survivors keep their input order.
pub fn finalize(records: &[ItemRecord]) -> Vec<FinalRecord> {
    finalize_with_stats(records).0
}

pub fn finalize_with_stats(records: &[ItemRecord]) -> (Vec<FinalRecord>, FilterStats) {
    let mut seen: AHashSet<&str> = AHashSet::with_capacity(records.len());
    let mut stats = FilterStats { raw: records.len(), ..Default::default() };
    let mut out = Vec::with_capacity(records.len());

    for rec in records {
        if !seen.insert(rec.combined_text.as_str()) {
            stats.duplicates_removed += 1;
            continue;
        }
        if rec.text_len() < MIN_TEXT_CHARS {
            stats.short_removed += 1;
            continue;
        }
        let flag = has_metaphor_signal(&rec.combined_text);
        out.push(FinalRecord::from_record(rec.clone(), flag));
    }
    (out, stats)
}

/// What the terminal pass wrote.
#[derive(Clone, Debug)]
pub struct FinalizeReport {
    pub path: PathBuf,
    pub sample_path: PathBuf,
    pub stats: FilterStats,
    pub total: usize,
    pub posts: usize,
    pub replies: usize,
    pub communities: usize,
    pub queries: usize,
    pub metaphor_signals: usize,
}

impl FinalizeReport {
    fn describe(&mut self, rows: &[FinalRecord]) {
        self.total = rows.len();
        self.posts = rows.iter().filter(|r| r.kind == ItemKind::Post).count();
        self.replies = rows.iter().filter(|r| r.kind == ItemKind::Reply).count();
        self.communities = rows.iter().map(|r| r.community.as_str()).collect::<AHashSet<_>>().len();
        self.queries = rows.iter().map(|r| r.query.as_str()).collect::<AHashSet<_>>().len();
        self.metaphor_signals = rows.iter().filter(|r| r.has_metaphor_signal).count();
    }
}

/// Run the terminal pass over the accumulator and persist it.
///
/// Empty input (or input that filters down to nothing) is not an error: `Ok(None)`
/// and no dataset is written. Any checkpoint is still removed so the next run does
/// not pick the same rows up again.
pub fn finalize_and_persist(records: &[ItemRecord], opts: &HarvestOptions) -> Result<Option<FinalizeReport>> {
    if records.is_empty() {
        tracing::warn!("no data collected; nothing to finalize");
        return Ok(None);
    }
    let (rows, stats) = finalize_with_stats(records);
    tracing::info!(
        raw = stats.raw,
        duplicates = stats.duplicates_removed,
        short = stats.short_removed,
        kept = rows.len(),
        "finalized dataset"
    );
    if rows.is_empty() {
        tracing::warn!("every record was filtered out; nothing to write");
        remove_with_backoff(&opts.checkpoint_path())?;
        return Ok(None);
    }
    persist_dataset(&rows, stats, opts).map(Some)
}

/// Write the timestamped dataset and the head sample, then drop the checkpoint.
pub fn persist_dataset(rows: &[FinalRecord], stats: FilterStats, opts: &HarvestOptions) -> Result<FinalizeReport> {
    std::fs::create_dir_all(&opts.output_dir)
        .with_context(|| format!("create {}", opts.output_dir.display()))?;

    let (path, mut w) = create_timestamped(opts)?;
    w.write_all(rows)?;
    w.finish()?;

    let sample_path = opts.sample_path();
    write_table_atomic(&sample_path, rows.iter().take(opts.sample_rows))?;

    remove_with_backoff(&opts.checkpoint_path())?;

    let mut report = FinalizeReport {
        path,
        sample_path,
        stats,
        total: 0,
        posts: 0,
        replies: 0,
        communities: 0,
        queries: 0,
        metaphor_signals: 0,
    };
    report.describe(rows);
    tracing::info!(
        path = %report.path.display(),
        total = report.total,
        posts = report.posts,
        replies = report.replies,
        communities = report.communities,
        queries = report.queries,
        metaphor_signals = report.metaphor_signals,
        "final data saved"
    );
    Ok(report)
}

/// `{prefix}_{YYYYMMDD_HHMMSS}.csv` stamped in UTC, with `_N` appended if that name is taken.
fn create_timestamped(opts: &HarvestOptions) -> Result<(PathBuf, TableWriter)> {
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    let stamp = OffsetDateTime::now_utc().format(&fmt).context("format timestamp")?;
    let base = format!("{}_{}", opts.output_prefix, stamp);

    for n in 0u32.. {
        let name = if n == 0 { format!("{}.csv", base) } else { format!("{}_{}.csv", base, n) };
        let path = opts.output_dir.join(name);
        match TableWriter::create_new(&path) {
            Ok(w) => return Ok((path, w)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e).with_context(|| format!("create {}", path.display())),
        }
    }
    unreachable!("u32 range exhausted while picking an output name")
}
