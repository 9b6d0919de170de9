#![allow(dead_code)]

use rharvest::{CancelToken, FetchError, FinalRecord, ItemKind, ItemRecord, QuerySpec, SourceClient};
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Build a record with the given kind/text, tagged with `query` in r/testsub.
pub fn record(kind: ItemKind, text: &str, query: &str) -> ItemRecord {
    ItemRecord {
        kind,
        title: if kind == ItemKind::Post { text.to_string() } else { "Comment on: parent...".to_string() },
        body: String::new(),
        combined_text: text.to_string(),
        author: "alice".to_string(),
        score: 1,
        reply_count: 0,
        source_url: "https://old.reddit.com/r/testsub/comments/abc/x/".to_string(),
        query: query.to_string(),
        community: "testsub".to_string(),
        collected_at: "2026-01-01T00:00:00Z".to_string(),
    }
}

pub fn post(text: &str, query: &str) -> ItemRecord {
    record(ItemKind::Post, text, query)
}

pub fn reply(text: &str, query: &str) -> ItemRecord {
    record(ItemKind::Reply, text, query)
}

/// `n` distinct posts long enough to survive finalization.
pub fn posts(prefix: &str, n: usize, query: &str) -> Vec<ItemRecord> {
    (0..n).map(|i| post(&format!("{prefix} number {i} is a long enough text body"), query)).collect()
}

pub fn spec(community: &str, query: &str) -> QuerySpec {
    QuerySpec::new(community, query, 100)
}

/// One scripted response per `fetch_items` call.
pub enum Step {
    Items(Vec<ItemRecord>),
    Fail(FetchError),
    /// Cancel the token mid-query, then still hand back partial records.
    CancelWith(Vec<ItemRecord>),
    /// Blow up inside the source call.
    Panic(&'static str),
}

/// Mock source. Optionally records how many rows the checkpoint held at each call.
pub struct ScriptedClient {
    steps: RefCell<VecDeque<Step>>,
    pub calls: RefCell<Vec<String>>,
    probe: Option<PathBuf>,
    pub checkpoint_rows_seen: RefCell<Vec<Option<usize>>>,
}

impl ScriptedClient {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: RefCell::new(steps.into()),
            calls: RefCell::new(Vec::new()),
            probe: None,
            checkpoint_rows_seen: RefCell::new(Vec::new()),
        }
    }

    pub fn probing(mut self, checkpoint: &Path) -> Self {
        self.probe = Some(checkpoint.to_path_buf());
        self
    }
}

impl SourceClient for ScriptedClient {
    fn fetch_items(&self, spec: &QuerySpec, cancel: &CancelToken) -> Result<Vec<ItemRecord>, FetchError> {
        self.calls.borrow_mut().push(format!("{}:{}", spec.community, spec.query_text));
        if let Some(p) = &self.probe {
            let rows = p.exists().then(|| read_rows::<ItemRecord>(p).len());
            self.checkpoint_rows_seen.borrow_mut().push(rows);
        }
        match self.steps.borrow_mut().pop_front() {
            Some(Step::Items(v)) => Ok(v),
            Some(Step::Fail(e)) => Err(e),
            Some(Step::CancelWith(v)) => {
                cancel.cancel();
                Ok(v)
            }
            Some(Step::Panic(msg)) => panic!("{}", msg),
            None => Ok(Vec::new()),
        }
    }
}

/// Deserialize every row of a CSV file.
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    rdr.deserialize().map(|r| r.unwrap()).collect()
}

pub fn read_final(path: &Path) -> Vec<FinalRecord> {
    read_rows(path)
}

/// Write records as a CSV dataset (stand-in for a prior run's output).
pub fn write_dataset(path: &Path, rows: &[ItemRecord]) {
    let mut w = csv::Writer::from_path(path).unwrap();
    for r in rows {
        w.serialize(r).unwrap();
    }
    w.flush().unwrap();
}

/// Files in `dir` whose name starts with `prefix` and ends with `.csv`, sorted.
pub fn outputs_with_prefix(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut v: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            let name = p.file_name().unwrap().to_string_lossy().to_string();
            name.starts_with(prefix) && name.ends_with(".csv") && !name.ends_with("_sample.csv")
        })
        .collect();
    v.sort();
    v
}
