//! Query specification (one unit of harvest work) and the built-in query plans.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Upstream search returns at most one page of this many items.
pub const MAX_PAGE_SIZE: u32 = 100;

/// One configured (community, search text, target count) unit of work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub community: String,
    pub query_text: String,
    pub target_count: u32,
}

impl QuerySpec {
    pub fn new(community: impl AsRef<str>, query_text: impl Into<String>, target_count: u32) -> Self {
        Self {
            community: community.as_ref().to_string(),
            query_text: query_text.into(),
            target_count,
        }
        .normalize()
    }

    /// Trim, drop a leading "r/", and clamp the count into `1..=MAX_PAGE_SIZE`.
    pub fn normalize(mut self) -> Self {
        self.community = normalize_community(&self.community);
        self.query_text = self.query_text.trim().to_string();
        self.target_count = self.target_count.clamp(1, MAX_PAGE_SIZE);
        self
    }
}

#[inline]
pub fn normalize_community(s: &str) -> String {
    let s = s.trim();
    s.strip_prefix("r/").unwrap_or(s).to_string()
}

/// Built-in query lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plan {
    /// The full twelve-search overnight run.
    Overnight,
    /// Searches 5..=12 of the overnight run, for extending a rate-limited partial run.
    Continuation,
}

impl Plan {
    pub fn queries(self) -> Vec<QuerySpec> {
        match self {
            Plan::Overnight => overnight_plan(),
            Plan::Continuation => continuation_plan(),
        }
    }

    /// Final dataset prefix and checkpoint name for this plan.
    pub fn default_names(self) -> (&'static str, &'static str) {
        match self {
            Plan::Overnight => ("optimus_reddit_OVERNIGHT", "overnight_progress.csv"),
            Plan::Continuation => ("optimus_reddit_COMPLETE", "continuation_progress.csv"),
        }
    }
}

pub fn overnight_plan() -> Vec<QuerySpec> {
    let mut v = vec![
        QuerySpec::new("teslamotors", "optimus", 100),
        QuerySpec::new("teslamotors", "tesla robot", 50),
        QuerySpec::new("teslamotors", "humanoid robot", 50),
        QuerySpec::new("robotics", "tesla optimus", 100),
    ];
    v.extend(continuation_plan());
    v
}

pub fn continuation_plan() -> Vec<QuerySpec> {
    vec![
        QuerySpec::new("robotics", "optimus robot", 50),
        QuerySpec::new("technology", "tesla optimus", 100),
        QuerySpec::new("technology", "optimus robot", 50),
        QuerySpec::new("Futurology", "tesla optimus", 100),
        QuerySpec::new("Futurology", "optimus humanoid", 50),
        QuerySpec::new("artificial", "tesla optimus", 50),
        QuerySpec::new("artificial", "optimus robot", 50),
        QuerySpec::new("RealTesla", "optimus", 100),
    ]
}

/// Load an ordered query list from a JSON array of `{community, query_text, target_count}`.
pub fn load_plan_file(path: &Path) -> Result<Vec<QuerySpec>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read plan {}", path.display()))?;
    let specs: Vec<QuerySpec> =
        serde_json::from_str(&raw).with_context(|| format!("parse plan {}", path.display()))?;
    let specs: Vec<QuerySpec> = specs
        .into_iter()
        .map(QuerySpec::normalize)
        .filter(|q| !q.community.is_empty() && !q.query_text.is_empty())
        .collect();
    if specs.is_empty() {
        anyhow::bail!("plan {} contains no usable queries", path.display());
    }
    Ok(specs)
}
