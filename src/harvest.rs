//! The sequential harvest loop: query → accumulate → checkpoint → cooldown.

use crate::cancel::CancelToken;
use crate::checkpoint::Checkpointer;
use crate::error::FetchError;
use crate::progress::ProgressScope;
use crate::query::QuerySpec;
use crate::record::ItemRecord;
use crate::source::SourceClient;
use anyhow::Result;
use std::time::Duration;

/// Where the loop is. `Running(i)` / `Cooldown(i)` index into the query list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HarvestState {
    Idle,
    Running(usize),
    Cooldown(usize),
    Done,
    Interrupted,
}

/// How the loop ended, when it ended without an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HarvestOutcome {
    Completed,
    Interrupted,
}

/// Observational per-query counters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryReport {
    pub community: String,
    pub query_text: String,
    pub collected: usize,
    pub running_total: usize,
    pub error: Option<String>,
}

/// Owns the accumulator for the duration of a run.
pub struct Harvester<'a, C: SourceClient> {
    client: &'a C,
    checkpointer: Checkpointer,
    cooldown: Duration,
    progress: bool,
    state: HarvestState,
    records: Vec<ItemRecord>,
    reports: Vec<QueryReport>,
}

impl<'a, C: SourceClient> Harvester<'a, C> {
    pub fn new(client: &'a C, checkpointer: Checkpointer, initial: Vec<ItemRecord>) -> Self {
        Self {
            client,
            checkpointer,
            cooldown: crate::config::DEFAULT_COOLDOWN,
            progress: false,
            state: HarvestState::Idle,
            records: initial,
            reports: Vec::new(),
        }
    }

    pub fn cooldown(mut self, d: Duration) -> Self {
        self.cooldown = d;
        self
    }

    pub fn progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }

    pub fn state(&self) -> HarvestState {
        self.state
    }
    pub fn records(&self) -> &[ItemRecord] {
        &self.records
    }
    pub fn reports(&self) -> &[QueryReport] {
        &self.reports
    }

    /// Hand the accumulator off (to the finalizer).
    pub fn into_records(self) -> Vec<ItemRecord> {
        self.records
    }

    /// Run every query in order.
    ///
    /// A failed query contributes nothing and the loop moves on. On cancellation the
    /// in-flight query's records are discarded, so the accumulator always equals the
    /// last checkpoint. `Err` only comes from checkpoint persistence.
    pub fn run(&mut self, specs: &[QuerySpec], cancel: &CancelToken) -> Result<HarvestOutcome> {
        let total = specs.len();
        let bar = ProgressScope::count("queries", total as u64, self.progress);

        for (i, spec) in specs.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(self.interrupt(&bar));
            }
            self.state = HarvestState::Running(i);
            tracing::info!(
                "search {}/{}: r/{} for '{}' (target {})",
                i + 1,
                total,
                spec.community,
                spec.query_text,
                spec.target_count
            );
            bar.set_message(format!("r/{} '{}'", spec.community, spec.query_text));

            let fetched = self.client.fetch_items(spec, cancel);
            if cancel.is_cancelled() {
                return Ok(self.interrupt(&bar));
            }

            let (collected, error) = match fetched {
                Ok(items) => {
                    let n = items.len();
                    self.records.extend(items);
                    (n, None)
                }
                Err(FetchError::Cancelled) => return Ok(self.interrupt(&bar)),
                Err(e) => {
                    tracing::warn!(community = %spec.community, query = %spec.query_text, error = %e, "query failed; recording zero items");
                    (0, Some(e.to_string()))
                }
            };

            self.checkpointer.save(&self.records)?;
            tracing::info!("collected {} items from this search; running total {}", collected, self.records.len());
            self.reports.push(QueryReport {
                community: spec.community.clone(),
                query_text: spec.query_text.clone(),
                collected,
                running_total: self.records.len(),
                error,
            });
            bar.inc(1);

            if i + 1 < total {
                self.state = HarvestState::Cooldown(i);
                if !self.cool_down(cancel) {
                    return Ok(self.interrupt(&bar));
                }
            }
        }

        self.state = HarvestState::Done;
        bar.finish("all searches complete");
        Ok(HarvestOutcome::Completed)
    }

    fn interrupt(&mut self, bar: &ProgressScope) -> HarvestOutcome {
        tracing::warn!(state = ?self.state, kept = self.records.len(), "harvest interrupted");
        self.state = HarvestState::Interrupted;
        bar.finish("interrupted");
        HarvestOutcome::Interrupted
    }

    /// Wait out the cooldown in one-second slices so the countdown can render.
    /// Returns `false` if cancelled.
    fn cool_down(&self, cancel: &CancelToken) -> bool {
        if self.cooldown.is_zero() {
            return !cancel.is_cancelled();
        }
        tracing::info!("waiting {}s before next search", self.cooldown.as_secs());
        let bar = ProgressScope::cooldown(self.cooldown, self.progress);
        let slice = Duration::from_secs(1);
        let mut left = self.cooldown;
        let mut elapsed = 0u64;
        while !left.is_zero() {
            let step = left.min(slice);
            if !cancel.wait(step) {
                bar.clear();
                return false;
            }
            left -= step;
            elapsed += 1;
            bar.set_position(elapsed);
        }
        bar.clear();
        true
    }
}
