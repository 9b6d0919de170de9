use crate::cancel::CancelToken;
use crate::checkpoint::Checkpointer;
use crate::config::HarvestOptions;
use crate::finalize::{finalize_and_persist, FinalizeReport};
use crate::harvest::{HarvestOutcome, Harvester, QueryReport};
use crate::query::QuerySpec;
use crate::record::ItemRecord;
use crate::resume;
use crate::source::{RedditClient, SourceClient};
use anyhow::{Context, Result};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Duration;

/// Builder and driver for one harvest run: resume → harvest → finalize.
#[derive(Clone, Default)]
pub struct RedditHarvest {
    pub(crate) opts: HarvestOptions,
}

/// Summary of a run that reached the finalizer without a loop error.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: HarvestOutcome,
    pub resumed: usize,
    pub accumulated: usize,
    pub queries: Vec<QueryReport>,
    /// `None` when nothing was collected.
    pub finalized: Option<FinalizeReport>,
}

impl RedditHarvest {
    pub fn new() -> Self {
        Self { opts: HarvestOptions::default() }
    }

    pub fn with_options(opts: HarvestOptions) -> Self {
        Self { opts }
    }

    // -------- Builder methods --------
    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_output_dir(dir); self }
    pub fn checkpoint_name(mut self, name: impl Into<String>) -> Self { self.opts = self.opts.with_checkpoint_name(name); self }
    pub fn output_prefix(mut self, prefix: impl Into<String>) -> Self { self.opts = self.opts.with_output_prefix(prefix); self }
    pub fn resume_from(mut self, path: Option<impl AsRef<Path>>) -> Self { self.opts = self.opts.with_resume_from(path); self }
    pub fn cooldown(mut self, d: Duration) -> Self { self.opts = self.opts.with_cooldown(d); self }
    pub fn sample_rows(mut self, rows: usize) -> Self { self.opts = self.opts.with_sample_rows(rows); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn base_url(mut self, url: impl Into<String>) -> Self { self.opts = self.opts.with_base_url(url); self }
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self { self.opts = self.opts.with_user_agent(ua); self }

    pub fn options(&self) -> &HarvestOptions {
        &self.opts
    }

    /// Reddit client configured from these options.
    pub fn reddit_client(&self) -> Result<RedditClient> {
        RedditClient::new(&self.opts).context("build HTTP client")
    }

    /// Initial accumulator: the explicit prior dataset (if any), then a leftover
    /// checkpoint from a run that died before finalizing.
    ///
    /// A file that exists but cannot be parsed is fatal.
    pub fn load_initial(&self) -> Result<Vec<ItemRecord>> {
        let mut initial = Vec::new();
        let checkpoint = self.opts.checkpoint_path();

        if let Some(prior) = &self.opts.resume_from {
            match resume::load(prior)? {
                Some(rows) => initial.extend(rows),
                None => tracing::warn!(path = %prior.display(), "no existing data found; starting fresh"),
            }
        }
        if self.opts.resume_from.as_deref() != Some(checkpoint.as_path()) {
            if let Some(rows) = resume::load(&checkpoint)? {
                tracing::warn!(path = %checkpoint.display(), rows = rows.len(), "picked up leftover checkpoint");
                initial.extend(rows);
            }
        }
        Ok(initial)
    }

    /// Run the whole pipeline with an explicit source client.
    ///
    /// The finalizer runs exactly once on every path past resume loading: normal
    /// completion, cancellation, and loop errors (after which the loop error is returned).
    /// A panic in the loop also finalizes what was checkpointed before it is re-raised.
    pub fn run<C: SourceClient>(&self, client: &C, plan: &[QuerySpec], cancel: &CancelToken) -> Result<RunReport> {
        fs::create_dir_all(&self.opts.output_dir)
            .with_context(|| format!("create {}", self.opts.output_dir.display()))?;

        let initial = self.load_initial()?;
        let resumed = initial.len();
        tracing::info!(
            searches = plan.len(),
            resumed,
            cooldown_secs = self.opts.cooldown.as_secs(),
            "harvest starting"
        );

        let mut harvester = Harvester::new(client, Checkpointer::new(self.opts.checkpoint_path()), initial)
            .cooldown(self.opts.cooldown)
            .progress(self.opts.progress);
        let looped = match panic::catch_unwind(AssertUnwindSafe(|| harvester.run(plan, cancel))) {
            Ok(looped) => looped,
            Err(payload) => {
                tracing::error!("harvest loop panicked; saving what was collected");
                if let Err(fin_err) = finalize_and_persist(&harvester.into_records(), &self.opts) {
                    tracing::error!(error = %fin_err, "best-effort finalize also failed");
                }
                panic::resume_unwind(payload)
            }
        };
        let queries = harvester.reports().to_vec();
        let records = harvester.into_records();
        let accumulated = records.len();

        match looped {
            Ok(outcome) => {
                let finalized = finalize_and_persist(&records, &self.opts)?;
                Ok(RunReport { outcome, resumed, accumulated, queries, finalized })
            }
            Err(loop_err) => {
                tracing::error!(error = %loop_err, "harvest loop failed; saving what was collected");
                if let Err(fin_err) = finalize_and_persist(&records, &self.opts) {
                    tracing::error!(error = %fin_err, "best-effort finalize also failed");
                }
                Err(loop_err)
            }
        }
    }
}
