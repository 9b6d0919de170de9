use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default wait between successive queries.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(180);

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct HarvestOptions {
    pub output_dir: PathBuf,
    pub checkpoint_name: String,      // file name inside output_dir
    pub output_prefix: String,        // final dataset: {prefix}_{timestamp}.csv
    pub resume_from: Option<PathBuf>, // prior dataset to extend
    pub cooldown: Duration,           // between queries, not after the last one
    pub sample_rows: usize,           // head sample size
    pub progress: bool,               // show progress bars

    // source endpoint
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("optimus_data"),
            checkpoint_name: "overnight_progress.csv".to_string(),
            output_prefix: "optimus_reddit_OVERNIGHT".to_string(),
            resume_from: None,
            cooldown: DEFAULT_COOLDOWN,
            sample_rows: 100,
            progress: true,

            base_url: "https://old.reddit.com".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl HarvestOptions {
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_checkpoint_name(mut self, name: impl Into<String>) -> Self {
        self.checkpoint_name = name.into();
        self
    }
    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = prefix.into();
        self
    }
    pub fn with_resume_from(mut self, path: Option<impl AsRef<Path>>) -> Self {
        self.resume_from = path.map(|p| p.as_ref().to_path_buf());
        self
    }
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.output_dir.join(&self.checkpoint_name)
    }

    pub fn sample_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_sample.csv", self.output_prefix))
    }
}
