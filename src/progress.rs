//! Progress reporting: query-count bar and cooldown countdown.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);

fn styled(pb: ProgressBar, template: &str) -> ProgressBar {
    if let Ok(style) = ProgressStyle::with_template(template) {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    pb.enable_steady_tick(TICK);
    pb
}

/// A small wrapper around an `indicatif` bar that can be switched off entirely.
pub struct ProgressScope {
    pb: ProgressBar,
}

impl ProgressScope {
    /// Queries completed out of total.
    pub fn count<T: Into<String>>(label: T, total: u64, enabled: bool) -> Self {
        if !enabled {
            return Self::hidden();
        }
        let pb = styled(
            ProgressBar::new(total),
            "{spinner:.green} {msg} {pos}/{len} [{bar:.cyan/blue}] {percent:>3}%  elapsed: {elapsed_precise}",
        );
        pb.set_message(label.into());
        Self { pb }
    }

    /// Countdown for a cooldown wait, in whole seconds.
    pub fn cooldown(total: Duration, enabled: bool) -> Self {
        if !enabled {
            return Self::hidden();
        }
        let pb = styled(
            ProgressBar::new(total.as_secs()),
            "{spinner:.yellow} cooling down {pos}/{len}s [{bar:.yellow/blue}] (avoids rate limiting)",
        );
        Self { pb }
    }

    pub fn hidden() -> Self {
        Self { pb: ProgressBar::hidden() }
    }

    #[inline]
    pub fn inc(&self, delta: u64) {
        self.pb.inc(delta);
    }
    #[inline]
    pub fn set_position(&self, pos: u64) {
        self.pb.set_position(pos);
    }
    pub fn set_message<T: Into<String>>(&self, msg: T) {
        self.pb.set_message(msg.into());
    }
    pub fn finish<T: Into<String>>(&self, msg: T) {
        self.pb.finish_with_message(msg.into());
    }
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}
