use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_tracing_once(default_level: &str) {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

const TRIES: usize = 16;
const DELAY_MS: u64 = 50;

/// Transient errors worth retrying: sharing/lock violations from AV or backup tools
/// holding the file (Windows), and plain interrupts everywhere.
fn is_retriable_io_error(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::Interrupted {
        return true;
    }
    is_sharing_violation(e)
}

#[cfg(windows)]
fn is_sharing_violation(e: &io::Error) -> bool {
    // 5 access denied, 32 sharing violation, 33 lock violation
    matches!(e.raw_os_error(), Some(5) | Some(32) | Some(33))
}

#[cfg(not(windows))]
fn is_sharing_violation(_e: &io::Error) -> bool {
    false
}

fn with_backoff<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err: Option<io::Error> = None;
    for i in 0..TRIES {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(DELAY_MS.saturating_mul((i + 1) as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "retries exhausted")))
}

/// Create (truncate) a file with retries for transient errors.
pub fn create_with_backoff(path: &Path) -> io::Result<File> {
    with_backoff(|| File::create(path))
}

/// Create a file that must not already exist.
pub fn create_new_with_backoff(path: &Path) -> io::Result<File> {
    with_backoff(|| OpenOptions::new().write(true).create_new(true).open(path))
}

/// Remove a file with retries. Succeeds if the file doesn't exist.
pub fn remove_with_backoff(path: &Path) -> Result<()> {
    match with_backoff(|| fs::remove_file(path)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
    }
}

/// Replace `dest` with `tmp`. Rename is atomic on the same volume; if it keeps
/// failing, fall back to copy + remove.
pub fn replace_file_atomic_backoff(tmp: &Path, dest: &Path) -> Result<()> {
    if with_backoff(|| fs::rename(tmp, dest)).is_ok() {
        return Ok(());
    }
    with_backoff(|| fs::copy(tmp, dest))
        .with_context(|| format!("copy {} -> {}", tmp.display(), dest.display()))?;
    remove_with_backoff(tmp)
}
