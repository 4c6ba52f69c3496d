//! Process environment plumbing.
//!
//! The runner talks to the downstream crawl process exclusively through
//! environment variables. Writes use set-if-absent semantics so an
//! externally supplied override always wins, and entries published during a
//! project scope deliberately outlive it.

use std::env;
use std::path::{Path, PathBuf};

/// Project selected by the outer entry point.
pub const PROJECT_VAR: &str = "SCRAPY_PROJECT";

/// Egg version: read as an override before resolution, published as the
/// resolved value afterwards.
pub const EGG_VERSION_VAR: &str = "SCRAPYD_EGG_VERSION";

/// Settings module published from the egg's entry points.
pub const SETTINGS_MODULE_VAR: &str = "SCRAPY_SETTINGS_MODULE";

/// Module search path of the downstream interpreter.
pub const SEARCH_PATH_VAR: &str = "PYTHONPATH";

/// Set `key` to `value` unless it is already present.
///
/// Returns true if the variable was written.
pub fn setdefault(key: &str, value: &str) -> bool {
    if env::var_os(key).is_some() {
        return false;
    }
    env::set_var(key, value);
    true
}

/// Prepend `path` to a search-path style variable such as `PYTHONPATH`.
///
/// Existing occurrences of `path` are dropped first, so activating the same
/// egg twice keeps the variable stable.
pub fn prepend_search_path(key: &str, path: &Path) -> Result<(), env::JoinPathsError> {
    let mut paths: Vec<PathBuf> = vec![path.to_path_buf()];
    if let Some(existing) = env::var_os(key) {
        paths.extend(env::split_paths(&existing).filter(|p| p != path));
    }
    let joined = env::join_paths(paths)?;
    env::set_var(key, joined);
    Ok(())
}

/// Serialize tests that mutate the process environment.
///
/// The runtime model assumes one activation per process; the test harness
/// runs many tests on concurrent threads, so every test touching the
/// variables above must hold this lock for its full duration.
pub fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock, PoisonError};
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}
