//! Scoped project environments.
//!
//! [`ProjectEnvironment`] resolves a project's egg from storage, activates
//! it for the downstream crawl process and guarantees that any temporary
//! file spooled during entry is removed when the scope ends, on every exit
//! path.

mod activate;

pub use activate::{activate_egg, BadEggError, SETTINGS_GROUP, SETTINGS_NAME};

use std::io::{self, Read};
use std::path::Path;

use tempfile::TempPath;
use thiserror::Error;
use tracing::{debug, warn};

use crate::env;
use crate::storage::{Egg, EggStorage, StorageError};

/// Errors from entering a project environment.
///
/// Storage and activation failures pass through transparently so callers see
/// the original kind.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("SCRAPY_PROJECT is not set")]
    ProjectNotSet,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    BadEgg(#[from] BadEggError),

    #[error("failed to spool egg to a temporary file: {0}")]
    Spool(#[from] io::Error),
}

/// Scope during which a project's egg is active.
///
/// Entering resolves and activates the egg; dropping the value removes the
/// temporary file created for a stream-backed egg. Environment variables
/// published during entry deliberately outlive the scope.
#[derive(Debug)]
pub struct ProjectEnvironment {
    project: String,
    version: String,
    tmp: Option<TempPath>,
}

impl ProjectEnvironment {
    /// Resolve and activate `project`'s egg from `storage`.
    ///
    /// Reads an optional version override from `SCRAPYD_EGG_VERSION` and
    /// publishes the resolved version back, set-if-absent. A project whose
    /// store entry carries no egg enters successfully without activation.
    pub fn enter<S>(storage: &S, project: &str) -> Result<Self, RunnerError>
    where
        S: EggStorage + ?Sized,
    {
        let requested = std::env::var(env::EGG_VERSION_VAR).ok();
        let (version, egg) = storage.get(project, requested.as_deref())?;
        if !version.is_empty() {
            env::setdefault(env::EGG_VERSION_VAR, &version);
        }
        debug!(project, version = %version, "resolved project egg");

        let mut tmp = None;
        if let Some(egg) = egg {
            // The handle is consumed by the branch it matches, so it is
            // closed before any activation error propagates.
            let activation = match egg {
                Egg::Path(path) => activate_egg(&path).map_err(RunnerError::from),
                Egg::Stream(reader) => match spool_egg(project, &version, reader) {
                    Ok(spooled) => {
                        let result = activate_egg(&spooled).map_err(RunnerError::from);
                        tmp = Some(spooled);
                        result
                    }
                    Err(err) => Err(err),
                },
            };
            activation?;
        } else {
            debug!(project, "no egg stored, skipping activation");
        }

        Ok(Self {
            project: project.to_string(),
            version,
            tmp,
        })
    }

    /// Project this environment was entered for.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Version resolved by the store; empty when the store tracks none.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Path of the temporary egg spooled for a stream handle, if any.
    pub fn spooled_egg(&self) -> Option<&Path> {
        self.tmp.as_deref()
    }
}

impl Drop for ProjectEnvironment {
    fn drop(&mut self) {
        if let Some(tmp) = self.tmp.take() {
            debug!(project = %self.project, egg = %tmp.display(), "removing temporary egg");
            if let Err(err) = tmp.close() {
                warn!(project = %self.project, %err, "failed to remove temporary egg");
            }
        }
    }
}

/// Copy a stream-backed egg into a uniquely named temporary file.
///
/// The name carries a `{project}-{version}-` prefix so concurrent
/// activations of different projects or versions cannot collide. The
/// returned [`TempPath`] owns the file: dropping it deletes the file,
/// including when entry fails after this point.
fn spool_egg(
    project: &str,
    version: &str,
    mut reader: Box<dyn Read + Send>,
) -> Result<TempPath, RunnerError> {
    let prefix = format!("{project}-{version}-");
    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".egg")
        .tempfile()?;
    let bytes = io::copy(&mut reader, tmp.as_file_mut())?;
    debug!(project, version, bytes, "spooled egg stream to temporary file");
    // Closes the file handle, keeping the path and its deletion guard.
    Ok(tmp.into_temp_path())
}

/// Enter `project`'s environment, run `op` and clean up on every exit path.
///
/// Entry failures surface as [`RunnerError`]; whatever `op` returns is
/// handed back unmodified after cleanup. Cleanup also runs when `op`
/// panics, via the guard's `Drop`.
pub fn with_project_environment<S, T, F>(
    storage: &S,
    project: &str,
    op: F,
) -> Result<T, RunnerError>
where
    S: EggStorage + ?Sized,
    F: FnOnce(&ProjectEnvironment) -> T,
{
    let environment = ProjectEnvironment::enter(storage, project)?;
    Ok(op(&environment))
}

/// Outer entry point: select the project from `SCRAPY_PROJECT` and run `op`
/// inside its environment.
pub fn run<S, T, F>(storage: &S, op: F) -> Result<T, RunnerError>
where
    S: EggStorage + ?Sized,
    F: FnOnce(&ProjectEnvironment) -> T,
{
    let project = std::env::var(env::PROJECT_VAR).map_err(|_| RunnerError::ProjectNotSet)?;
    with_project_environment(storage, &project, op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEggStorage;

    fn clear_env() {
        for key in [
            env::PROJECT_VAR,
            env::EGG_VERSION_VAR,
            env::SETTINGS_MODULE_VAR,
            env::SEARCH_PATH_VAR,
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_enter_without_egg_skips_activation() {
        let _lock = env::test_lock();
        clear_env();

        let storage = MockEggStorage::new().with_absent_egg("idle", "2.3");
        let environment = ProjectEnvironment::enter(&storage, "idle").unwrap();

        assert_eq!(environment.project(), "idle");
        assert_eq!(environment.version(), "2.3");
        assert!(environment.spooled_egg().is_none());
        assert_eq!(std::env::var(env::EGG_VERSION_VAR).unwrap(), "2.3");
        assert!(std::env::var_os(env::SETTINGS_MODULE_VAR).is_none());

        clear_env();
    }

    #[test]
    fn test_enter_skips_version_publication_when_empty() {
        let _lock = env::test_lock();
        clear_env();

        let storage = MockEggStorage::new().with_absent_egg("untracked", "");
        ProjectEnvironment::enter(&storage, "untracked").unwrap();

        assert!(std::env::var_os(env::EGG_VERSION_VAR).is_none());

        clear_env();
    }

    #[test]
    fn test_enter_propagates_storage_errors() {
        let _lock = env::test_lock();
        clear_env();

        let storage = MockEggStorage::new().with_failing_get("backend unavailable");
        let err = ProjectEnvironment::enter(&storage, "demo").unwrap_err();

        assert!(matches!(
            err,
            RunnerError::Storage(StorageError::Backend(_))
        ));

        clear_env();
    }

    #[test]
    fn test_enter_unknown_project() {
        let _lock = env::test_lock();
        clear_env();

        let storage = MockEggStorage::new();
        let err = ProjectEnvironment::enter(&storage, "ghost").unwrap_err();

        assert!(matches!(
            err,
            RunnerError::Storage(StorageError::UnknownProject(_))
        ));

        clear_env();
    }

    #[test]
    fn test_run_requires_project_variable() {
        let _lock = env::test_lock();
        clear_env();

        let storage = MockEggStorage::new();
        let err = run(&storage, |_| ()).unwrap_err();
        assert!(matches!(err, RunnerError::ProjectNotSet));
    }
}
