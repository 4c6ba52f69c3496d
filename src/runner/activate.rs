//! Egg activation.
//!
//! Inspects a confirmed egg path for distribution metadata, makes the egg's
//! code resolvable by the downstream interpreter and publishes the declared
//! settings module to the environment.

use std::env::JoinPathsError;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::egg::{self, MetadataError};
use crate::env;

/// Entry point group consulted for the settings module.
pub const SETTINGS_GROUP: &str = "scrapy";

/// Entry point name consulted for the settings module.
pub const SETTINGS_NAME: &str = "settings";

/// Failure to activate an egg.
///
/// Every underlying inspection or activation failure surfaces as this one
/// kind so callers have a single failure type to handle; the original cause
/// is preserved for diagnostics.
#[derive(Debug, Error)]
pub enum BadEggError {
    #[error("no valid distribution found in {path}")]
    NoDistribution { path: PathBuf },

    #[error("failed to inspect {path}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },

    #[error("cannot add {path} to the module search path")]
    SearchPath {
        path: PathBuf,
        #[source]
        source: JoinPathsError,
    },
}

impl BadEggError {
    /// Path of the egg that failed to activate.
    pub fn path(&self) -> &Path {
        match self {
            BadEggError::NoDistribution { path }
            | BadEggError::Inspect { path, .. }
            | BadEggError::SearchPath { path, .. } => path,
        }
    }
}

/// Activate the egg at `path`.
///
/// Takes the first discovered distribution (discovery order is
/// deterministic), prepends the egg to the downstream module search path,
/// then publishes its `scrapy`/`settings` entry point to
/// `SCRAPY_SETTINGS_MODULE` unless that variable is already set.
pub fn activate_egg(path: &Path) -> Result<(), BadEggError> {
    let distributions = egg::discover(path).map_err(|source| BadEggError::Inspect {
        path: path.to_path_buf(),
        source,
    })?;
    let Some(distribution) = distributions.first() else {
        return Err(BadEggError::NoDistribution {
            path: path.to_path_buf(),
        });
    };

    env::prepend_search_path(env::SEARCH_PATH_VAR, path).map_err(|source| {
        BadEggError::SearchPath {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if let Some(entry_point) = distribution.entry_point(SETTINGS_GROUP, SETTINGS_NAME) {
        env::setdefault(env::SETTINGS_MODULE_VAR, &entry_point.value);
    }

    debug!(
        egg = %path.display(),
        distribution = %distribution.name,
        version = %distribution.version,
        "activated egg"
    );
    Ok(())
}
