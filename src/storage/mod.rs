//! Egg storage interface.
//!
//! The store itself lives outside this crate. The runner only consumes the
//! capability: resolve a project (and optional version) to a normalized
//! version string plus an egg handle, and enumerate known projects.

use std::fmt;
use std::io::{self, Read};
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by an egg store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unknown project: {0}")]
    UnknownProject(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Backend(String),
}

/// An egg retrieved from storage.
///
/// Dropping the handle closes any underlying reader; [`Egg::close`] makes
/// the release explicit at the call site.
pub enum Egg {
    /// Egg with a stable path on the local filesystem.
    Path(PathBuf),
    /// Egg only reachable as a byte stream, e.g. fetched from a remote
    /// backend. Has no stable path until spooled to disk.
    Stream(Box<dyn Read + Send>),
}

impl Egg {
    /// Release the handle.
    pub fn close(self) {}
}

impl fmt::Debug for Egg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Egg::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Egg::Stream(_) => f.debug_tuple("Stream").field(&"..").finish(),
        }
    }
}

/// Capability the runner needs from an egg store.
pub trait EggStorage {
    /// Resolve `project` (and optional `version`) to a normalized version
    /// string and an egg handle.
    ///
    /// `None` selects the store's default version, typically the most recent
    /// upload. The resolved version may be empty when the store tracks none.
    /// `Ok((_, None))` means the project has nothing to run against; callers
    /// treat that as a valid state, not an error.
    fn get(
        &self,
        project: &str,
        version: Option<&str>,
    ) -> Result<(String, Option<Egg>), StorageError>;

    /// Enumerate the projects known to the store.
    fn list_projects(&self) -> Result<Vec<String>, StorageError>;
}
