//! Mock egg storage for tests.
//!
//! Configurable in-memory store covering every handle shape the runner has
//! to deal with: path-backed eggs, stream-only eggs, projects with no egg at
//! all, and injected backend failures.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::PathBuf;

use crate::storage::{Egg, EggStorage, StorageError};

enum StoredEgg {
    Path(PathBuf),
    Bytes(Vec<u8>),
    Absent,
}

struct Entry {
    version: String,
    egg: StoredEgg,
}

/// In-memory egg storage with failure injection.
#[derive(Default)]
pub struct MockEggStorage {
    entries: BTreeMap<String, Entry>,
    fail_get: Option<String>,
}

impl MockEggStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project resolving to an egg with a stable filesystem path.
    pub fn with_path_egg(
        mut self,
        project: &str,
        version: &str,
        path: impl Into<PathBuf>,
    ) -> Self {
        self.entries.insert(
            project.to_string(),
            Entry {
                version: version.to_string(),
                egg: StoredEgg::Path(path.into()),
            },
        );
        self
    }

    /// Project resolving to a stream-only egg holding `bytes`.
    pub fn with_stream_egg(mut self, project: &str, version: &str, bytes: Vec<u8>) -> Self {
        self.entries.insert(
            project.to_string(),
            Entry {
                version: version.to_string(),
                egg: StoredEgg::Bytes(bytes),
            },
        );
        self
    }

    /// Project known to the store but with nothing to run against.
    pub fn with_absent_egg(mut self, project: &str, version: &str) -> Self {
        self.entries.insert(
            project.to_string(),
            Entry {
                version: version.to_string(),
                egg: StoredEgg::Absent,
            },
        );
        self
    }

    /// Make every `get` fail with a backend error.
    pub fn with_failing_get(mut self, message: &str) -> Self {
        self.fail_get = Some(message.to_string());
        self
    }
}

impl EggStorage for MockEggStorage {
    fn get(
        &self,
        project: &str,
        version: Option<&str>,
    ) -> Result<(String, Option<Egg>), StorageError> {
        if let Some(message) = &self.fail_get {
            return Err(StorageError::Backend(message.clone()));
        }
        let entry = self
            .entries
            .get(project)
            .ok_or_else(|| StorageError::UnknownProject(project.to_string()))?;

        // A requested version is honored as-is; otherwise the stored one is
        // the store default.
        let resolved = version.unwrap_or(&entry.version).to_string();
        let egg = match &entry.egg {
            StoredEgg::Path(path) => Some(Egg::Path(path.clone())),
            StoredEgg::Bytes(bytes) => Some(Egg::Stream(Box::new(Cursor::new(bytes.clone())))),
            StoredEgg::Absent => None,
        };
        Ok((resolved, egg))
    }

    fn list_projects(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.keys().cloned().collect())
    }
}
