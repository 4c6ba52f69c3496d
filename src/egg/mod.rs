//! Egg inspection.
//!
//! Finds distribution metadata in the two layouts egg storage hands out: an
//! unpacked egg directory with an `EGG-INFO/` (or `*.egg-info/`) subdirectory,
//! and a packed `.egg` tar archive carrying the same entries. The egg format
//! is produced elsewhere; this module only reads it.

mod metadata;

pub use metadata::{Distribution, EntryPoint};

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use tar::Archive;
use thiserror::Error;

/// Errors from egg metadata discovery.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("egg does not exist: {0}")]
    NotFound(PathBuf),
}

/// Files a metadata directory may declare its identity in, in priority order.
const PKG_INFO_FILES: &[&str] = &["PKG-INFO", "METADATA"];

const ENTRY_POINTS_FILE: &str = "entry_points.txt";

/// Discover the distributions declared by the egg at `path`.
///
/// Accepts both an unpacked egg directory and a packed archive. Returned
/// distributions are sorted by metadata directory name, so callers taking
/// the first get a deterministic selection.
pub fn discover(path: &Path) -> Result<Vec<Distribution>, MetadataError> {
    if !path.exists() {
        return Err(MetadataError::NotFound(path.to_path_buf()));
    }

    let raw = if path.is_dir() {
        collect_from_dir(path)?
    } else {
        collect_from_archive(path)?
    };

    Ok(raw
        .into_iter()
        .map(|(dir, files)| build_distribution(&dir, files))
        .collect())
}

fn is_metadata_dir(name: &str) -> bool {
    name == "EGG-INFO" || name.ends_with(".egg-info") || name.ends_with(".dist-info")
}

/// Raw file contents collected for one metadata directory.
#[derive(Default)]
struct RawMetadata {
    pkg_info: Option<String>,
    entry_points: Option<String>,
}

fn build_distribution(dir: &str, files: RawMetadata) -> Distribution {
    let (name, version) = files
        .pkg_info
        .as_deref()
        .map(metadata::parse_pkg_info)
        .unwrap_or((None, None));
    let entry_points = files
        .entry_points
        .as_deref()
        .map(metadata::parse_entry_points)
        .unwrap_or_default();

    Distribution {
        name: name.unwrap_or_else(|| dir_stem(dir)),
        version: version.unwrap_or_default(),
        entry_points,
    }
}

fn dir_stem(dir: &str) -> String {
    dir.trim_end_matches(".egg-info")
        .trim_end_matches(".dist-info")
        .to_string()
}

fn collect_from_dir(path: &Path) -> Result<BTreeMap<String, RawMetadata>, MetadataError> {
    let mut found = BTreeMap::new();

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !entry.file_type()?.is_dir() || !is_metadata_dir(&name) {
            continue;
        }

        let mut raw = RawMetadata::default();
        for candidate in PKG_INFO_FILES {
            let file = entry.path().join(candidate);
            if file.is_file() {
                raw.pkg_info = Some(fs::read_to_string(&file)?);
                break;
            }
        }
        let entry_points = entry.path().join(ENTRY_POINTS_FILE);
        if entry_points.is_file() {
            raw.entry_points = Some(fs::read_to_string(&entry_points)?);
        }

        found.insert(name, raw);
    }

    Ok(found)
}

fn collect_from_archive(path: &Path) -> Result<BTreeMap<String, RawMetadata>, MetadataError> {
    let file = fs::File::open(path)?;
    let mut archive = Archive::new(file);
    let mut found: BTreeMap<String, RawMetadata> = BTreeMap::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();

        let mut components = entry_path.components();
        let Some(Component::Normal(first)) = components.next() else {
            continue;
        };
        let dir = first.to_string_lossy().into_owned();
        if !is_metadata_dir(&dir) {
            continue;
        }

        // Seeing the directory at all makes it a distribution, even before
        // any of its files show up.
        let slot = found.entry(dir).or_default();

        // Metadata files live directly under the metadata directory.
        if entry_path.components().count() != 2 {
            continue;
        }
        let Some(file_name) = entry_path.file_name().map(|n| n.to_string_lossy().into_owned())
        else {
            continue;
        };

        if PKG_INFO_FILES.contains(&file_name.as_str()) && slot.pkg_info.is_none() {
            let mut contents = String::new();
            entry.read_to_string(&mut contents)?;
            slot.pkg_info = Some(contents);
        } else if file_name == ENTRY_POINTS_FILE {
            let mut contents = String::new();
            entry.read_to_string(&mut contents)?;
            slot.entry_points = Some(contents);
        }
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn write_metadata_dir(root: &Path, dir: &str, pkg_info: Option<&str>, entry_points: Option<&str>) {
        let meta = root.join(dir);
        fs::create_dir_all(&meta).unwrap();
        if let Some(contents) = pkg_info {
            fs::write(meta.join("PKG-INFO"), contents).unwrap();
        }
        if let Some(contents) = entry_points {
            fs::write(meta.join("entry_points.txt"), contents).unwrap();
        }
    }

    fn write_egg_archive(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(file);
        for (name, contents) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_path(name).unwrap();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, contents.as_bytes()).unwrap();
        }
        builder.finish().unwrap();
    }

    #[test]
    fn test_discover_unpacked_egg() {
        let dir = TempDir::new().unwrap();
        write_metadata_dir(
            dir.path(),
            "EGG-INFO",
            Some("Name: demo\nVersion: 1.0\n"),
            Some("[scrapy]\nsettings = demo.settings\n"),
        );

        let distributions = discover(dir.path()).unwrap();
        assert_eq!(distributions.len(), 1);
        assert_eq!(distributions[0].name, "demo");
        assert_eq!(distributions[0].version, "1.0");
        assert_eq!(
            distributions[0].entry_point("scrapy", "settings").unwrap().value,
            "demo.settings"
        );
    }

    #[test]
    fn test_discover_packed_egg() {
        let dir = TempDir::new().unwrap();
        let egg = dir.path().join("demo.egg");
        write_egg_archive(
            &egg,
            &[
                ("EGG-INFO/PKG-INFO", "Name: demo\nVersion: 1.0\n"),
                ("EGG-INFO/entry_points.txt", "[scrapy]\nsettings = demo.settings\n"),
                ("demo/__init__.py", ""),
            ],
        );

        let distributions = discover(&egg).unwrap();
        assert_eq!(distributions.len(), 1);
        assert_eq!(distributions[0].name, "demo");
        assert_eq!(
            distributions[0].entry_point("scrapy", "settings").unwrap().value,
            "demo.settings"
        );
    }

    #[test]
    fn test_discover_empty_egg() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("demo")).unwrap();
        fs::write(dir.path().join("demo/__init__.py"), "").unwrap();

        let distributions = discover(dir.path()).unwrap();
        assert!(distributions.is_empty());
    }

    #[test]
    fn test_discover_missing_path() {
        let result = discover(Path::new("/nonexistent/demo.egg"));
        assert!(matches!(result, Err(MetadataError::NotFound(_))));
    }

    #[test]
    fn test_discover_order_is_deterministic() {
        let dir = TempDir::new().unwrap();
        write_metadata_dir(dir.path(), "zeta.egg-info", Some("Name: zeta\n"), None);
        write_metadata_dir(dir.path(), "alpha.egg-info", Some("Name: alpha\n"), None);

        let distributions = discover(dir.path()).unwrap();
        let names: Vec<_> = distributions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_discover_falls_back_to_directory_stem() {
        let dir = TempDir::new().unwrap();
        write_metadata_dir(dir.path(), "demo.egg-info", None, None);

        let distributions = discover(dir.path()).unwrap();
        assert_eq!(distributions.len(), 1);
        assert_eq!(distributions[0].name, "demo");
        assert!(distributions[0].version.is_empty());
        assert!(distributions[0].entry_points.is_empty());
    }

    #[test]
    fn test_discover_archive_metadata_dir_without_files() {
        let dir = TempDir::new().unwrap();
        let egg = dir.path().join("bare.egg");
        write_egg_archive(&egg, &[("EGG-INFO/zip-safe", "")]);

        let distributions = discover(&egg).unwrap();
        assert_eq!(distributions.len(), 1);
        assert_eq!(distributions[0].name, "EGG-INFO");
        assert!(distributions[0].entry_points.is_empty());
    }
}
