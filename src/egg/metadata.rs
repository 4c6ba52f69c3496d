//! Distribution metadata parsing.
//!
//! An egg declares its identity in `PKG-INFO` (RFC 822 style headers) and
//! its entry points in `entry_points.txt` (INI sections keyed by group).

use serde::{Deserialize, Serialize};

/// A named, grouped reference declared by a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Group the entry point is declared under, e.g. `scrapy`.
    pub group: String,
    /// Name within the group, e.g. `settings`.
    pub name: String,
    /// The reference itself, e.g. a module path.
    pub value: String,
}

/// Package metadata discovered inside an egg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distribution {
    /// Distribution name from `PKG-INFO`, or the metadata directory stem
    /// when the file is missing.
    pub name: String,
    /// Version from `PKG-INFO`, empty when undeclared.
    pub version: String,
    /// Declared entry points, in file order.
    pub entry_points: Vec<EntryPoint>,
}

impl Distribution {
    /// First entry point matching `group` and `name`.
    pub fn entry_point(&self, group: &str, name: &str) -> Option<&EntryPoint> {
        self.entry_points
            .iter()
            .find(|ep| ep.group == group && ep.name == name)
    }
}

/// Parse `PKG-INFO` headers, returning `(name, version)`.
///
/// Headers end at the first blank line; everything after is the description
/// body and is ignored.
pub(crate) fn parse_pkg_info(contents: &str) -> (Option<String>, Option<String>) {
    let mut name = None;
    let mut version = None;
    for line in contents.lines() {
        if line.trim().is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            match key.trim() {
                "Name" => name = Some(value.trim().to_string()),
                "Version" => version = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }
    (name, version)
}

/// Parse `entry_points.txt` into a flat entry point list.
///
/// Lines before the first `[group]` header and lines without `=` are
/// ignored, as are comments.
pub(crate) fn parse_entry_points(contents: &str) -> Vec<EntryPoint> {
    let mut points = Vec::new();
    let mut group: Option<String> = None;
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            group = Some(header.trim().to_string());
            continue;
        }
        let Some(group) = group.as_ref() else {
            continue;
        };
        if let Some((name, value)) = line.split_once('=') {
            points.push(EntryPoint {
                group: group.clone(),
                name: name.trim().to_string(),
                value: value.trim().to_string(),
            });
        }
    }
    points
}
