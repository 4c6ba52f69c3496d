//! Helpers shared by runner callers.

use serde_json::{Map, Value};

use crate::config::Config;
use crate::storage::{EggStorage, StorageError};

/// Log storage path for a job.
pub fn job_log_url(project: &str, spider: &str, job: &str) -> String {
    format!("/logs/{project}/{spider}/{job}.log")
}

/// Item feed storage path for a job.
pub fn job_items_url(project: &str, spider: &str, job: &str) -> String {
    format!("/items/{project}/{spider}/{job}.jl")
}

/// Projects known to the store, plus the ones declared in the config's
/// `[settings]` table.
pub fn get_project_list<S>(config: &Config, storage: &S) -> Result<Vec<String>, StorageError>
where
    S: EggStorage + ?Sized,
{
    let mut projects = storage.list_projects()?;
    projects.extend(config.settings().keys().cloned());
    Ok(projects)
}

/// Recursively convert the values of a JSON object to their canonical
/// string form.
///
/// Nested objects recurse, arrays convert element-wise, every other value
/// renders as a string. Keys are kept as-is.
pub fn stringify_dict(map: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in map {
        let converted = match value {
            Value::Object(inner) => Value::Object(stringify_dict(inner)),
            Value::Array(items) => Value::Array(items.iter().map(to_string_value).collect()),
            other => to_string_value(other),
        };
        out.insert(key.clone(), converted);
    }
    out
}

fn to_string_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}
