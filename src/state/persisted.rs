use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// String-keyed JSON values persisted to a single file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl LocalStorage {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => parse_entries(&bytes)
                .with_context(|| format!("failed to parse storage file {}", path.display()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read storage file {}", path.display()))
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decodes the value stored under `key`, if any.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = self.entries().get(key).cloned();
        raw.map(|value| {
            serde_json::from_value(value)
                .with_context(|| format!("stored value for '{key}' has an unexpected shape"))
        })
        .transpose()
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("failed to encode value for '{key}'"))?;
        let mut entries = self.entries();
        let previous = entries.insert(key.to_owned(), value);
        if let Err(err) = self.flush(&entries) {
            match previous {
                Some(previous) => entries.insert(key.to_owned(), previous),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    /// Returns `false` when `key` was not present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries();
        let Some(previous) = entries.remove(key) else {
            return Ok(false);
        };
        if let Err(err) = self.flush(&entries) {
            entries.insert(key.to_owned(), previous);
            return Err(err);
        }
        Ok(true)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
        self.entries.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn flush(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        let document: Map<String, Value> = entries
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let bytes = serde_json::to_vec_pretty(&Value::Object(document))?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, bytes)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

fn parse_entries(bytes: &[u8]) -> Result<BTreeMap<String, Value>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }

    match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => bail!("expected a JSON object, found {}", json_kind(&other)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A single value mirrored into [`LocalStorage`] under a fixed key.
pub struct Persisted<T> {
    storage: Arc<LocalStorage>,
    key: String,
    value: T,
}

impl<T: Serialize + DeserializeOwned> Persisted<T> {
    /// Loads `key`, falling back to `initial` when it is missing or cannot be decoded.
    pub fn load(storage: Arc<LocalStorage>, key: impl Into<String>, initial: T) -> Self {
        let key = key.into();
        let value = match storage.get::<T>(&key) {
            Ok(Some(value)) => value,
            Ok(None) => initial,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "ignoring malformed stored value");
                initial
            }
        };

        Self {
            storage,
            key,
            value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Writes `value` through to storage, then replaces the in-memory copy.
    /// A failed write leaves the previous value in place.
    pub fn set(&mut self, value: T) -> Result<()> {
        self.storage.set(&self.key, &value)?;
        self.value = value;
        Ok(())
    }

    pub fn update(&mut self, f: impl FnOnce(&mut T)) -> Result<()>
    where
        T: Clone,
    {
        let mut next = self.value.clone();
        f(&mut next);
        self.set(next)
    }
}
