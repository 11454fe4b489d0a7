// src/corpus/raw.rs
//! Untyped corpus collections as they arrive on disk.
//!
//! Records stay as `serde_json::Value` until the loader validates them one by one, so a
//! single malformed record never hides the rest of the collection.

use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::LoadError;

pub const POSTS_FILE: &str = "posts.json";
pub const PROFILES_FILE: &str = "profiles.json";
pub const ERAS_FILE: &str = "eras.json";
pub const RELATIONSHIPS_FILE: &str = "relationships.json";
pub const EVENTS_FILE: &str = "events.json";

/// Raw record collections. `relationships` and `events` are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCorpus {
    pub posts: Vec<Value>,
    pub profiles: Vec<Value>,
    pub eras: Vec<Value>,
    #[serde(default)]
    pub relationships: Vec<Value>,
    #[serde(default)]
    pub events: Vec<Value>,
}

impl RawCorpus {
    /// Read one JSON array per collection from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, LoadError> {
        Ok(Self {
            posts: read_array(dir, POSTS_FILE, true)?,
            profiles: read_array(dir, PROFILES_FILE, true)?,
            eras: read_array(dir, ERAS_FILE, true)?,
            relationships: read_array(dir, RELATIONSHIPS_FILE, false)?,
            events: read_array(dir, EVENTS_FILE, false)?,
        })
    }

    /// Single-document form: `{ "posts": [...], "profiles": [...], "eras": [...] }`.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn record_count(&self) -> usize {
        self.posts.len()
            + self.profiles.len()
            + self.eras.len()
            + self.relationships.len()
            + self.events.len()
    }
}

fn read_array(dir: &Path, file: &str, required: bool) -> Result<Vec<Value>, LoadError> {
    let path = dir.join(file);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if !required && e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(LoadError::Io { path, source }),
    };
    serde_json::from_str(&content).map_err(|source| LoadError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_collections_default_to_empty() {
        let raw = RawCorpus::from_json_str(r#"{"posts":[],"profiles":[{"id":"x"}],"eras":[]}"#)
            .unwrap();
        assert!(raw.relationships.is_empty());
        assert!(raw.events.is_empty());
        assert_eq!(raw.record_count(), 1);
    }

    #[test]
    fn missing_required_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RawCorpus::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }), "got {err}");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(POSTS_FILE), "[]").unwrap();
        fs::write(dir.path().join(PROFILES_FILE), "{not json").unwrap();
        fs::write(dir.path().join(ERAS_FILE), "[]").unwrap();
        let err = RawCorpus::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }), "got {err}");
    }
}
