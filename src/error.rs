//! Error types for corpus loading and query evaluation.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Corpus collection a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Posts,
    Profiles,
    Eras,
    Relationships,
    Events,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Collection::Posts => "posts",
            Collection::Profiles => "profiles",
            Collection::Eras => "eras",
            Collection::Relationships => "relationships",
            Collection::Events => "events",
        };
        f.write_str(s)
    }
}

/// One rejected record (or rejected part of a record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub collection: Collection,
    pub record_id: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        collection: Collection,
        record_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            collection,
            record_id: record_id.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.collection, self.record_id, self.message)
    }
}

/// Load-time failures.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("corpus rejected: {} invalid record(s)", issues.len())]
    Rejected { issues: Vec<ValidationIssue> },
}

/// Input rejected by a strict-mode query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid {field} filter: {value:?}")]
    InvalidFilter { field: &'static str, value: String },

    #[error("unknown cursor: {0}")]
    UnknownCursor(String),
}
