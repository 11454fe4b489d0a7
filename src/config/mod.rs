// src/config/mod.rs
//! Engine configuration: `config/engine.toml` plus a few env overrides.
//!
//! Every section and field is optional; a missing file yields the defaults.

use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use crate::corpus::{LoadPolicy, LoaderOptions};
use crate::engine::EngineOptions;
use crate::notify::NotificationLimits;
use crate::ranking::AffinityWeights;
use crate::relationships::IncomingTypes;

pub const DEFAULT_CONFIG_PATH: &str = "config/engine.toml";
pub const DEFAULT_CORPUS_DIR: &str = "data/corpus";

pub const ENV_CONFIG_PATH: &str = "CHRONICLE_CONFIG_PATH";
pub const ENV_STRICT: &str = "CHRONICLE_STRICT";
pub const ENV_CORPUS_DIR: &str = "CHRONICLE_CORPUS_DIR";
pub const ENV_LOAD_POLICY: &str = "CHRONICLE_LOAD_POLICY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSection {
    pub dir: PathBuf,
    pub policy: LoadPolicy,
    pub enforce_author_integrity: bool,
}

impl Default for CorpusSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_CORPUS_DIR),
            policy: LoadPolicy::default(),
            enforce_author_integrity: false,
        }
    }
}

/// Query behavior and the default page sizes used by the HTTP surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySection {
    pub strict: bool,
    pub feed_limit: usize,
    pub search_limit: usize,
    pub trending_limit: usize,
    pub top_limit: usize,
    /// Upper clamp for any caller-supplied `limit`.
    pub max_limit: usize,
}

impl Default for QuerySection {
    fn default() -> Self {
        Self {
            strict: false,
            feed_limit: 20,
            search_limit: 10,
            trending_limit: 10,
            top_limit: 10,
            max_limit: 100,
        }
    }
}

impl QuerySection {
    /// Caller limit, or `fallback`, clamped to `1..=max_limit`.
    pub fn limit(&self, requested: Option<usize>, fallback: usize) -> usize {
        requested.unwrap_or(fallback).clamp(1, self.max_limit.max(1))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipsSection {
    pub incoming_types: IncomingTypes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub corpus: CorpusSection,
    pub query: QuerySection,
    pub relationships: RelationshipsSection,
    pub affinity: AffinityWeights,
    pub notifications: NotificationLimits,
}

fn parse_bool_env(raw: Option<String>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_policy_env(raw: Option<String>) -> Option<LoadPolicy> {
    match raw?.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "fail_open" | "open" => Some(LoadPolicy::FailOpen),
        "fail_closed" | "closed" => Some(LoadPolicy::FailClosed),
        _ => None,
    }
}

impl EngineConfig {
    /// Load from `CHRONICLE_CONFIG_PATH` (default `config/engine.toml`) and apply env
    /// overrides. A missing file is not an error.
    pub fn from_toml() -> anyhow::Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut cfg = Self::from_path(&path)?;
        cfg.apply_env_with(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    /// Load a TOML file without env overrides.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content).map_err(|e| {
                anyhow::anyhow!("Failed to parse engine config at {}: {}", path.display(), e)
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no engine config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read engine config at {}: {}",
                path.display(),
                e
            )),
        }
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let mut cfg: EngineConfig = toml::from_str(toml_str)?;
        let weights = cfg.affinity.sanitized();
        if weights != cfg.affinity {
            warn!(?weights, "affinity weights clamped to finite non-negative values");
            cfg.affinity = weights;
        }
        Ok(cfg)
    }

    /// Apply `CHRONICLE_*` overrides read through `get`. Unparseable values are ignored
    /// with a warning.
    pub fn apply_env_with<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = get(ENV_STRICT) {
            match parse_bool_env(Some(raw.clone())) {
                Some(b) => self.query.strict = b,
                None => warn!(var = ENV_STRICT, value = %raw, "ignoring unparseable override"),
            }
        }
        if let Some(dir) = get(ENV_CORPUS_DIR).filter(|d| !d.trim().is_empty()) {
            self.corpus.dir = PathBuf::from(dir.trim());
        }
        if let Some(raw) = get(ENV_LOAD_POLICY) {
            match parse_policy_env(Some(raw.clone())) {
                Some(p) => self.corpus.policy = p,
                None => warn!(var = ENV_LOAD_POLICY, value = %raw, "ignoring unparseable override"),
            }
        }
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            policy: self.corpus.policy,
            enforce_author_integrity: self.corpus.enforce_author_integrity,
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            strict: self.query.strict,
            incoming_types: self.relationships.incoming_types,
            affinity: self.affinity,
            notifications: self.notifications,
        }
    }
}
