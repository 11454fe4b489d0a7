//! # Engine
//! Shared, read-only handle over a loaded corpus.
//!
//! Every query, pagination, relationship and ranking operation is a method on `Engine`
//! (split across the modules that own each concern). Cloning is cheap: the corpus sits
//! behind an `Arc` and is never mutated after load, so clones can be handed to any
//! number of concurrent readers.

use std::path::Path;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::corpus::{Corpus, CorpusLoader};
use crate::error::LoadError;
use crate::notify::NotificationLimits;
use crate::ranking::AffinityWeights;
use crate::relationships::IncomingTypes;

/// Behavior switches that do not depend on corpus contents.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Reject malformed filter values and unknown cursors instead of ignoring them.
    pub strict: bool,
    pub incoming_types: IncomingTypes,
    pub affinity: AffinityWeights,
    pub notifications: NotificationLimits,
}

#[derive(Debug, Clone)]
pub struct Engine {
    corpus: Arc<Corpus>,
    opts: EngineOptions,
}

impl Engine {
    pub fn new(corpus: Arc<Corpus>, opts: EngineOptions) -> Self {
        Self { corpus, opts }
    }

    /// Load the corpus directory named by `cfg` and wrap it.
    pub fn from_config(cfg: &EngineConfig) -> Result<Self, LoadError> {
        Self::load_dir(&cfg.corpus.dir, cfg)
    }

    pub fn load_dir(dir: &Path, cfg: &EngineConfig) -> Result<Self, LoadError> {
        let corpus = CorpusLoader::new(cfg.loader_options()).load_dir(dir)?;
        Ok(Self::new(Arc::new(corpus), cfg.engine_options()))
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Shared handle, e.g. for snapshotting the corpus version alongside a cursor.
    pub fn corpus_handle(&self) -> Arc<Corpus> {
        Arc::clone(&self.corpus)
    }

    pub fn options(&self) -> &EngineOptions {
        &self.opts
    }

    /// Same corpus, different switches.
    pub fn with_options(&self, opts: EngineOptions) -> Self {
        Self {
            corpus: Arc::clone(&self.corpus),
            opts,
        }
    }
}
