// tests/common/mod.rs
//
// Shared helpers: the JSON fixture corpus and small synthetic corpora built in code.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use chronicle_engine::{CorpusLoader, Engine, EngineOptions, LoaderOptions, RawCorpus};
use serde_json::{json, Value};

pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/corpus")
}

pub fn fixture_engine_with(opts: EngineOptions) -> Engine {
    let corpus = CorpusLoader::new(LoaderOptions::default())
        .load_dir(fixture_dir())
        .expect("fixture corpus loads");
    Engine::new(Arc::new(corpus), opts)
}

pub fn fixture_engine() -> Engine {
    fixture_engine_with(EngineOptions::default())
}

pub fn strict_fixture_engine() -> Engine {
    fixture_engine_with(EngineOptions {
        strict: true,
        ..EngineOptions::default()
    })
}

pub fn era(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Era {id}"),
        "shortName": id,
        "startDate": "1700-01-01",
        "endDate": "1900-01-01"
    })
}

pub fn profile(id: &str, era: &str) -> Value {
    json!({
        "id": id,
        "name": id,
        "displayName": id,
        "handle": format!("@{id}"),
        "era": [era]
    })
}

pub fn post(id: &str, author: &str, era: &str, ts: &str) -> Value {
    json!({
        "id": id,
        "authorId": author,
        "era": era,
        "timestamp": ts,
        "type": "status",
        "content": format!("post {id}"),
        "accuracy": "inferred"
    })
}

/// Merge `patch` fields into `base`.
pub fn with(mut base: Value, patch: Value) -> Value {
    if let (Some(b), Some(p)) = (base.as_object_mut(), patch.as_object()) {
        for (k, v) in p {
            b.insert(k.clone(), v.clone());
        }
    }
    base
}

pub fn raw(eras: Vec<Value>, profiles: Vec<Value>, posts: Vec<Value>) -> RawCorpus {
    RawCorpus {
        posts,
        profiles,
        eras,
        relationships: vec![],
        events: vec![],
    }
}

pub fn engine_from(raw: RawCorpus, opts: EngineOptions) -> Engine {
    let corpus = CorpusLoader::new(LoaderOptions::default())
        .load(raw)
        .expect("synthetic corpus loads");
    Engine::new(Arc::new(corpus), opts)
}

pub fn post_ids(posts: &[&chronicle_engine::Post]) -> Vec<String> {
    posts.iter().map(|p| p.id.clone()).collect()
}

pub fn profile_ids(profiles: &[&chronicle_engine::Profile]) -> Vec<String> {
    profiles.iter().map(|p| p.id.clone()).collect()
}
