// tests/config_env.rs
//
// EngineConfig::from_toml reads the file named by CHRONICLE_CONFIG_PATH and applies env
// overrides. These tests mutate process env, so they run serially.

mod common;

use std::{env, fs};

use chronicle_engine::config::{ENV_CONFIG_PATH, ENV_CORPUS_DIR, ENV_LOAD_POLICY, ENV_STRICT};
use chronicle_engine::{Engine, EngineConfig, IncomingTypes, LoadError, LoadPolicy};

fn clear_env() {
    for k in [ENV_CONFIG_PATH, ENV_STRICT, ENV_CORPUS_DIR, ENV_LOAD_POLICY] {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn file_then_env_overrides() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    fs::write(
        &path,
        r#"
[query]
strict = false
feed_limit = 7

[relationships]
incoming_types = "inverted"
"#,
    )
    .unwrap();

    env::set_var(ENV_CONFIG_PATH, &path);
    env::set_var(ENV_STRICT, "1");
    env::set_var(ENV_LOAD_POLICY, "fail-closed");
    let cfg = EngineConfig::from_toml().expect("config loads");
    clear_env();

    assert!(cfg.query.strict);
    assert_eq!(cfg.query.feed_limit, 7);
    assert_eq!(cfg.corpus.policy, LoadPolicy::FailClosed);
    assert_eq!(cfg.relationships.incoming_types, IncomingTypes::Inverted);
    assert!(cfg.engine_options().strict);
}

#[serial_test::serial]
#[test]
fn missing_file_falls_back_to_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    env::set_var(ENV_CONFIG_PATH, dir.path().join("absent.toml"));
    let cfg = EngineConfig::from_toml().expect("defaults");
    clear_env();
    assert_eq!(cfg, EngineConfig::default());
}

#[serial_test::serial]
#[test]
fn malformed_file_is_an_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    fs::write(&path, "[query\nstrict = ").unwrap();
    env::set_var(ENV_CONFIG_PATH, &path);
    let res = EngineConfig::from_toml();
    clear_env();
    assert!(res.is_err());
}

#[serial_test::serial]
#[test]
fn corpus_dir_override_drives_engine_load() {
    clear_env();
    env::set_var(ENV_CONFIG_PATH, "does/not/exist.toml");
    env::set_var(ENV_CORPUS_DIR, common::fixture_dir());
    let cfg = EngineConfig::from_toml().unwrap();
    clear_env();

    let engine = Engine::from_config(&cfg).expect("fixture loads");
    assert_eq!(engine.corpus().posts().len(), 13);

    let mut bad = cfg.clone();
    bad.corpus.dir = "does/not/exist".into();
    assert!(matches!(Engine::from_config(&bad), Err(LoadError::Io { .. })));
}

#[test]
fn shipped_config_parses() {
    let text = fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/config/engine.toml"))
        .expect("config/engine.toml");
    let cfg = EngineConfig::from_toml_str(&text).unwrap();
    assert_eq!(cfg, EngineConfig::default());
}
