// src/corpus/loader.rs
//! Schema-validating corpus loader.
//!
//! Order of checks: eras → profiles → relationship edges → posts → events, so every
//! reference is checked against records that already passed validation. Issues are
//! collected per record; `LoadPolicy` decides whether any issue rejects the whole load.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use super::{Corpus, LoadReport, RawCorpus};
use crate::error::{Collection, LoadError, ValidationIssue};
use crate::model::{handle_key, tag_key, Era, HistoricalEvent, Post, Profile, Relationship};

static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@[\w.]{1,50}$").expect("handle regex"));
static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$").expect("month-day regex")
});

/// What to do when any record fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Keep valid records, report the rest.
    #[default]
    FailOpen,
    /// Reject the entire load.
    FailClosed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderOptions {
    pub policy: LoadPolicy,
    /// Treat posts whose author is unknown as invalid instead of reporting them.
    pub enforce_author_integrity: bool,
}

/// Relationship declared outside its source profile (`relationships.json`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelationshipRecord {
    source_profile_id: String,
    #[serde(flatten)]
    edge: Relationship,
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "corpus_records_loaded_total",
            "Corpus records accepted by the loader."
        );
        describe_counter!(
            "corpus_records_rejected_total",
            "Corpus records (or edges) rejected by validation."
        );
        describe_gauge!("corpus_posts", "Posts in the loaded corpus.");
        describe_gauge!("corpus_profiles", "Profiles in the loaded corpus.");
    });
}

#[derive(Debug, Clone, Default)]
pub struct CorpusLoader {
    opts: LoaderOptions,
}

impl CorpusLoader {
    pub fn new(opts: LoaderOptions) -> Self {
        Self { opts }
    }

    /// Read `posts.json`, `profiles.json`, `eras.json` (+ optional `relationships.json`,
    /// `events.json`) from `dir` and validate them.
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<Corpus, LoadError> {
        let dir = dir.as_ref();
        let raw = RawCorpus::from_dir(dir)?;
        info!(target: "corpus", dir = %dir.display(), records = raw.record_count(), "corpus files read");
        self.load(raw)
    }

    pub fn load(&self, raw: RawCorpus) -> Result<Corpus, LoadError> {
        ensure_metrics_described();
        let mut issues: Vec<ValidationIssue> = Vec::new();

        let eras = validate_eras(raw.eras, &mut issues);
        let era_ids: HashSet<&str> = eras.iter().map(|e| e.id.as_str()).collect();

        let mut profiles = validate_profiles(raw.profiles, &era_ids, &mut issues);
        attach_relationship_records(raw.relationships, &mut profiles, &mut issues);
        validate_edges(&mut profiles, &mut issues);

        let profile_ids: HashSet<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
        let mut dangling_authors = Vec::new();
        let posts = validate_posts(
            raw.posts,
            &era_ids,
            &profile_ids,
            self.opts.enforce_author_integrity,
            &mut dangling_authors,
            &mut issues,
        );
        let events = validate_events(raw.events, &era_ids, &mut issues);

        for issue in &issues {
            warn!(target: "corpus", %issue, "invalid corpus record");
        }
        counter!("corpus_records_rejected_total").increment(issues.len() as u64);

        if self.opts.policy == LoadPolicy::FailClosed && !issues.is_empty() {
            warn!(target: "corpus", issues = issues.len(), "fail-closed policy: corpus rejected");
            return Err(LoadError::Rejected { issues });
        }

        for post_id in &dangling_authors {
            warn!(target: "corpus", post = %post_id, "post author does not resolve to a profile");
        }

        let report = LoadReport {
            policy: self.opts.policy,
            issues,
            dangling_authors,
            ..LoadReport::default()
        };
        let corpus = Corpus::assemble(posts, profiles, eras, events, report);

        let r = corpus.report();
        counter!("corpus_records_loaded_total")
            .increment((r.posts + r.profiles + r.eras + r.events) as u64);
        gauge!("corpus_posts").set(r.posts as f64);
        gauge!("corpus_profiles").set(r.profiles as f64);
        info!(
            target: "corpus",
            version = %r.version,
            posts = r.posts,
            profiles = r.profiles,
            eras = r.eras,
            relationships = r.relationships,
            events = r.events,
            rejected = r.issues.len(),
            "corpus loaded"
        );

        Ok(corpus)
    }
}

/// Best-effort id for error reporting on records that failed to deserialize.
fn record_id(v: &Value, index: usize) -> String {
    v.get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{index}"))
}

fn decode<T: DeserializeOwned>(
    collection: Collection,
    index: usize,
    v: Value,
    issues: &mut Vec<ValidationIssue>,
) -> Option<T> {
    let id = record_id(&v, index);
    match serde_json::from_value::<T>(v) {
        Ok(t) => Some(t),
        Err(e) => {
            issues.push(ValidationIssue::new(collection, id, e.to_string()));
            None
        }
    }
}

/// Non-empty, not yet seen. Records the id on success.
fn check_id(
    collection: Collection,
    id: &str,
    seen: &mut HashSet<String>,
    issues: &mut Vec<ValidationIssue>,
) -> bool {
    if id.trim().is_empty() {
        issues.push(ValidationIssue::new(collection, id, "empty id"));
        return false;
    }
    if !seen.insert(id.to_string()) {
        issues.push(ValidationIssue::new(collection, id, "duplicate id"));
        return false;
    }
    true
}

fn validate_eras(raw: Vec<Value>, issues: &mut Vec<ValidationIssue>) -> Vec<Era> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for (i, v) in raw.into_iter().enumerate() {
        let Some(era) = decode::<Era>(Collection::Eras, i, v, issues) else {
            continue;
        };
        if !check_id(Collection::Eras, &era.id, &mut seen, issues) {
            continue;
        }
        if era.name.trim().is_empty() {
            issues.push(ValidationIssue::new(Collection::Eras, &era.id, "empty name"));
            continue;
        }
        out.push(era);
    }
    out
}

fn validate_profiles(
    raw: Vec<Value>,
    era_ids: &HashSet<&str>,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<Profile> {
    let mut seen = HashSet::new();
    let mut handles = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for (i, v) in raw.into_iter().enumerate() {
        let Some(mut profile) = decode::<Profile>(Collection::Profiles, i, v, issues) else {
            continue;
        };
        if !check_id(Collection::Profiles, &profile.id, &mut seen, issues) {
            continue;
        }

        let trimmed = profile.handle.trim();
        profile.handle = if trimmed.starts_with('@') {
            trimmed.to_string()
        } else {
            format!("@{trimmed}")
        };
        if !HANDLE_RE.is_match(&profile.handle) {
            issues.push(ValidationIssue::new(
                Collection::Profiles,
                &profile.id,
                format!("malformed handle {:?}", profile.handle),
            ));
            continue;
        }
        if !handles.insert(handle_key(&profile.handle)) {
            issues.push(ValidationIssue::new(
                Collection::Profiles,
                &profile.id,
                format!("duplicate handle {}", profile.handle),
            ));
            continue;
        }

        if let Some(unknown) = profile.era.iter().find(|e| !era_ids.contains(e.as_str())) {
            issues.push(ValidationIssue::new(
                Collection::Profiles,
                &profile.id,
                format!("unknown era {unknown:?}"),
            ));
            continue;
        }
        // Era is a set; keep first occurrence order.
        let mut era_seen = HashSet::new();
        profile.era.retain(|e| era_seen.insert(e.clone()));

        out.push(profile);
    }
    out
}

fn attach_relationship_records(
    raw: Vec<Value>,
    profiles: &mut [Profile],
    issues: &mut Vec<ValidationIssue>,
) {
    for (i, v) in raw.into_iter().enumerate() {
        let id = match (
            v.get("sourceProfileId").and_then(Value::as_str),
            v.get("targetProfileId").and_then(Value::as_str),
        ) {
            (Some(s), Some(t)) => format!("{s}->{t}"),
            _ => format!("#{i}"),
        };
        let rec = match serde_json::from_value::<RelationshipRecord>(v) {
            Ok(r) => r,
            Err(e) => {
                issues.push(ValidationIssue::new(Collection::Relationships, id, e.to_string()));
                continue;
            }
        };
        match profiles.iter_mut().find(|p| p.id == rec.source_profile_id) {
            Some(p) => p.relationships.push(rec.edge),
            None => issues.push(ValidationIssue::new(
                Collection::Relationships,
                id,
                format!("unknown source profile {:?}", rec.source_profile_id),
            )),
        }
    }
}

/// Drop edges that point at unknown profiles or back at their owner.
fn validate_edges(profiles: &mut [Profile], issues: &mut Vec<ValidationIssue>) {
    let known: HashSet<String> = profiles.iter().map(|p| p.id.clone()).collect();
    for p in profiles.iter_mut() {
        let owner = p.id.clone();
        p.relationships.retain(|edge| {
            let id = format!("{owner}->{}", edge.target_profile_id);
            if edge.target_profile_id == owner {
                issues.push(ValidationIssue::new(Collection::Relationships, id, "self-edge"));
                false
            } else if !known.contains(&edge.target_profile_id) {
                issues.push(ValidationIssue::new(
                    Collection::Relationships,
                    id,
                    "unknown target profile",
                ));
                false
            } else {
                true
            }
        });
    }
}

fn validate_posts(
    raw: Vec<Value>,
    era_ids: &HashSet<&str>,
    profile_ids: &HashSet<&str>,
    enforce_author_integrity: bool,
    dangling_authors: &mut Vec<String>,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<Post> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for (i, v) in raw.into_iter().enumerate() {
        let Some(mut post) = decode::<Post>(Collection::Posts, i, v, issues) else {
            continue;
        };
        if !check_id(Collection::Posts, &post.id, &mut seen, issues) {
            continue;
        }
        if !era_ids.contains(post.era.as_str()) {
            issues.push(ValidationIssue::new(
                Collection::Posts,
                &post.id,
                format!("unknown era {:?}", post.era),
            ));
            continue;
        }
        if !profile_ids.contains(post.author_id.as_str()) {
            if enforce_author_integrity {
                issues.push(ValidationIssue::new(
                    Collection::Posts,
                    &post.id,
                    format!("unknown author {:?}", post.author_id),
                ));
                continue;
            }
            dangling_authors.push(post.id.clone());
        }

        post.hashtags = normalize_hashtags(&post.hashtags);
        if post.display_date.trim().is_empty() {
            post.display_date = post.timestamp.format("%B %-d, %Y").to_string();
        }
        out.push(post);
    }
    out
}

/// Strip `#`, drop empties, collapse case-insensitive repeats (first spelling wins).
fn normalize_hashtags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|t| t.trim().trim_start_matches('#').to_string())
        .filter(|t| !t.is_empty() && seen.insert(tag_key(t)))
        .collect()
}

fn validate_events(
    raw: Vec<Value>,
    era_ids: &HashSet<&str>,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<HistoricalEvent> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for (i, v) in raw.into_iter().enumerate() {
        let Some(ev) = decode::<HistoricalEvent>(Collection::Events, i, v, issues) else {
            continue;
        };
        if !check_id(Collection::Events, &ev.id, &mut seen, issues) {
            continue;
        }
        if !MONTH_DAY_RE.is_match(&ev.month_day) {
            issues.push(ValidationIssue::new(
                Collection::Events,
                &ev.id,
                format!("malformed monthDay {:?}", ev.month_day),
            ));
            continue;
        }
        if let Some(era) = ev.era.as_deref() {
            if !era_ids.contains(era) {
                issues.push(ValidationIssue::new(
                    Collection::Events,
                    &ev.id,
                    format!("unknown era {era:?}"),
                ));
                continue;
            }
        }
        out.push(ev);
    }
    out
}
