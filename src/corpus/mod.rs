// src/corpus/mod.rs
//! Immutable, validated corpus plus its lookup indexes.
//!
//! A `Corpus` is built once by [`CorpusLoader`] and then shared read-only (usually as
//! `Arc<Corpus>`). Posts are stored in canonical order (newest first, id ascending on
//! ties), so every slice handed out by this module is already sorted.

pub mod loader;
pub mod raw;

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::error::ValidationIssue;
use crate::model::{handle_key, Era, HistoricalEvent, Post, Profile};
use crate::relationships::ReverseIndex;

pub use loader::{CorpusLoader, LoadPolicy, LoaderOptions};
pub use raw::RawCorpus;

/// Summary of a load, kept alongside the corpus.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub version: String,
    pub policy: LoadPolicy,
    pub posts: usize,
    pub profiles: usize,
    pub eras: usize,
    pub relationships: usize,
    pub events: usize,
    /// Records (or edges) dropped under the fail-open policy.
    pub issues: Vec<ValidationIssue>,
    /// Post ids whose author does not resolve to a profile.
    pub dangling_authors: Vec<String>,
}

#[derive(Debug)]
pub struct Corpus {
    posts: Vec<Post>,
    post_index: HashMap<String, usize>,
    posts_by_author: HashMap<String, Vec<usize>>,
    profiles: Vec<Profile>,
    profile_index: HashMap<String, usize>,
    handle_index: HashMap<String, usize>,
    eras: Vec<Era>,
    era_index: HashMap<String, usize>,
    events: Vec<HistoricalEvent>,
    reverse: ReverseIndex,
    report: LoadReport,
}

impl Corpus {
    /// Sort, index and fingerprint already-validated collections.
    pub(crate) fn assemble(
        mut posts: Vec<Post>,
        profiles: Vec<Profile>,
        mut eras: Vec<Era>,
        events: Vec<HistoricalEvent>,
        mut report: LoadReport,
    ) -> Self {
        posts.sort_by(Post::canonical_cmp);

        // Era counters are derived from the loaded records.
        for era in eras.iter_mut() {
            era.post_count = posts.iter().filter(|p| p.era == era.id).count() as u64;
            era.profile_count = profiles.iter().filter(|p| p.in_era(&era.id)).count() as u64;
        }

        let post_index = posts
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        let mut posts_by_author: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, p) in posts.iter().enumerate() {
            posts_by_author.entry(p.author_id.clone()).or_default().push(i);
        }

        let profile_index = profiles
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        let handle_index = profiles
            .iter()
            .enumerate()
            .map(|(i, p)| (handle_key(&p.handle), i))
            .collect();
        let era_index = eras
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();

        let reverse = ReverseIndex::build(&profiles);

        report.version = fingerprint(&posts, &profiles, &eras, &events);
        report.posts = posts.len();
        report.profiles = profiles.len();
        report.eras = eras.len();
        report.relationships = profiles.iter().map(|p| p.relationships.len()).sum();
        report.events = events.len();

        Self {
            posts,
            post_index,
            posts_by_author,
            profiles,
            profile_index,
            handle_index,
            eras,
            era_index,
            events,
            reverse,
            report,
        }
    }

    /// All posts in canonical order.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn post(&self, id: &str) -> Option<&Post> {
        self.post_index.get(id).map(|&i| &self.posts[i])
    }

    /// Position of a post within the canonical order.
    pub fn post_position(&self, id: &str) -> Option<usize> {
        self.post_index.get(id).copied()
    }

    /// Posts by one author, canonical order.
    pub fn posts_by_author(&self, author_id: &str) -> Vec<&Post> {
        self.posts_by_author
            .get(author_id)
            .map(|idxs| idxs.iter().map(|&i| &self.posts[i]).collect())
            .unwrap_or_default()
    }

    /// Profiles in load order.
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.profile_index.get(id).map(|&i| &self.profiles[i])
    }

    /// Case-insensitive; the leading `@` is optional.
    pub fn profile_by_handle(&self, handle: &str) -> Option<&Profile> {
        self.handle_index
            .get(&handle_key(handle))
            .map(|&i| &self.profiles[i])
    }

    pub fn eras(&self) -> &[Era] {
        &self.eras
    }

    pub fn era(&self, id: &str) -> Option<&Era> {
        self.era_index.get(id).map(|&i| &self.eras[i])
    }

    pub fn events(&self) -> &[HistoricalEvent] {
        &self.events
    }

    /// Events keyed on `MM-DD`.
    pub fn events_on<'a>(&'a self, month_day: &'a str) -> impl Iterator<Item = &'a HistoricalEvent> {
        self.events.iter().filter(move |e| e.month_day == month_day)
    }

    pub fn reverse_index(&self) -> &ReverseIndex {
        &self.reverse
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Content fingerprint over every loaded record; any field change yields a new value.
    pub fn version(&self) -> &str {
        &self.report.version
    }
}

fn fingerprint(
    posts: &[Post],
    profiles: &[Profile],
    eras: &[Era],
    events: &[HistoricalEvent],
) -> String {
    let mut hasher = Sha256::new();
    // Serialized form covers every field, counters and content included.
    for part in [
        serde_json::to_vec(posts),
        serde_json::to_vec(profiles),
        serde_json::to_vec(eras),
        serde_json::to_vec(events),
    ] {
        hasher.update(part.unwrap_or_default());
        hasher.update(b"\n");
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
