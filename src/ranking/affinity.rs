//! Simulated affinity: how likely a profile would have been to "like" a post.
//!
//! Every contribution is non-negative, so adding a mention, a matching hashtag or a
//! connection to the author can only raise a candidate's score. The score carries its
//! reasons so callers can show why a post was picked.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::engine::Engine;
use crate::model::{tag_key, Post, Profile};

/// Tunable weights (`[affinity]` in the engine config).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffinityWeights {
    /// Profile id appears in the post's mentions.
    pub mention: f64,
    /// Per hashtag matching one of the profile's tags or occupations.
    pub hashtag: f64,
    /// Post author is connected to the profile.
    pub connection: f64,
    /// Popularity contributes `likes / likes_divisor`, capped at `likes_cap`.
    pub likes_divisor: f64,
    pub likes_cap: f64,
    /// Verified or documented post.
    pub accuracy: f64,
    /// Length of the returned ranking.
    pub limit: usize,
}

impl Default for AffinityWeights {
    fn default() -> Self {
        Self {
            mention: 100.0,
            hashtag: 20.0,
            connection: 50.0,
            likes_divisor: 1000.0,
            likes_cap: 20.0,
            accuracy: 10.0,
            limit: 20,
        }
    }
}

impl AffinityWeights {
    /// Every weight finite and `>= 0`, so a matching signal never lowers a score.
    /// Non-finite values fall back to the default weight.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let fix = |v: f64, fallback: f64| if v.is_finite() { v.max(0.0) } else { fallback };
        Self {
            mention: fix(self.mention, d.mention),
            hashtag: fix(self.hashtag, d.hashtag),
            connection: fix(self.connection, d.connection),
            likes_divisor: fix(self.likes_divisor, d.likes_divisor),
            likes_cap: fix(self.likes_cap, d.likes_cap),
            accuracy: fix(self.accuracy, d.accuracy),
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffinityReasonKind {
    Mention,
    Hashtag,
    Connection,
    Popularity,
    Accuracy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffinityReason {
    pub kind: AffinityReasonKind,
    pub message: String,
    pub points: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AffinityScore<'a> {
    pub post: &'a Post,
    pub score: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<AffinityReason>,
}

fn reason(kind: AffinityReasonKind, message: impl Into<String>, points: f64) -> AffinityReason {
    AffinityReason {
        kind,
        message: message.into(),
        points,
    }
}

/// Lower-cased, non-empty tags and occupations of `profile`.
fn interests(profile: &Profile) -> Vec<String> {
    profile
        .tags
        .iter()
        .chain(profile.occupation.iter())
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn tag_matches(tag: &str, interests: &[String]) -> bool {
    !tag.is_empty()
        && interests
            .iter()
            .any(|i| i.contains(tag) || tag.contains(i.as_str()))
}

/// Score one post for `profile`. Candidate eligibility (era, authorship) is not
/// checked here; see [`affinity_ranking`].
pub fn score_post<'a>(
    profile: &Profile,
    post: &'a Post,
    connected: &HashSet<&str>,
    w: &AffinityWeights,
) -> AffinityScore<'a> {
    score_with(profile, &interests(profile), post, connected, w)
}

fn score_with<'a>(
    profile: &Profile,
    interests: &[String],
    post: &'a Post,
    connected: &HashSet<&str>,
    w: &AffinityWeights,
) -> AffinityScore<'a> {
    let mut reasons = Vec::new();

    if post.mentions.iter().any(|m| m == &profile.id) {
        reasons.push(reason(AffinityReasonKind::Mention, "mentioned", w.mention));
    }

    let mut seen = HashSet::new();
    for tag in post.hashtags.iter().map(|h| tag_key(h)) {
        if seen.insert(tag.clone()) && tag_matches(&tag, interests) {
            reasons.push(reason(AffinityReasonKind::Hashtag, format!("#{tag}"), w.hashtag));
        }
    }

    if connected.contains(post.author_id.as_str()) {
        reasons.push(reason(
            AffinityReasonKind::Connection,
            format!("connected to {}", post.author_id),
            w.connection,
        ));
    }

    if w.likes_divisor > 0.0 && post.likes > 0 {
        let pts = (post.likes as f64 / w.likes_divisor).min(w.likes_cap);
        if pts > 0.0 {
            reasons.push(reason(
                AffinityReasonKind::Popularity,
                format!("{} likes", post.likes),
                pts,
            ));
        }
    }

    if post.accuracy.is_well_sourced() {
        reasons.push(reason(AffinityReasonKind::Accuracy, "well sourced", w.accuracy));
    }

    AffinityScore {
        post,
        score: reasons.iter().map(|r| r.points).sum(),
        reasons,
    }
}

/// Candidate posts (sharing an era with `profile`, not authored by it) with a positive
/// score, best first (canonical order on ties), truncated to `w.limit`.
pub fn affinity_ranking<'a, I>(
    profile: &Profile,
    posts: I,
    connected: &HashSet<&str>,
    w: &AffinityWeights,
) -> Vec<AffinityScore<'a>>
where
    I: IntoIterator<Item = &'a Post>,
{
    let interests = interests(profile);
    let mut scored: Vec<AffinityScore<'a>> = posts
        .into_iter()
        .filter(|p| p.author_id != profile.id && profile.in_era(&p.era))
        .map(|p| score_with(profile, &interests, p, connected, w))
        .filter(|s| s.score > 0.0)
        .collect();
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.post.canonical_cmp(b.post))
    });
    scored.truncate(w.limit);
    scored
}

impl Engine {
    /// Posts `profile_id` would most plausibly have liked; `None` for an unknown profile.
    pub fn simulated_likes(&self, profile_id: &str) -> Option<Vec<AffinityScore<'_>>> {
        let profile = self.profile(profile_id)?;
        let connected = self.connected_ids(profile_id);
        Some(affinity_ranking(
            profile,
            self.corpus().posts(),
            &connected,
            &self.options().affinity,
        ))
    }
}
