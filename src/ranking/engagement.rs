// src/ranking/engagement.rs
//! Engagement rankings: top posts, top profiles, suggested profiles.

use serde::Serialize;
use std::collections::HashMap;

use super::engagement_score;
use crate::engine::Engine;
use crate::model::{Post, Profile};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPost<'a> {
    pub post: &'a Post,
    pub engagement_score: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedProfile<'a> {
    pub profile: &'a Profile,
    pub post_count: usize,
    pub engagement_score: u64,
}

/// Highest engagement first; canonical order on ties.
pub fn top_posts<'a, I>(posts: I, limit: usize) -> Vec<RankedPost<'a>>
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut ranked: Vec<RankedPost<'a>> = posts
        .into_iter()
        .map(|post| RankedPost {
            post,
            engagement_score: engagement_score(post),
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.engagement_score
            .cmp(&a.engagement_score)
            .then_with(|| a.post.canonical_cmp(b.post))
    });
    ranked.truncate(limit);
    ranked
}

/// Profiles by summed engagement of their posts. Profiles without posts are left out;
/// ties go to the lower profile id.
pub fn top_profiles<'a>(profiles: &'a [Profile], posts: &[Post], limit: usize) -> Vec<RankedProfile<'a>> {
    let mut totals: HashMap<&str, (usize, u64)> = HashMap::new();
    for p in posts {
        let t = totals.entry(p.author_id.as_str()).or_insert((0, 0));
        t.0 += 1;
        t.1 = t.1.saturating_add(engagement_score(p));
    }

    let mut ranked: Vec<RankedProfile<'a>> = profiles
        .iter()
        .filter_map(|profile| {
            totals
                .get(profile.id.as_str())
                .map(|&(post_count, engagement_score)| RankedProfile {
                    profile,
                    post_count,
                    engagement_score,
                })
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.engagement_score
            .cmp(&a.engagement_score)
            .then_with(|| a.profile.id.cmp(&b.profile.id))
    });
    ranked.truncate(limit);
    ranked
}

/// Verified profiles by follower count; ties go to the lower id.
pub fn suggested_profiles(profiles: &[Profile], limit: usize) -> Vec<&Profile> {
    let mut out: Vec<&Profile> = profiles.iter().filter(|p| p.is_verified).collect();
    out.sort_by(|a, b| b.followers.cmp(&a.followers).then_with(|| a.id.cmp(&b.id)));
    out.truncate(limit);
    out
}

impl Engine {
    pub fn top_posts(&self, era: Option<&str>, limit: usize) -> Vec<RankedPost<'_>> {
        let posts = self.corpus().posts().iter();
        match era {
            Some(e) => top_posts(posts.filter(|p| p.era == e), limit),
            None => top_posts(posts, limit),
        }
    }

    pub fn top_profiles(&self, limit: usize) -> Vec<RankedProfile<'_>> {
        let c = self.corpus();
        top_profiles(c.profiles(), c.posts(), limit)
    }

    pub fn suggested_profiles(&self, limit: usize) -> Vec<&Profile> {
        suggested_profiles(self.corpus().profiles(), limit)
    }
}
