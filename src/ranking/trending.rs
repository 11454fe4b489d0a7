// src/ranking/trending.rs
//! Hashtag aggregation: plain occurrence counts and trend-scored rankings.
//!
//! Tags are compared case-insensitively without the leading `#`, and a tag counts once
//! per post. Reported tags use the lower-cased key.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::engine::Engine;
use crate::model::{tag_key, Post};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingHashtag<'a> {
    pub tag: String,
    pub post_count: usize,
    pub total_likes: u64,
    pub total_comments: u64,
    pub trend_score: u64,
    /// Most-liked post carrying the tag (canonical order on ties).
    pub top_post: &'a Post,
}

struct Agg<'a> {
    count: usize,
    likes: u64,
    comments: u64,
    top: &'a Post,
}

fn post_tags(p: &Post) -> HashSet<String> {
    p.hashtags
        .iter()
        .map(|h| tag_key(h))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Tag occurrence counts, descending (tag ascending on ties).
pub fn tag_counts<'a, I>(posts: I, limit: usize) -> Vec<TagCount>
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for p in posts {
        for t in post_tags(p) {
            *counts.entry(t).or_insert(0) += 1;
        }
    }
    let mut out: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    out.truncate(limit);
    out
}

/// Top `limit` tags by trend score, descending (tag ascending on ties).
pub fn trending_hashtags<'a, I>(posts: I, limit: usize) -> Vec<TrendingHashtag<'a>>
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut aggs: HashMap<String, Agg<'a>> = HashMap::new();
    for p in posts {
        for t in post_tags(p) {
            let a = aggs.entry(t).or_insert(Agg {
                count: 0,
                likes: 0,
                comments: 0,
                top: p,
            });
            a.count += 1;
            a.likes = a.likes.saturating_add(p.likes);
            a.comments = a.comments.saturating_add(p.comments);
            let better = p.likes > a.top.likes
                || (p.likes == a.top.likes && p.canonical_cmp(a.top).is_lt());
            if better {
                a.top = p;
            }
        }
    }

    let mut out: Vec<TrendingHashtag<'a>> = aggs
        .into_iter()
        .map(|(tag, a)| TrendingHashtag {
            tag,
            post_count: a.count,
            total_likes: a.likes,
            total_comments: a.comments,
            trend_score: a.likes.saturating_add(a.comments.saturating_mul(2)),
            top_post: a.top,
        })
        .collect();
    out.sort_by(|a, b| {
        b.trend_score
            .cmp(&a.trend_score)
            .then_with(|| a.tag.cmp(&b.tag))
    });
    out.truncate(limit);
    out
}

impl Engine {
    /// Most used tags across the corpus.
    pub fn trending(&self, limit: usize) -> Vec<TagCount> {
        tag_counts(self.corpus().posts(), limit)
    }

    /// Trend-scored tags, optionally restricted to one era.
    pub fn trending_hashtags(&self, era: Option<&str>, limit: usize) -> Vec<TrendingHashtag<'_>> {
        let posts = self.corpus().posts().iter();
        match era {
            Some(e) => trending_hashtags(posts.filter(|p| p.era == e), limit),
            None => trending_hashtags(posts, limit),
        }
    }
}
