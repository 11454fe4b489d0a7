// src/query.rs
//! Facet filtering, free-text search and id/handle/era lookups.
//!
//! Facets combine with AND; multi-valued facets (`types`, `accuracy`) match with OR
//! inside the facet. Text matching is a case-insensitive substring test.
//!
//! Date bounds accept RFC 3339, an ISO date-time without offset (read as UTC),
//! `YYYY-MM-DD` and a bare year. Malformed filter values are dropped from the filter in lenient mode and logged at debug level; in
//! strict mode they fail the query with [`QueryError::InvalidFilter`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Engine;
use crate::error::QueryError;
use crate::model::{tag_key, Accuracy, Era, Post, PostType, Profile};

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d{1,4}$").expect("year regex"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostFilters {
    pub era: Option<String>,
    /// Inclusive lower bound.
    pub start_date: Option<String>,
    /// Inclusive upper bound; a date without time covers the whole day (or year).
    pub end_date: Option<String>,
    pub author_id: Option<String>,
    /// Empty = any type.
    pub types: Vec<PostType>,
    /// Empty = any accuracy.
    pub accuracy: Vec<Accuracy>,
    pub hashtag: Option<String>,
    pub search: Option<String>,
}

impl PostFilters {
    pub fn era(mut self, era: impl Into<String>) -> Self {
        self.era = Some(era.into());
        self
    }

    pub fn author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    pub fn between(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_date = Some(start.into());
        self.end_date = Some(end.into());
        self
    }

    pub fn types(mut self, types: impl IntoIterator<Item = PostType>) -> Self {
        self.types = types.into_iter().collect();
        self
    }

    pub fn accuracy(mut self, levels: impl IntoIterator<Item = Accuracy>) -> Self {
        self.accuracy = levels.into_iter().collect();
        self
    }

    pub fn hashtag(mut self, tag: impl Into<String>) -> Self {
        self.hashtag = Some(tag.into());
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Edge {
    Start,
    End,
}

/// Parse a date filter bound. `None` when the input is not a recognizable date.
pub(crate) fn parse_date_bound(raw: &str, edge: Edge) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    let day = if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Some((d, d))
    } else if YEAR_RE.is_match(s) {
        let y: i32 = s.parse().ok()?;
        Some((
            NaiveDate::from_ymd_opt(y, 1, 1)?,
            NaiveDate::from_ymd_opt(y, 12, 31)?,
        ))
    } else {
        None
    }?;
    let dt = match edge {
        Edge::Start => day.0.and_time(NaiveTime::MIN),
        Edge::End => day.1.and_hms_milli_opt(23, 59, 59, 999)?,
    };
    Some(dt.and_utc())
}

/// Lower-cased needle; `None` for absent or blank input.
fn needle(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn contains_ci(haystack: &str, needle_lc: &str) -> bool {
    haystack.to_lowercase().contains(needle_lc)
}

pub(crate) fn post_matches_text(p: &Post, needle_lc: &str) -> bool {
    contains_ci(&p.content, needle_lc)
        || p.title.as_deref().is_some_and(|t| contains_ci(t, needle_lc))
        || p.hashtags.iter().any(|h| contains_ci(h, needle_lc))
}

fn profile_matches_text(p: &Profile, needle_lc: &str) -> bool {
    contains_ci(&p.name, needle_lc)
        || contains_ci(&p.display_name, needle_lc)
        || contains_ci(&p.handle, needle_lc)
        || contains_ci(&p.bio, needle_lc)
}

fn era_matches_text(e: &Era, needle_lc: &str) -> bool {
    contains_ci(&e.name, needle_lc) || contains_ci(&e.description, needle_lc)
}

/// Result of the site-wide search box; each list capped independently.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults<'a> {
    pub posts: Vec<&'a Post>,
    pub profiles: Vec<&'a Profile>,
    pub eras: Vec<&'a Era>,
}

impl SearchResults<'_> {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.profiles.is_empty() && self.eras.is_empty()
    }
}

impl Engine {
    fn date_bound(
        &self,
        field: &'static str,
        raw: Option<&str>,
        edge: Edge,
    ) -> Result<Option<DateTime<Utc>>, QueryError> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        match parse_date_bound(raw, edge) {
            Some(dt) => Ok(Some(dt)),
            None if self.options().strict => Err(QueryError::InvalidFilter {
                field,
                value: raw.to_string(),
            }),
            None => {
                debug!(target: "query", field, value = raw, "ignoring unparseable date filter");
                Ok(None)
            }
        }
    }

    /// Posts satisfying every facet, canonical order.
    pub fn posts(&self, filters: &PostFilters) -> Result<Vec<&Post>, QueryError> {
        let start = self.date_bound("startDate", filters.start_date.as_deref(), Edge::Start)?;
        let end = self.date_bound("endDate", filters.end_date.as_deref(), Edge::End)?;
        let text = needle(filters.search.as_deref());
        let tag = filters
            .hashtag
            .as_deref()
            .map(tag_key)
            .filter(|t| !t.is_empty());
        let era = filters.era.as_deref().filter(|s| !s.is_empty());
        let author = filters.author_id.as_deref().filter(|s| !s.is_empty());

        // Corpus storage is already in canonical order; filtering preserves it.
        let out = self
            .corpus()
            .posts()
            .iter()
            .filter(|p| era.map_or(true, |e| p.era == e))
            .filter(|p| author.map_or(true, |a| p.author_id == a))
            .filter(|p| start.map_or(true, |s| p.timestamp >= s))
            .filter(|p| end.map_or(true, |e| p.timestamp <= e))
            .filter(|p| filters.types.is_empty() || filters.types.contains(&p.kind))
            .filter(|p| filters.accuracy.is_empty() || filters.accuracy.contains(&p.accuracy))
            .filter(|p| {
                tag.as_deref()
                    .map_or(true, |t| p.hashtags.iter().any(|h| tag_key(h) == t))
            })
            .filter(|p| text.as_deref().map_or(true, |n| post_matches_text(p, n)))
            .collect();
        Ok(out)
    }

    pub fn post(&self, id: &str) -> Option<&Post> {
        self.corpus().post(id)
    }

    pub fn profiles(&self) -> &[Profile] {
        self.corpus().profiles()
    }

    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.corpus().profile(id)
    }

    pub fn profile_by_handle(&self, handle: &str) -> Option<&Profile> {
        self.corpus().profile_by_handle(handle)
    }

    pub fn profiles_by_era(&self, era_id: &str) -> Vec<&Profile> {
        self.corpus()
            .profiles()
            .iter()
            .filter(|p| p.in_era(era_id))
            .collect()
    }

    pub fn posts_by_author(&self, author_id: &str) -> Vec<&Post> {
        self.corpus().posts_by_author(author_id)
    }

    pub fn eras(&self) -> &[Era] {
        self.corpus().eras()
    }

    pub fn era(&self, id: &str) -> Option<&Era> {
        self.corpus().era(id)
    }

    /// Posts of a thread by position; unpositioned posts last, then canonical order.
    pub fn thread(&self, thread_id: &str) -> Vec<&Post> {
        let mut out: Vec<&Post> = self
            .corpus()
            .posts()
            .iter()
            .filter(|p| p.thread_id.as_deref() == Some(thread_id))
            .collect();
        out.sort_by(|a, b| match (a.thread_position, b.thread_position) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.canonical_cmp(b)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.canonical_cmp(b),
        });
        out
    }

    /// Direct replies, canonical order.
    pub fn replies(&self, post_id: &str) -> Vec<&Post> {
        self.corpus()
            .posts()
            .iter()
            .filter(|p| p.reply_to_id.as_deref() == Some(post_id))
            .collect()
    }

    /// Posts, profiles and eras matching `query`, each list truncated to `limit`.
    /// A blank query matches nothing.
    pub fn search(&self, query: &str, limit: usize) -> SearchResults<'_> {
        let Some(n) = needle(Some(query)) else {
            return SearchResults::default();
        };
        let corpus = self.corpus();
        SearchResults {
            posts: corpus
                .posts()
                .iter()
                .filter(|p| post_matches_text(p, &n))
                .take(limit)
                .collect(),
            profiles: corpus
                .profiles()
                .iter()
                .filter(|p| profile_matches_text(p, &n))
                .take(limit)
                .collect(),
            eras: corpus
                .eras()
                .iter()
                .filter(|e| era_matches_text(e, &n))
                .take(limit)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_bounds_accept_three_shapes() {
        let start = parse_date_bound("1776-07-04", Edge::Start).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(1776, 7, 4, 0, 0, 0).unwrap());

        let end = parse_date_bound("1776-07-04", Edge::End).unwrap();
        assert!(end > Utc.with_ymd_and_hms(1776, 7, 4, 23, 59, 59).unwrap());
        assert!(end < Utc.with_ymd_and_hms(1776, 7, 5, 0, 0, 0).unwrap());

        let year_end = parse_date_bound("1776", Edge::End).unwrap();
        assert!(year_end > Utc.with_ymd_and_hms(1776, 12, 31, 23, 0, 0).unwrap());

        let instant = parse_date_bound("1776-07-04T12:00:00+02:00", Edge::End).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(1776, 7, 4, 10, 0, 0).unwrap());
    }

    #[test]
    fn offsetless_instants_read_as_utc() {
        let want = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for raw in ["2024-01-01T00:00:00", "2024-01-01 00:00:00", "2024-01-01T00:00"] {
            assert_eq!(parse_date_bound(raw, Edge::Start), Some(want), "{raw}");
            assert_eq!(parse_date_bound(raw, Edge::End), Some(want), "{raw}");
        }
        let frac = parse_date_bound("1776-07-04T12:30:00.250", Edge::Start).unwrap();
        let base = Utc.with_ymd_and_hms(1776, 7, 4, 12, 30, 0).unwrap();
        assert_eq!(frac, base + chrono::Duration::milliseconds(250));
    }

    #[test]
    fn garbage_dates_do_not_parse() {
        assert!(parse_date_bound("next tuesday", Edge::Start).is_none());
        assert!(parse_date_bound("1776-13-40", Edge::Start).is_none());
    }

    #[test]
    fn blank_needles_are_absent() {
        assert_eq!(needle(Some("   ")), None);
        assert_eq!(needle(Some(" Tea ")), Some("tea".into()));
    }
}
