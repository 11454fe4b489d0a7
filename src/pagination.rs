// src/pagination.rs
//! Cursor pagination over the canonical post order.
//!
//! The cursor is the id of the last post the caller has seen. Segments are only stable
//! while the corpus is unchanged; every segment carries the corpus version so a caller
//! can detect that its cursor was cut from a different dataset.

use metrics::counter;
use serde::Serialize;
use tracing::debug;

use crate::engine::Engine;
use crate::error::QueryError;
use crate::model::Post;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSegment<'a> {
    /// Cursor the segment was requested with (after stale-cursor fallback).
    pub cursor: Option<String>,
    pub posts: Vec<&'a Post>,
    pub has_more: bool,
    /// Id of the last returned post while more remain.
    pub next_cursor: Option<String>,
    pub corpus_version: String,
}

impl Engine {
    /// Next `limit` posts after `cursor` (or from the top without one).
    ///
    /// Unknown cursors restart from the top in lenient mode and fail with
    /// [`QueryError::UnknownCursor`] in strict mode. `limit` is clamped to at least 1.
    pub fn feed_segment(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<FeedSegment<'_>, QueryError> {
        let corpus = self.corpus();
        let posts = corpus.posts();
        let limit = limit.max(1);
        let cursor = cursor.map(str::trim).filter(|c| !c.is_empty());

        let (start, effective) = match cursor {
            None => (0, None),
            Some(c) => match corpus.post_position(c) {
                Some(i) => (i + 1, Some(c.to_string())),
                None if self.options().strict => {
                    return Err(QueryError::UnknownCursor(c.to_string()))
                }
                None => {
                    debug!(target: "feed", cursor = c, "unknown cursor, restarting from the top");
                    counter!("feed_stale_cursor_total").increment(1);
                    (0, None)
                }
            },
        };

        let end = start.saturating_add(limit).min(posts.len());
        let page: Vec<&Post> = posts[start.min(end)..end].iter().collect();
        let has_more = end < posts.len();
        let next_cursor = if has_more {
            page.last().map(|p| p.id.clone())
        } else {
            None
        };

        Ok(FeedSegment {
            cursor: effective,
            posts: page,
            has_more,
            next_cursor,
            corpus_version: corpus.version().to_string(),
        })
    }
}
