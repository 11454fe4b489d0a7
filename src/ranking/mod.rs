// src/ranking/mod.rs
//! Ranking metrics. Three distinct scores, never mixed:
//!
//! - **trend score** (`likes + 2×comments`): hashtag trending only.
//! - **engagement score** (`likes + 2×comments + 3×shares`): top posts and top profiles.
//! - **affinity score**: per-profile "would have liked" heuristic, see [`affinity`].
//!
//! Counters are unbounded `u64`, so scores and sums saturate instead of overflowing.
//!
//! All rankings break ties deterministically (canonical post order, or id/tag
//! ascending), so results do not depend on the order of the input collection.

pub mod affinity;
pub mod engagement;
pub mod trending;

use crate::model::Post;

pub use affinity::{
    affinity_ranking, score_post, AffinityReason, AffinityReasonKind, AffinityScore, AffinityWeights,
};
pub use engagement::{suggested_profiles, top_posts, top_profiles, RankedPost, RankedProfile};
pub use trending::{tag_counts, trending_hashtags, TagCount, TrendingHashtag};

/// `likes + 2×comments + 3×shares`
pub fn engagement_score(p: &Post) -> u64 {
    p.likes
        .saturating_add(p.comments.saturating_mul(2))
        .saturating_add(p.shares.saturating_mul(3))
}

/// `likes + 2×comments`
pub fn trend_score(p: &Post) -> u64 {
    p.likes.saturating_add(p.comments.saturating_mul(2))
}
