//! Notification feed synthesis.
//!
//! The persisted list and the follow/like signals belong to the caller; a run takes
//! snapshots of them and hands back the new list plus the updated last-run date.

pub mod synth;
pub mod throttle;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use synth::{synthesize, NotificationLimits, NotificationOutcome, NotificationRequest};
pub use throttle::DailyThrottle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
    Mention,
    Trending,
    NewPost,
    Event,
    Milestone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Deterministic from the source (`newpost-<postId>`, `event-<eventId>-<year>`, ...).
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
}
