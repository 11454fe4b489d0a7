// src/notify/synth.rs
//! One notification run: today's historical events, new posts from followed
//! profiles, trending liked posts, and the one-off activity milestone.
//!
//! Every generated id is deterministic, so replaying a run against its own output adds
//! nothing. Runs are throttled to one per calendar day.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use super::{DailyThrottle, Notification, NotificationKind};
use crate::corpus::Corpus;
use crate::engine::Engine;
use crate::model::{HistoricalEvent, Post};

pub const MILESTONE_ID: &str = "milestone-active-user";

const SNIPPET_CHARS: usize = 100;

/// Caps and thresholds (`[notifications]` in the engine config).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationLimits {
    /// Length of the stored list after a run; oldest entries are evicted.
    pub max_stored: usize,
    pub max_new_posts: usize,
    pub max_trending: usize,
    /// A liked post trends when its likes exceed this.
    pub trending_min_likes: u64,
    pub milestone_min_follows: usize,
    pub milestone_min_likes: usize,
}

impl Default for NotificationLimits {
    fn default() -> Self {
        Self {
            max_stored: 50,
            max_new_posts: 3,
            max_trending: 2,
            trending_min_likes: 50,
            milestone_min_follows: 5,
            milestone_min_likes: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    #[serde(default)]
    pub followed: Vec<String>,
    #[serde(default)]
    pub liked: Vec<String>,
    #[serde(default = "Utc::now")]
    pub now: DateTime<Utc>,
    #[serde(default)]
    pub existing: Vec<Notification>,
    #[serde(default)]
    pub last_generated: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOutcome {
    pub notifications: Vec<Notification>,
    pub last_generated: Option<NaiveDate>,
    /// Newly generated this run.
    pub added: usize,
    /// Run suppressed by the daily throttle.
    pub skipped: bool,
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "notifications_generated_total",
            "Notifications produced by synthesis runs."
        );
    });
}

fn snippet(text: &str) -> String {
    let mut out: String = text.chars().take(SNIPPET_CHARS).collect();
    if text.chars().count() > SNIPPET_CHARS {
        out.push('…');
    }
    out
}

fn base(id: String, kind: NotificationKind, title: String, description: String, now: DateTime<Utc>) -> Notification {
    Notification {
        id,
        kind,
        title,
        description,
        timestamp: now,
        read: false,
        link: None,
        era: None,
        profile_id: None,
        post_id: None,
    }
}

fn event_notification(e: &HistoricalEvent, now: DateTime<Utc>) -> Notification {
    let description = match e.year {
        Some(y) => format!("On this day in {y}: {}", e.description),
        None => e.description.clone(),
    };
    Notification {
        link: e.link.clone(),
        era: e.era.clone(),
        ..base(
            format!("event-{}-{}", e.id, now.year()),
            NotificationKind::Event,
            e.title.clone(),
            description,
            now,
        )
    }
}

fn new_post_notification(corpus: &Corpus, p: &Post, now: DateTime<Utc>) -> Notification {
    let author = corpus
        .profile(&p.author_id)
        .map_or(p.author_id.as_str(), |a| a.display_name.as_str());
    Notification {
        link: Some(format!("/post/{}", p.id)),
        era: Some(p.era.clone()),
        profile_id: Some(p.author_id.clone()),
        post_id: Some(p.id.clone()),
        ..base(
            format!("newpost-{}", p.id),
            NotificationKind::NewPost,
            format!("New post from {author}"),
            snippet(&p.content),
            now,
        )
    }
}

fn trending_notification(p: &Post, now: DateTime<Utc>) -> Notification {
    Notification {
        link: Some(format!("/post/{}", p.id)),
        era: Some(p.era.clone()),
        profile_id: Some(p.author_id.clone()),
        post_id: Some(p.id.clone()),
        ..base(
            format!("trending-{}", p.id),
            NotificationKind::Trending,
            "A post you liked is trending".to_string(),
            format!("{} likes: {}", p.likes, snippet(&p.content)),
            now,
        )
    }
}

fn milestone_notification(follows: usize, likes: usize, now: DateTime<Utc>) -> Notification {
    base(
        MILESTONE_ID.to_string(),
        NotificationKind::Milestone,
        "Active historian".to_string(),
        format!("You follow {follows} figures and liked {likes} posts."),
        now,
    )
}

/// Run one synthesis pass over `corpus`.
pub fn synthesize(corpus: &Corpus, req: NotificationRequest, limits: &NotificationLimits) -> NotificationOutcome {
    ensure_metrics_described();
    let today = req.now.date_naive();
    let mut throttle = DailyThrottle::new(req.last_generated);

    if !throttle.should_generate(today) {
        debug!(target: "notify", %today, "already generated today");
        return NotificationOutcome {
            notifications: req.existing,
            last_generated: throttle.last_run(),
            added: 0,
            skipped: true,
        };
    }

    let now = req.now;
    let mut present: HashSet<String> = req.existing.iter().map(|n| n.id.clone()).collect();
    let mut fresh: Vec<Notification> = Vec::new();
    let mut push = |n: Notification, fresh: &mut Vec<Notification>| {
        if present.insert(n.id.clone()) {
            fresh.push(n);
        }
    };

    let month_day = today.format("%m-%d").to_string();
    for e in corpus.events_on(&month_day) {
        push(event_notification(e, now), &mut fresh);
    }

    let followed: HashSet<&str> = req.followed.iter().map(String::as_str).collect();
    let new_posts = corpus
        .posts()
        .iter()
        .filter(|p| followed.contains(p.author_id.as_str()))
        .take(limits.max_new_posts);
    for p in new_posts {
        push(new_post_notification(corpus, p, now), &mut fresh);
    }

    let trending = req
        .liked
        .iter()
        .filter_map(|id| corpus.post(id))
        .filter(|p| p.likes > limits.trending_min_likes)
        .take(limits.max_trending);
    for p in trending {
        push(trending_notification(p, now), &mut fresh);
    }

    if req.followed.len() >= limits.milestone_min_follows
        && req.liked.len() >= limits.milestone_min_likes
    {
        push(
            milestone_notification(req.followed.len(), req.liked.len(), now),
            &mut fresh,
        );
    }

    let added = fresh.len();
    let mut notifications = fresh;
    notifications.extend(req.existing);
    notifications.truncate(limits.max_stored);
    throttle.record(today);

    counter!("notifications_generated_total").increment(added as u64);
    info!(target: "notify", %today, added, stored = notifications.len(), "notifications generated");

    NotificationOutcome {
        notifications,
        last_generated: throttle.last_run(),
        added,
        skipped: false,
    }
}

impl Engine {
    pub fn generate_notifications(&self, req: NotificationRequest) -> NotificationOutcome {
        synthesize(self.corpus(), req, &self.options().notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let long = "é".repeat(SNIPPET_CHARS + 5);
        let s = snippet(&long);
        assert_eq!(s.chars().count(), SNIPPET_CHARS + 1);
        assert!(s.ends_with('…'));
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn default_limits() {
        let l = NotificationLimits::default();
        assert_eq!((l.max_stored, l.max_new_posts, l.max_trending), (50, 3, 2));
        assert_eq!(l.trending_min_likes, 50);
    }
}
