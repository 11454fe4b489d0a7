//! Typed corpus records: posts, profiles, eras, relationships, events.
//!
//! Field names follow the corpus JSON (camelCase). Enumerations are closed: a record
//! carrying an unknown `type` or `accuracy` never makes it past the loader.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, de::IntoDeserializer, Deserialize, Serialize};
use std::cmp::Ordering;

/// Kind of post as rendered by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    Status,
    Tweet,
    Quote,
    Photo,
    Video,
    Article,
    Event,
    Thread,
    Relationship,
    Location,
    Poll,
}

/// How well a post is backed by the historical record.
/// Variant order is the ordinal: `Speculative < … < Verified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    Speculative,
    Inferred,
    Attributed,
    Documented,
    Verified,
}

impl Accuracy {
    /// Verified or documented.
    pub fn is_well_sourced(self) -> bool {
        self >= Accuracy::Documented
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modern_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Citation backing a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCitation {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Like,
    Comment,
    Share,
}

/// Static "historical reaction" embedded in a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalInteraction {
    pub profile_id: String,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub era: String,
    pub timestamp: DateTime<Utc>,
    /// Filled from `timestamp` by the loader when the record leaves it empty.
    #[serde(default)]
    pub display_date: String,
    #[serde(rename = "type")]
    pub kind: PostType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub sources: Vec<SourceCitation>,
    pub accuracy: Accuracy,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_context: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interactions: Vec<HistoricalInteraction>,
}

impl Post {
    /// Canonical order: newest first, ties broken by ascending id.
    pub fn canonical_cmp(&self, other: &Post) -> Ordering {
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Spouse,
    Family,
    Friend,
    Ally,
    Colleague,
    Mentor,
    Student,
    Rival,
    Enemy,
}

impl RelationshipType {
    /// Display grouping order.
    pub const PRIORITY: [RelationshipType; 9] = [
        RelationshipType::Spouse,
        RelationshipType::Family,
        RelationshipType::Friend,
        RelationshipType::Ally,
        RelationshipType::Mentor,
        RelationshipType::Student,
        RelationshipType::Colleague,
        RelationshipType::Rival,
        RelationshipType::Enemy,
    ];

    /// The type as seen from the target's side of the edge.
    pub fn inverse(self) -> Self {
        match self {
            RelationshipType::Mentor => RelationshipType::Student,
            RelationshipType::Student => RelationshipType::Mentor,
            other => other,
        }
    }

    pub fn priority(self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|t| *t == self)
            .unwrap_or(Self::PRIORITY.len())
    }
}

/// Directed edge declared by the profile that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub target_profile_id: String,
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub handle: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub era: Vec<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub occupation: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Profile {
    pub fn in_era(&self, era_id: &str) -> bool {
        self.era.iter().any(|e| e == era_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Era {
    pub id: String,
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub post_count: u64,
    #[serde(default)]
    pub profile_count: u64,
}

/// "On this day" event used by the notification feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalEvent {
    pub id: String,
    /// `MM-DD`
    pub month_day: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Handle lookup key: trimmed, `@` stripped, lowercased.
pub fn handle_key(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_lowercase()
}

/// Tag comparison key: trimmed, `#` stripped, lowercased.
pub fn tag_key(tag: &str) -> String {
    tag.trim().trim_start_matches('#').to_lowercase()
}

/// Parse a snake_case enum name (e.g. `"new_post"`, `"tweet"`) into `T`.
pub fn parse_enum<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let de: serde::de::value::StrDeserializer<'_, serde::de::value::Error> =
        raw.trim().into_deserializer();
    T::deserialize(de).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(id: &str, ts: DateTime<Utc>) -> Post {
        Post {
            id: id.into(),
            author_id: "a".into(),
            era: "e".into(),
            timestamp: ts,
            display_date: String::new(),
            kind: PostType::Tweet,
            content: String::new(),
            title: None,
            hashtags: vec![],
            mentions: vec![],
            location: None,
            media: vec![],
            sources: vec![],
            accuracy: Accuracy::Inferred,
            likes: 0,
            comments: 0,
            shares: 0,
            thread_id: None,
            thread_position: None,
            reply_to_id: None,
            historical_context: None,
            interactions: vec![],
        }
    }

    #[test]
    fn canonical_order_newest_first_then_id() {
        let t1 = Utc.with_ymd_and_hms(1776, 7, 4, 12, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(1776, 7, 5, 12, 0, 0).unwrap();
        let mut v = vec![post("b", t1), post("c", t2), post("a", t1)];
        v.sort_by(Post::canonical_cmp);
        let ids: Vec<_> = v.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn accuracy_is_ordinal() {
        assert!(Accuracy::Verified > Accuracy::Documented);
        assert!(Accuracy::Documented.is_well_sourced());
        assert!(!Accuracy::Attributed.is_well_sourced());
    }

    #[test]
    fn mentor_and_student_invert() {
        assert_eq!(RelationshipType::Mentor.inverse(), RelationshipType::Student);
        assert_eq!(RelationshipType::Student.inverse(), RelationshipType::Mentor);
        assert_eq!(RelationshipType::Rival.inverse(), RelationshipType::Rival);
        assert_eq!(RelationshipType::Spouse.priority(), 0);
        assert_eq!(RelationshipType::Enemy.priority(), 8);
    }

    #[test]
    fn enum_names_parse() {
        assert_eq!(parse_enum::<PostType>("photo"), Some(PostType::Photo));
        assert_eq!(parse_enum::<Accuracy>(" verified "), Some(Accuracy::Verified));
        assert_eq!(parse_enum::<PostType>("blog"), None);
    }

    #[test]
    fn keys_ignore_prefix_and_case() {
        assert_eq!(handle_key("@Test"), handle_key("test"));
        assert_eq!(tag_key("#Liberty"), "liberty");
    }
}
