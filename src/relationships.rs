// src/relationships.rs
//! Relationship graph resolver.
//!
//! Edges live on their source profile. Incoming edges are answered from a reverse
//! adjacency index built once at load time, so a profile's connection view costs
//! O(out-degree + in-degree) instead of a scan over every profile.
//!
//! Incoming entries keep the type declared by the source by default: a `mentor` edge
//! from A to B shows up on B's view as an incoming `mentor` entry for A.
//! `IncomingTypes::Inverted` maps it through [`RelationshipType::inverse`] instead, so
//! B's view labels A as `student`.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::corpus::Corpus;
use crate::engine::Engine;
use crate::model::{Profile, Relationship, RelationshipType};

/// How incoming edges report their type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomingTypes {
    /// The type exactly as declared by the source profile.
    #[default]
    Declared,
    /// The inverse type (mentor ↔ student; other types are symmetric).
    Inverted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// Position of an edge: `profiles[source].relationships[edge]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRef {
    pub source: usize,
    pub edge: usize,
}

/// Target profile id → edges pointing at it, in source load order.
#[derive(Debug, Default)]
pub struct ReverseIndex {
    by_target: HashMap<String, Vec<EdgeRef>>,
}

impl ReverseIndex {
    pub fn build(profiles: &[Profile]) -> Self {
        let mut by_target: HashMap<String, Vec<EdgeRef>> = HashMap::new();
        for (source, p) in profiles.iter().enumerate() {
            for (edge, r) in p.relationships.iter().enumerate() {
                by_target
                    .entry(r.target_profile_id.clone())
                    .or_default()
                    .push(EdgeRef { source, edge });
            }
        }
        Self { by_target }
    }

    pub fn incoming(&self, target: &str) -> &[EdgeRef] {
        self.by_target.get(target).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One entry in a profile's connection view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// The profile on the other end.
    pub profile_id: String,
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    /// Type as written on the source profile (equals `kind` unless inverted).
    pub declared_type: RelationshipType,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
}

impl Connection {
    fn outgoing(r: &Relationship) -> Self {
        Self {
            profile_id: r.target_profile_id.clone(),
            kind: r.kind,
            declared_type: r.kind,
            direction: Direction::Outgoing,
            description: r.description.clone(),
            since: r.since.clone(),
            until: r.until.clone(),
        }
    }

    fn incoming(source_id: &str, r: &Relationship, mode: IncomingTypes) -> Self {
        let kind = match mode {
            IncomingTypes::Declared => r.kind,
            IncomingTypes::Inverted => r.kind.inverse(),
        };
        Self {
            profile_id: source_id.to_string(),
            kind,
            declared_type: r.kind,
            direction: Direction::Incoming,
            description: r.description.clone(),
            since: r.since.clone(),
            until: r.until.clone(),
        }
    }
}

/// Connections of one type, duplicates collapsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionGroup {
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    pub connections: Vec<Connection>,
}

/// Outgoing edges first (declared order), then incoming (source load order).
pub fn connected_profiles(corpus: &Corpus, profile_id: &str, mode: IncomingTypes) -> Vec<Connection> {
    let mut out: Vec<Connection> = corpus
        .profile(profile_id)
        .map(|p| p.relationships.iter().map(Connection::outgoing).collect())
        .unwrap_or_default();

    let profiles = corpus.profiles();
    for r in corpus.reverse_index().incoming(profile_id) {
        let source = &profiles[r.source];
        out.push(Connection::incoming(
            &source.id,
            &source.relationships[r.edge],
            mode,
        ));
    }
    out
}

/// Group by type in display priority; a profile appears at most once per group.
pub fn group_connections(connections: Vec<Connection>) -> Vec<ConnectionGroup> {
    let mut groups: Vec<ConnectionGroup> = RelationshipType::PRIORITY
        .iter()
        .map(|&kind| ConnectionGroup {
            kind,
            connections: Vec::new(),
        })
        .collect();
    let mut seen: HashSet<(RelationshipType, String)> = HashSet::new();

    for c in connections {
        if !seen.insert((c.kind, c.profile_id.clone())) {
            continue;
        }
        groups[c.kind.priority()].connections.push(c);
    }
    groups.retain(|g| !g.connections.is_empty());
    groups
}

impl Engine {
    /// Outgoing edges only; empty for unknown profiles.
    pub fn relationships(&self, profile_id: &str) -> &[Relationship] {
        self.corpus()
            .profile(profile_id)
            .map(|p| p.relationships.as_slice())
            .unwrap_or(&[])
    }

    pub fn connected_profiles(&self, profile_id: &str) -> Vec<Connection> {
        connected_profiles(self.corpus(), profile_id, self.options().incoming_types)
    }

    pub fn grouped_connections(&self, profile_id: &str) -> Vec<ConnectionGroup> {
        group_connections(self.connected_profiles(profile_id))
    }

    /// `a`'s declaration wins; otherwise `b`'s edge back to `a`.
    pub fn relationship_between(&self, a: &str, b: &str) -> Option<&Relationship> {
        let find = |from: &str, to: &str| {
            self.corpus()
                .profile(from)
                .and_then(|p| p.relationships.iter().find(|r| r.target_profile_id == to))
        };
        find(a, b).or_else(|| find(b, a))
    }

    /// Ids on the other end of any edge touching `profile_id`, either direction.
    pub fn connected_ids(&self, profile_id: &str) -> HashSet<&str> {
        let corpus = self.corpus();
        let mut ids: HashSet<&str> = corpus
            .profile(profile_id)
            .map(|p| {
                p.relationships
                    .iter()
                    .map(|r| r.target_profile_id.as_str())
                    .collect()
            })
            .unwrap_or_default();
        let profiles = corpus.profiles();
        for r in corpus.reverse_index().incoming(profile_id) {
            ids.insert(profiles[r.source].id.as_str());
        }
        ids
    }
}
