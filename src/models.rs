//! Data models for the tune graph viewer.
//!
//! Entity identifiers and the wire shapes exchanged with the neighborhood
//! endpoint. Graph-store types live in `graph`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Entity Identifiers
// ============================================================================

/// The three kinds of entity that appear in a tune graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Song,
    Title,
    Instance,
}

impl EntityKind {
    /// One-character tag used in textual ids (`s803`, `t12`, `i7`).
    pub fn tag(self) -> char {
        match self {
            EntityKind::Song => 's',
            EntityKind::Title => 't',
            EntityKind::Instance => 'i',
        }
    }

    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            's' => Some(EntityKind::Song),
            't' => Some(EntityKind::Title),
            'i' => Some(EntityKind::Instance),
            _ => None,
        }
    }

    /// Prefix of a node label, e.g. `"Song "`.
    pub fn label_prefix(self) -> &'static str {
        match self {
            EntityKind::Song => "Song ",
            EntityKind::Title => "Title ",
            EntityKind::Instance => "Instance ",
        }
    }

    /// Style class tag carried by every node of this kind.
    pub fn class_tag(self) -> &'static str {
        match self {
            EntityKind::Song => "song",
            EntityKind::Title => "title",
            EntityKind::Instance => "instance",
        }
    }

    /// Path segment of the entity's detail page.
    pub fn route(self) -> &'static str {
        match self {
            EntityKind::Song => "song",
            EntityKind::Title => "title",
            EntityKind::Instance => "instance",
        }
    }
}

/// A song, title or instance, identified by its numeric database id.
///
/// Numeric ids are unique within a kind; the kind tag keeps them unique
/// across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityId {
    Song(u64),
    Title(u64),
    Instance(u64),
}

impl EntityId {
    pub fn new(kind: EntityKind, number: u64) -> Self {
        match kind {
            EntityKind::Song => EntityId::Song(number),
            EntityKind::Title => EntityId::Title(number),
            EntityKind::Instance => EntityId::Instance(number),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityId::Song(_) => EntityKind::Song,
            EntityId::Title(_) => EntityKind::Title,
            EntityId::Instance(_) => EntityKind::Instance,
        }
    }

    pub fn number(&self) -> u64 {
        match *self {
            EntityId::Song(n) | EntityId::Title(n) | EntityId::Instance(n) => n,
        }
    }

    /// Human-readable label, e.g. `Song 803`.
    pub fn label(&self) -> String {
        format!("{}{}", self.kind().label_prefix(), self.number())
    }

    /// Detail page of the entity, e.g. `/song/803/`.
    pub fn detail_href(&self) -> String {
        format!("/{}/{}/", self.kind().route(), self.number())
    }

    /// Graph page centered on the entity, e.g. `/graph/s803/`.
    pub fn graph_href(&self) -> String {
        format!("/graph/{}/", self)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind().tag(), self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity id '{0}'")]
pub struct InvalidEntityId(pub String);

impl FromStr for EntityId {
    type Err = InvalidEntityId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let kind = chars
            .next()
            .and_then(EntityKind::from_tag)
            .ok_or_else(|| InvalidEntityId(s.to_string()))?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidEntityId(s.to_string()));
        }
        let number = digits
            .parse::<u64>()
            .map_err(|_| InvalidEntityId(s.to_string()))?;
        Ok(EntityId::new(kind, number))
    }
}

impl TryFrom<String> for EntityId {
    type Error = InvalidEntityId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}

// ============================================================================
// Neighborhood Wire Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadNode {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadLink {
    pub source: EntityId,
    pub target: EntityId,
}

/// Nodes and links around one focus entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodPayload {
    #[serde(default)]
    pub nodes: Vec<PayloadNode>,
    #[serde(default)]
    pub links: Vec<PayloadLink>,
}

/// Body of a neighborhood response: either a payload or
/// `{"error": true, "description": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct NeighborhoodResponse {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub payload: NeighborhoodPayload,
}

impl NeighborhoodResponse {
    /// Split into the payload or the server-supplied failure description.
    pub fn into_result(self) -> Result<NeighborhoodPayload, String> {
        if self.error {
            Err(self
                .description
                .unwrap_or_else(|| "no description given".to_string()))
        } else {
            Ok(self.payload)
        }
    }
}
