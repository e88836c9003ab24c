//! In-memory graph store.
//!
//! One `GraphState` lives for the whole session and is mutated in place by
//! every reconciliation, so nodes that survive a re-focus keep their last
//! laid-out geometry as a hint for the next layout.

use crate::models::{EntityId, EntityKind};
use crate::{NODE_SEPARATION, RANK_SEPARATION};
use std::collections::{BTreeMap, BTreeSet};

pub const DIM_CLASS: &str = "dim";

pub type ClassSet = BTreeSet<&'static str>;

// ============================================================================
// Node and Edge Types
// ============================================================================

/// Extra space around a node label, used by the layout engine to size the
/// ellipse.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub x: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Center and bounding box of a node from the most recent layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: EntityId,
    pub label: String,
    pub is_focus: bool,
    pub classes: ClassSet,
    pub stamp: u64,
    pub padding: Padding,
    pub geometry: Option<NodeGeometry>,
}

impl Node {
    pub fn kind(&self) -> EntityKind {
        self.id.kind()
    }

    pub fn is_dim(&self) -> bool {
        self.classes.contains(DIM_CLASS)
    }
}

/// Undirected edge identity: the endpoint pair in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(EntityId, EntityId);

impl EdgeKey {
    pub fn new(a: EntityId, b: EntityId) -> Self {
        if a <= b {
            EdgeKey(a, b)
        } else {
            EdgeKey(b, a)
        }
    }

    pub fn endpoints(&self) -> (EntityId, EntityId) {
        (self.0, self.1)
    }

    pub fn touches(&self, id: EntityId) -> bool {
        self.0 == id || self.1 == id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: EntityId,
    pub target: EntityId,
    pub touches_focus: bool,
    pub classes: ClassSet,
    pub weight: u32,
    pub stamp: u64,
}

impl Edge {
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.source, self.target)
    }

    pub fn is_dim(&self) -> bool {
        self.classes.contains(DIM_CLASS)
    }
}

// ============================================================================
// Layout Hints
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDir {
    LeftRight,
    TopBottom,
}

/// Graph-level hints handed to the layout engine; constant for a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutHints {
    pub rankdir: RankDir,
    pub ranksep: f64,
    pub nodesep: f64,
}

impl Default for LayoutHints {
    fn default() -> Self {
        Self {
            rankdir: RankDir::LeftRight,
            ranksep: RANK_SEPARATION,
            nodesep: NODE_SEPARATION,
        }
    }
}

// ============================================================================
// Graph State
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct GraphState {
    pub(crate) nodes: BTreeMap<EntityId, Node>,
    pub(crate) edges: BTreeMap<EdgeKey, Edge>,
    pub(crate) focus: Option<EntityId>,
    pub(crate) current_stamp: u64,
    pub(crate) hints: LayoutHints,
}

impl GraphState {
    pub fn new(hints: LayoutHints) -> Self {
        Self {
            hints,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: EntityId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Look up an edge regardless of endpoint order.
    pub fn edge(&self, a: EntityId, b: EntityId) -> Option<&Edge> {
        self.edges.get(&EdgeKey::new(a, b))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn focus(&self) -> Option<EntityId> {
        self.focus
    }

    pub fn current_stamp(&self) -> u64 {
        self.current_stamp
    }

    pub fn hints(&self) -> &LayoutHints {
        &self.hints
    }

    /// Record the geometry the layout engine chose for a node.
    pub fn set_geometry(&mut self, id: EntityId, geometry: NodeGeometry) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.geometry = Some(geometry);
        }
    }
}
