//! Reconciliation of neighborhood payloads into the graph store.
//!
//! Each call is one merge cycle: bump the freshness stamp, upsert and restyle
//! everything in the payload relative to the new focus, then drop whatever
//! the payload did not mention. Stamps are plain integers; an element is
//! current exactly when its stamp equals `GraphState::current_stamp`.

use crate::graph::{ClassSet, Edge, EdgeKey, GraphState, Node, DIM_CLASS};
use crate::models::{EntityId, NeighborhoodPayload, PayloadNode};
use crate::{
    DEFAULT_EDGE_WEIGHT, FAST_TRANSITION, FOCUS_EDGE_WEIGHT, NODE_PADDING, SLOW_TRANSITION,
};
use std::collections::btree_map::Entry;
use std::time::Duration;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod reconcile_test;

/// What one merge cycle did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    pub stamp: u64,
    pub inserted: usize,
    pub updated: usize,
    pub links: usize,
    pub pruned_nodes: usize,
    pub pruned_edges: usize,
}

impl ReconcileReport {
    /// Duration for the draw that follows. A cycle that touched any node
    /// already on screen settles slowly; a purely additive one is fast.
    pub fn transition(&self) -> Duration {
        if self.updated > 0 {
            SLOW_TRANSITION
        } else {
            FAST_TRANSITION
        }
    }
}

fn node_label(node: &PayloadNode) -> String {
    let mut label = node.id.label();
    if let Some(ref title) = node.title {
        label.push_str(&format!("\n\u{201c}{}\u{201d}", title));
    }
    label
}

fn node_classes(id: EntityId, focus: EntityId) -> ClassSet {
    let mut classes = ClassSet::new();
    classes.insert(id.kind().class_tag());
    if id != focus {
        classes.insert(DIM_CLASS);
    }
    classes
}

fn edge_classes(touches_focus: bool) -> ClassSet {
    let mut classes = ClassSet::new();
    if !touches_focus {
        classes.insert(DIM_CLASS);
    }
    classes
}

/// Merge `payload` into `state`, re-centered on `focus`.
pub fn reconcile(
    state: &mut GraphState,
    mut payload: NeighborhoodPayload,
    focus: EntityId,
) -> ReconcileReport {
    state.current_stamp += 1;
    state.focus = Some(focus);
    let stamp = state.current_stamp;
    let mut report = ReconcileReport {
        stamp,
        ..ReconcileReport::default()
    };

    payload.nodes.sort_by_key(|n| n.id.number());

    for incoming in &payload.nodes {
        let id = incoming.id;
        let label = node_label(incoming);
        let is_focus = id == focus;
        let classes = node_classes(id, focus);

        match state.nodes.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(Node {
                    id,
                    label,
                    is_focus,
                    classes,
                    stamp,
                    padding: Default::default(),
                    geometry: None,
                });
                report.inserted += 1;
            }
            Entry::Occupied(slot) => {
                let node = slot.into_mut();
                node.label = label;
                node.is_focus = is_focus;
                node.classes = classes;
                node.stamp = stamp;
                report.updated += 1;
            }
        }
    }

    for link in &payload.links {
        let touches_focus = link.source == focus || link.target == focus;
        let edge = Edge {
            source: link.source,
            target: link.target,
            touches_focus,
            classes: edge_classes(touches_focus),
            weight: if touches_focus {
                FOCUS_EDGE_WEIGHT
            } else {
                DEFAULT_EDGE_WEIGHT
            },
            stamp,
        };
        state.edges.insert(EdgeKey::new(link.source, link.target), edge);
        report.links += 1;
    }

    let GraphState { nodes, edges, .. } = state;

    let node_count = nodes.len();
    nodes.retain(|_, node| node.stamp == stamp);
    report.pruned_nodes = node_count - nodes.len();

    // Edges go when stale or when an endpoint is gone, whichever comes first.
    let edge_count = edges.len();
    edges.retain(|key, edge| {
        let (a, b) = key.endpoints();
        edge.stamp == stamp && nodes.contains_key(&a) && nodes.contains_key(&b)
    });
    report.pruned_edges = edge_count - edges.len();

    for node in nodes.values_mut() {
        node.padding = NODE_PADDING;
    }

    if !nodes.is_empty() && !nodes.contains_key(&focus) {
        warn!(%focus, "neighborhood payload does not contain its focus entity");
    }
    debug!(
        stamp,
        inserted = report.inserted,
        updated = report.updated,
        pruned_nodes = report.pruned_nodes,
        pruned_edges = report.pruned_edges,
        "reconciled neighborhood"
    );

    report
}
