//! Layout engine boundary and the dagre-backed default.
//!
//! The render adapter only depends on `LayoutEngine`. `DagreLayout` hands the
//! store to dugong's dagre port: ranks follow link direction, edge weights
//! pull heavier links shorter, and positions are read back in pixels.

use crate::graph::{EdgeKey, GraphState, Node, NodeGeometry, RankDir};
use crate::models::EntityId;
use dugong::graphlib::{Graph, GraphOptions};
use dugong::{EdgeLabel, GraphLabel, NodeLabel};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Approximate advance of one label character, in pixels.
const CHAR_WIDTH: f64 = 7.0;
const LINE_HEIGHT: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Positions computed by a layout engine for one draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub nodes: BTreeMap<EntityId, NodeGeometry>,
    /// Route of each edge from its source border to its target border.
    pub edges: BTreeMap<EdgeKey, Vec<Point>>,
    pub width: f64,
    pub height: f64,
}

pub trait LayoutEngine: Send + Sync {
    fn layout(&self, graph: &GraphState) -> Layout;
}

/// Box of a node's label plus its padding, as (width, height).
pub fn node_size(node: &Node) -> (f64, f64) {
    let lines: Vec<&str> = node.label.lines().collect();
    let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f64;
    let width = widest * CHAR_WIDTH + 2.0 * node.padding.x;
    let height = lines.len().max(1) as f64 * LINE_HEIGHT + node.padding.top + node.padding.bottom;
    (width, height)
}

// ============================================================================
// Dagre Layout
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct DagreLayout;

fn dagre_rankdir(rankdir: RankDir) -> dugong::RankDir {
    match rankdir {
        RankDir::LeftRight => dugong::RankDir::LR,
        RankDir::TopBottom => dugong::RankDir::TB,
    }
}

/// Nodes already on screen go first, in their previous cross-axis order, so
/// dagre's initial ordering starts from what the user saw. Newcomers follow
/// by number.
fn insertion_order(graph: &GraphState) -> Vec<&Node> {
    let horizontal = graph.hints().rankdir == RankDir::LeftRight;
    let cross = |node: &Node| node.geometry.map(|g| if horizontal { g.y } else { g.x });

    let mut nodes: Vec<&Node> = graph.nodes().collect();
    nodes.sort_by(|a, b| match (cross(a), cross(b)) {
        (Some(ca), Some(cb)) => ca.total_cmp(&cb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id.number().cmp(&b.id.number()),
    });
    nodes
}

fn build_graph(graph: &GraphState) -> Graph<NodeLabel, EdgeLabel, GraphLabel> {
    let hints = graph.hints();
    let mut g = Graph::<NodeLabel, EdgeLabel, GraphLabel>::new(GraphOptions {
        directed: true,
        multigraph: true,
        compound: true,
    });
    g.set_graph(GraphLabel {
        rankdir: dagre_rankdir(hints.rankdir),
        nodesep: hints.nodesep,
        ranksep: hints.ranksep,
        ..Default::default()
    });

    for node in insertion_order(graph) {
        let (width, height) = node_size(node);
        g.set_node(
            node.id.to_string(),
            NodeLabel {
                width,
                height,
                ..Default::default()
            },
        );
    }

    for edge in graph.edges() {
        g.set_edge_named(
            edge.source.to_string(),
            edge.target.to_string(),
            Some(format!("{}-{}", edge.source, edge.target)),
            Some(EdgeLabel {
                minlen: 1,
                weight: f64::from(edge.weight),
                ..Default::default()
            }),
        );
    }
    g
}

impl LayoutEngine for DagreLayout {
    fn layout(&self, graph: &GraphState) -> Layout {
        if graph.is_empty() {
            return Layout::default();
        }

        let mut g = build_graph(graph);
        dugong::layout(&mut g);

        let mut layout = Layout::default();
        for id in g.node_ids() {
            let (Some(n), Ok(entity)) = (g.node(&id), id.parse::<EntityId>()) else {
                continue;
            };
            layout.nodes.insert(
                entity,
                NodeGeometry {
                    x: n.x.unwrap_or(0.0),
                    y: n.y.unwrap_or(0.0),
                    width: n.width,
                    height: n.height,
                },
            );
        }
        for key in g.edge_keys() {
            let (Some(e), Ok(v), Ok(w)) = (
                g.edge_by_key(&key),
                key.v.parse::<EntityId>(),
                key.w.parse::<EntityId>(),
            ) else {
                continue;
            };
            let points = e.points.iter().map(|p| Point { x: p.x, y: p.y }).collect();
            layout.edges.insert(EdgeKey::new(v, w), points);
        }

        normalize(&mut layout);
        layout
    }
}

/// Shift everything so the drawing starts at the origin, and size it to
/// cover every node box and edge point.
fn normalize(layout: &mut Layout) {
    let mut min = Point {
        x: f64::INFINITY,
        y: f64::INFINITY,
    };
    let mut max = Point {
        x: f64::NEG_INFINITY,
        y: f64::NEG_INFINITY,
    };
    let mut cover = |x0: f64, y0: f64, x1: f64, y1: f64| {
        min.x = min.x.min(x0);
        min.y = min.y.min(y0);
        max.x = max.x.max(x1);
        max.y = max.y.max(y1);
    };
    for g in layout.nodes.values() {
        cover(
            g.x - g.width / 2.0,
            g.y - g.height / 2.0,
            g.x + g.width / 2.0,
            g.y + g.height / 2.0,
        );
    }
    for p in layout.edges.values().flatten() {
        cover(p.x, p.y, p.x, p.y);
    }
    if !min.x.is_finite() {
        return;
    }

    for g in layout.nodes.values_mut() {
        g.x -= min.x;
        g.y -= min.y;
    }
    for p in layout.edges.values_mut().flatten() {
        p.x -= min.x;
        p.y -= min.y;
    }
    layout.width = max.x - min.x;
    layout.height = max.y - min.y;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::LayoutHints;
    use crate::models::{NeighborhoodPayload, PayloadLink, PayloadNode};
    use crate::reconcile::reconcile;

    fn id(s: &str) -> EntityId {
        s.parse().unwrap()
    }

    fn payload(nodes: &[&str], links: &[(&str, &str)]) -> NeighborhoodPayload {
        NeighborhoodPayload {
            nodes: nodes
                .iter()
                .map(|n| PayloadNode {
                    id: id(n),
                    title: None,
                })
                .collect(),
            links: links
                .iter()
                .map(|(s, t)| PayloadLink {
                    source: id(s),
                    target: id(t),
                })
                .collect(),
        }
    }

    fn graph(nodes: &[&str], links: &[(&str, &str)], focus: &str) -> GraphState {
        let mut state = GraphState::new(LayoutHints::default());
        reconcile(&mut state, payload(nodes, links), id(focus));
        state
    }

    #[test]
    fn test_empty_graph_has_empty_layout() {
        let state = GraphState::new(LayoutHints::default());
        assert_eq!(DagreLayout.layout(&state), Layout::default());
    }

    #[test]
    fn test_links_run_left_to_right() {
        let state = graph(&["s1", "t2", "i3"], &[("s1", "t2"), ("i3", "s1")], "s1");
        let layout = DagreLayout.layout(&state);
        let x = |s: &str| layout.nodes[&id(s)].x;
        assert!(x("i3") < x("s1"));
        assert!(x("s1") < x("t2"));
        // Ranks are separated by at least the rank gap.
        let s1 = layout.nodes[&id("s1")];
        let t2 = layout.nodes[&id("t2")];
        assert!(t2.x - t2.width / 2.0 - (s1.x + s1.width / 2.0) >= 90.0 - 1e-6);
    }

    #[test]
    fn test_nodes_and_routes_fit_inside_layout() {
        let state = graph(
            &["s1", "t2", "t3", "t4", "i5"],
            &[("s1", "t2"), ("s1", "t3"), ("s1", "t4"), ("i5", "s1")],
            "s1",
        );
        let layout = DagreLayout.layout(&state);
        assert_eq!(layout.nodes.len(), 5);
        for g in layout.nodes.values() {
            assert!(g.x - g.width / 2.0 >= -1e-6);
            assert!(g.x + g.width / 2.0 <= layout.width + 1e-6);
            assert!(g.y - g.height / 2.0 >= -1e-6);
            assert!(g.y + g.height / 2.0 <= layout.height + 1e-6);
        }
        assert_eq!(layout.edges.len(), 4);
        for points in layout.edges.values() {
            assert!(points.len() >= 2);
            for p in points {
                assert!(p.x >= -1e-6 && p.x <= layout.width + 1e-6);
                assert!(p.y >= -1e-6 && p.y <= layout.height + 1e-6);
            }
        }
    }

    #[test]
    fn test_focus_weight_pulls_neighbors_closer() {
        // s1 -> t2 -> i3 -> s4 is a fixed chain; t5 hangs between s1 and s4
        // and may sit in either middle rank.
        let nodes = ["s1", "t2", "i3", "s4", "t5"];
        let links = [
            ("s1", "t2"),
            ("t2", "i3"),
            ("i3", "s4"),
            ("s1", "t5"),
            ("t5", "s4"),
        ];

        let near_start = DagreLayout.layout(&graph(&nodes, &links, "s1"));
        let x = |l: &Layout, s: &str| l.nodes[&id(s)].x;
        assert!((x(&near_start, "t5") - x(&near_start, "t2")).abs() < 1e-6);

        let near_end = DagreLayout.layout(&graph(&nodes, &links, "s4"));
        assert!((x(&near_end, "t5") - x(&near_end, "i3")).abs() < 1e-6);
    }

    #[test]
    fn test_top_bottom_direction() {
        let mut state = GraphState::new(LayoutHints {
            rankdir: RankDir::TopBottom,
            ..LayoutHints::default()
        });
        reconcile(&mut state, payload(&["s1", "t2"], &[("s1", "t2")]), id("s1"));
        let layout = DagreLayout.layout(&state);
        assert!(layout.nodes[&id("s1")].y < layout.nodes[&id("t2")].y);
    }

    #[test]
    fn test_insertion_order_prefers_previous_positions() {
        let mut state = graph(&["s1", "t2", "t3", "t4"], &[("s1", "t2"), ("s1", "t3")], "s1");
        let at = |y: f64| NodeGeometry {
            x: 0.0,
            y,
            width: 10.0,
            height: 10.0,
        };
        state.set_geometry(id("t3"), at(5.0));
        state.set_geometry(id("t2"), at(50.0));

        let order: Vec<EntityId> = insertion_order(&state).iter().map(|n| n.id).collect();
        assert_eq!(order, vec![id("t3"), id("t2"), id("s1"), id("t4")]);
    }

    #[test]
    fn test_node_size_includes_padding() {
        let state = graph(&["s1"], &[], "s1");
        let node = state.node(id("s1")).unwrap();
        let (w, h) = node_size(node);
        assert_eq!(w, "Song 1".len() as f64 * CHAR_WIDTH + 40.0);
        assert_eq!(h, LINE_HEIGHT + 28.0);
        assert_eq!(DagreLayout.layout(&state).nodes[&id("s1")].width, w);
    }
}
