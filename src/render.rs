//! Render adapter.
//!
//! Hands the reconciled store to a layout engine and turns the result into a
//! `Scene`: the retained set of drawn elements. Like a DOM that outlives
//! each draw, the scene keeps edges it already drew and only refreshes their
//! geometry, so their dim styling goes stale until the post-draw restyle
//! pass runs.

use crate::controller::{click_action, ClickAction};
use crate::graph::{ClassSet, EdgeKey, GraphState, DIM_CLASS};
use crate::layout::{LayoutEngine, Point};
use crate::models::EntityId;
use crate::{CANVAS_HEIGHT, CANVAS_WIDTH, GRAPH_MARGIN, GRAPH_TOP_OFFSET};
use std::collections::BTreeMap;
use std::time::Duration;

// ============================================================================
// Drawn Elements
// ============================================================================

/// Hyperlink wrapped around a drawn node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLink {
    pub href: String,
    /// Set when a click should re-center the graph in place instead of
    /// following `href`.
    pub refocus: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnNode {
    pub id: EntityId,
    pub classes: ClassSet,
    pub label: String,
    pub center: Point,
    pub rx: f64,
    pub ry: f64,
    pub link: Option<NodeLink>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnEdge {
    pub source: EntityId,
    pub target: EntityId,
    pub classes: ClassSet,
    pub points: Vec<Point>,
}

/// Everything currently on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub nodes: BTreeMap<EntityId, DrawnNode>,
    pub edges: BTreeMap<EdgeKey, DrawnEdge>,
    pub focus: Option<EntityId>,
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Translation applied to the drawing group.
    pub offset: Point,
    pub transition: Duration,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            focus: None,
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            offset: Point { x: 0.0, y: 0.0 },
            transition: Duration::ZERO,
        }
    }
}

// ============================================================================
// Adapter
// ============================================================================

pub struct RenderAdapter<E: LayoutEngine> {
    engine: E,
    scene: Scene,
}

impl<E: LayoutEngine> RenderAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            scene: Scene::default(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Lay out and draw `state`, then run the post-draw passes. Computed
    /// geometry is written back into the store as a hint for the next cycle.
    pub fn draw(&mut self, state: &mut GraphState, transition: Duration) -> &Scene {
        let layout = self.engine.layout(state);
        for (id, geometry) in &layout.nodes {
            state.set_geometry(*id, *geometry);
        }

        let scene = &mut self.scene;
        scene.transition = transition;
        scene.focus = state.focus();

        // Nodes are fully restyled on every draw.
        scene.nodes = state
            .nodes()
            .filter_map(|node| {
                let g = layout.nodes.get(&node.id)?;
                let drawn = DrawnNode {
                    id: node.id,
                    classes: node.classes.clone(),
                    label: node.label.clone(),
                    center: Point { x: g.x, y: g.y },
                    rx: g.width / 2.0,
                    ry: g.height / 2.0,
                    link: None,
                };
                Some((node.id, drawn))
            })
            .collect();

        // Edges already drawn keep their old classes; only new ones pick up
        // the store's styling.
        let mut edges = BTreeMap::new();
        for edge in state.edges() {
            let key = edge.key();
            let points = layout.edges.get(&key).cloned().unwrap_or_default();
            let classes = match scene.edges.get(&key) {
                Some(previous) => previous.classes.clone(),
                None => edge.classes.clone(),
            };
            edges.insert(
                key,
                DrawnEdge {
                    source: edge.source,
                    target: edge.target,
                    classes,
                    points,
                },
            );
        }
        scene.edges = edges;

        restyle_edges(scene);
        wrap_node_links(scene);
        center_drawing(scene, layout.width, layout.height);

        &self.scene
    }
}

// ============================================================================
// Post-draw Passes
// ============================================================================

/// Reassign every drawn edge's dim class from its endpoints.
pub fn restyle_edges(scene: &mut Scene) {
    let focus = scene.focus;
    for edge in scene.edges.values_mut() {
        let touches = focus.is_some_and(|f| edge.source == f || edge.target == f);
        if touches {
            edge.classes.remove(DIM_CLASS);
        } else {
            edge.classes.insert(DIM_CLASS);
        }
    }
}

/// Wrap each drawn node in a link: the detail page for the focus, an
/// in-place re-focus for everything else.
pub fn wrap_node_links(scene: &mut Scene) {
    let Some(focus) = scene.focus else {
        for node in scene.nodes.values_mut() {
            node.link = None;
        }
        return;
    };
    for node in scene.nodes.values_mut() {
        node.link = Some(match click_action(focus, node.id) {
            ClickAction::FollowLink { href } => NodeLink {
                href,
                refocus: None,
            },
            ClickAction::Refocus { target } => NodeLink {
                href: target.graph_href(),
                refocus: Some(target),
            },
        });
    }
}

/// Center the drawing horizontally and fit the canvas to its height.
pub fn center_drawing(scene: &mut Scene, graph_width: f64, graph_height: f64) {
    scene.offset = Point {
        x: (scene.canvas_width - graph_width) / 2.0,
        y: GRAPH_TOP_OFFSET,
    };
    scene.canvas_height = graph_height + GRAPH_MARGIN;
}
