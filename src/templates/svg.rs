//! SVG markup for a drawn scene.

use crate::graph::ClassSet;
use crate::layout::Point;
use crate::render::{DrawnEdge, DrawnNode, Scene};

use super::components::html_escape;

/// Line spacing of multi-line labels, in em.
const LABEL_LINE_EM: f64 = 1.1;

fn class_attr(base: &str, classes: &ClassSet) -> String {
    let mut out = base.to_string();
    for class in classes {
        out.push(' ');
        out.push_str(class);
    }
    out
}

/// Smooth path through a route: interior points become quadratic control
/// points, with the curve passing through the midpoints between them.
fn path_data(points: &[Point]) -> String {
    let Some((first, rest)) = points.split_first() else {
        return String::new();
    };
    let mut d = format!("M{:.1},{:.1}", first.x, first.y);
    if let Some((last, interior)) = rest.split_last() {
        for (i, control) in interior.iter().enumerate() {
            let end = match interior.get(i + 1) {
                Some(next) => ((control.x + next.x) / 2.0, (control.y + next.y) / 2.0),
                None => (last.x, last.y),
            };
            d.push_str(&format!(
                " Q{:.1},{:.1} {:.1},{:.1}",
                control.x, control.y, end.0, end.1
            ));
        }
        if interior.is_empty() {
            d.push_str(&format!(" L{:.1},{:.1}", last.x, last.y));
        }
    }
    d
}

fn render_edge(edge: &DrawnEdge) -> String {
    format!(
        r#"<g class="{class}" data-source="{source}" data-target="{target}"><path d="{d}"/></g>"#,
        class = class_attr("edgePath", &edge.classes),
        source = edge.source,
        target = edge.target,
        d = path_data(&edge.points),
    )
}

fn render_label(label: &str) -> String {
    let lines: Vec<&str> = label.lines().collect();
    let first_dy = match lines.len() {
        0 | 1 => 0.0,
        n => -((n - 1) as f64) * LABEL_LINE_EM / 2.0,
    };
    let mut text = String::from("<text>");
    for (i, line) in lines.iter().enumerate() {
        let dy = if i == 0 { first_dy } else { LABEL_LINE_EM };
        text.push_str(&format!(
            r#"<tspan x="0" dy="{:.2}em">{}</tspan>"#,
            dy,
            html_escape(line)
        ));
    }
    text.push_str("</text>");
    text
}

fn render_node(node: &DrawnNode, duration_ms: u128) -> String {
    let shape = format!(
        r#"<ellipse rx="{:.1}" ry="{:.1}"/>{}"#,
        node.rx,
        node.ry,
        render_label(&node.label)
    );
    let contents = match &node.link {
        Some(link) => {
            let refocus = link
                .refocus
                .map(|id| format!(r#" data-refocus="{}""#, id))
                .unwrap_or_default();
            format!(
                r#"<a href="{href}" xlink:href="{href}"{refocus}>{shape}</a>"#,
                href = html_escape(&link.href),
            )
        }
        None => shape,
    };
    format!(
        r#"<g class="{class}" data-node="{id}" style="transform: translate({x:.1}px, {y:.1}px); transition: transform {duration_ms}ms">{contents}</g>"#,
        class = class_attr("node", &node.classes),
        id = node.id,
        x = node.center.x,
        y = node.center.y,
    )
}

/// Render the whole scene as an inline `<svg>` element.
pub fn render_scene(scene: &Scene) -> String {
    let duration_ms = scene.transition.as_millis();
    let edges: String = scene.edges.values().map(render_edge).collect();
    let nodes: String = scene
        .nodes
        .values()
        .map(|n| render_node(n, duration_ms))
        .collect();
    let focus = scene.focus.map(|f| f.to_string()).unwrap_or_default();

    format!(
        r#"<svg class="tune-graph" width="{width:.0}" height="{height:.0}" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" data-focus="{focus}" style="transition: height {duration_ms}ms"><g class="output" style="transform: translate({ox:.1}px, {oy:.1}px); transition: transform {duration_ms}ms"><g class="edgePaths">{edges}</g><g class="nodes">{nodes}</g></g></svg>"#,
        width = scene.canvas_width,
        height = scene.canvas_height,
        ox = scene.offset.x,
        oy = scene.offset.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphState, LayoutHints};
    use crate::layout::DagreLayout;
    use crate::models::{EntityId, NeighborhoodPayload, PayloadLink, PayloadNode};
    use crate::reconcile::reconcile;
    use crate::render::RenderAdapter;

    fn scene() -> Scene {
        let mut state = GraphState::new(LayoutHints::default());
        let payload = NeighborhoodPayload {
            nodes: vec![
                PayloadNode {
                    id: EntityId::Song(803),
                    title: None,
                },
                PayloadNode {
                    id: EntityId::Title(12),
                    title: Some("Drowsy <Maggie>".to_string()),
                },
            ],
            links: vec![PayloadLink {
                source: EntityId::Song(803),
                target: EntityId::Title(12),
            }],
        };
        let report = reconcile(&mut state, payload, EntityId::Song(803));
        let mut adapter = RenderAdapter::new(DagreLayout);
        adapter.draw(&mut state, report.transition()).clone()
    }

    #[test]
    fn test_render_scene_markup() {
        let svg = render_scene(&scene());
        assert!(svg.starts_with(r#"<svg class="tune-graph" width="960""#));
        assert!(svg.contains(r#"data-focus="s803""#));
        assert!(svg.contains("transition: transform 500ms"));
        assert!(svg.contains(r#"<g class="node song" data-node="s803""#));
        assert!(svg.contains(r#"<g class="node dim title" data-node="t12""#));
        assert!(svg.contains(r#"<a href="/song/803/" xlink:href="/song/803/">"#));
        assert!(svg.contains(r#"<a href="/graph/t12/" xlink:href="/graph/t12/" data-refocus="t12">"#));
        assert!(svg.contains(r#"<g class="edgePath" data-source="s803" data-target="t12">"#));
        assert!(svg.contains("Drowsy &lt;Maggie&gt;"));
    }

    #[test]
    fn test_multiline_label() {
        let text = render_label("Title 12\n\u{201c}Kesh\u{201d}");
        assert_eq!(text.matches("<tspan").count(), 2);
        assert!(text.contains(r#"dy="-0.55em""#));
        assert!(text.contains(r#"dy="1.10em""#));
    }

    #[test]
    fn test_path_data() {
        let p = |x, y| Point { x, y };
        assert_eq!(path_data(&[]), "");
        assert_eq!(path_data(&[p(0.0, 0.0), p(1.0, 2.0)]), "M0.0,0.0 L1.0,2.0");
        assert_eq!(
            path_data(&[p(0.0, 0.0), p(5.0, 0.0), p(10.0, 10.0)]),
            "M0.0,0.0 Q5.0,0.0 10.0,10.0"
        );
        assert_eq!(
            path_data(&[p(0.0, 0.0), p(4.0, 0.0), p(8.0, 10.0), p(12.0, 10.0)]),
            "M0.0,0.0 Q4.0,0.0 6.0,5.0 Q8.0,10.0 12.0,10.0"
        );
    }
}
