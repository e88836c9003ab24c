//! Shared HTML components: base template, graph page, error message.

use crate::models::EntityId;
use crate::session::GraphError;

use super::graph_js::render_click_js;
use super::styles::{GRAPH_STYLE, STYLE};

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ============================================================================
// Base HTML Template
// ============================================================================

pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}{GRAPH_STYLE}</style>
</head>
<body>
    <div class="container">
        {content}
    </div>
</body>
</html>"#,
        title = html_escape(title),
    )
}

// ============================================================================
// Graph Page
// ============================================================================

/// Full graph page around already-rendered container contents. `view` names
/// the page view the click script reports back on refocus requests.
pub fn graph_page(focus: Option<EntityId>, view: &str, container_html: &str) -> String {
    let heading = match focus {
        Some(id) => format!("Tune Graph: {}", id.label()),
        None => "Tune Graph".to_string(),
    };
    let content = format!(
        r#"<h1>{heading}</h1>
        <div id="graph" data-view="{view}">{container_html}</div>
        {script}"#,
        heading = html_escape(&heading),
        view = html_escape(view),
        script = render_click_js("#graph"),
    );
    base_html(&heading, &content)
}

/// Message that replaces the graph container after a failed load.
pub fn error_html(err: &GraphError) -> String {
    format!(
        r#"<p>Oops. {} Try starting over with a new <a href="/search/">search</a>.</p>"#,
        html_escape(&err.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchError;

    #[test]
    fn test_error_html_has_recovery_link() {
        let err = GraphError::Fetch(FetchError::Application {
            description: "<not found>".to_string(),
        });
        let html = error_html(&err);
        assert!(html.starts_with("<p>Oops. The server replied with"));
        assert!(html.contains("&lt;not found&gt;"));
        assert!(html.contains(r#"<a href="/search/">search</a>"#));
    }

    #[test]
    fn test_graph_page_embeds_container_and_script() {
        let page = graph_page(Some(EntityId::Song(803)), "v1", "<svg></svg>");
        assert!(page.contains("<title>Tune Graph: Song 803</title>"));
        assert!(page.contains(r#"<div id="graph" data-view="v1"><svg></svg></div>"#));
        assert!(page.contains("<script>"));
    }
}
