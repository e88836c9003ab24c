//! CSS styles for the tune graph viewer.
//!
//! Contains the page STYLE and the graph-specific GRAPH_STYLE.

// ============================================================================
// CSS Styles
// ============================================================================

pub const STYLE: &str = r#"
/* Solarized Light Theme */
:root {
    --base01: #586e75;
    --base00: #657b83;
    --base1: #93a1a1;
    --base2: #eee8d5;
    --base3: #fdf6e3;

    --blue: #268bd2;
    --cyan: #2aa198;

    --bg: var(--base3);
    --fg: var(--base00);
    --border: var(--base2);
    --link: var(--blue);
    --link-hover: var(--cyan);
}

* { box-sizing: border-box; margin: 0; padding: 0; }

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
    line-height: 1.6;
    color: var(--fg);
    background: var(--bg);
}

.container {
    max-width: 1000px;
    margin: 0 auto;
    padding: 1rem;
}

a { color: var(--link); text-decoration: none; }
a:hover { color: var(--link-hover); text-decoration: underline; }

h1 { font-size: 1.5rem; font-weight: 600; margin-top: 1.5em; margin-bottom: 0.5em; }
"#;

pub const GRAPH_STYLE: &str = r#"
#graph { border: 1px solid var(--border); border-radius: 4px; background: var(--bg); }
#graph p { padding: 1rem; }

.tune-graph .node ellipse { stroke: var(--base01); stroke-width: 1.5px; fill: var(--bg); }
.tune-graph .node.song ellipse { fill: #f5e3b3; }
.tune-graph .node.title ellipse { fill: #d6e6f2; }
.tune-graph .node.instance ellipse { fill: #e2ecc6; }
.tune-graph .node text { font-size: 12px; fill: var(--base01); text-anchor: middle; dominant-baseline: middle; }
.tune-graph .node a { cursor: pointer; }
.tune-graph .node.dim { opacity: 0.55; }
.tune-graph .node:hover { opacity: 1; }

.tune-graph .edgePath path { stroke: var(--base01); stroke-width: 1.5px; fill: none; }
.tune-graph .edgePath.dim path { stroke: var(--base1); stroke-width: 1px; }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_declared_variable_is_used() {
        let css = format!("{STYLE}{GRAPH_STYLE}");
        for line in STYLE.lines() {
            let Some(name) = line.trim().strip_prefix("--").and_then(|l| l.split(':').next()) else {
                continue;
            };
            let usage = format!("var(--{name})");
            assert!(css.contains(&usage), "--{name} is declared but never used");
        }
    }
}
