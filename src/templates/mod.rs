//! HTML and SVG templates for the tune graph viewer.
//!
//! ## Module Structure
//!
//! - `styles` - CSS constants
//! - `components` - Base template, graph page, error message
//! - `graph_js` - In-page click handling script
//! - `svg` - SVG markup for a drawn scene

mod styles;
mod components;
mod graph_js;
mod svg;

pub use styles::{GRAPH_STYLE, STYLE};
pub use components::{base_html, error_html, graph_page, html_escape};
pub use graph_js::render_click_js;
pub use svg::render_scene;
