//! Focus resolution from the navigation location.

use crate::models::EntityId;
use regex::Regex;
use std::sync::OnceLock;

/// The location did not carry a `/graph/<id>/` segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unable to parse URL.")]
pub struct FocusParseError {
    pub location: String,
}

fn focus_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/graph/([sti]\d+)/").expect("valid focus pattern"))
}

/// Extract the focus entity from a URL or path such as
/// `https://example.org/graph/s803/`.
pub fn resolve_focus(location: &str) -> Result<EntityId, FocusParseError> {
    focus_pattern()
        .captures(location)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| FocusParseError {
            location: location.to_string(),
        })
}
