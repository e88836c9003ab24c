//! Click handling for drawn nodes.

use crate::models::EntityId;

/// What a click on a node should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Let the browser follow the link (the focus node's detail page).
    FollowLink { href: String },
    /// Suppress navigation and request the clicked node's neighborhood.
    /// The focus itself only moves once that response is reconciled.
    Refocus { target: EntityId },
}

pub fn click_action(focus: EntityId, clicked: EntityId) -> ClickAction {
    if clicked == focus {
        ClickAction::FollowLink {
            href: clicked.detail_href(),
        }
    } else {
        ClickAction::Refocus { target: clicked }
    }
}
