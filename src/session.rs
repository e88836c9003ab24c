//! A viewer session: one graph store, one render adapter, and the request
//! bookkeeping that ties neighborhood responses back to the click that
//! asked for them.
//!
//! Only the fetch suspends. Reconcile and draw run under the session lock
//! and always complete before the next response is looked at. Every request
//! gets a ticket, and completing any ticket other than the most recent one
//! is a no-op, so a slow response can never overwrite a newer focus.

use crate::client::{FetchError, NeighborhoodSource};
use crate::controller::{click_action, ClickAction};
use crate::focus::{resolve_focus, FocusParseError};
use crate::graph::{GraphState, LayoutHints};
use crate::layout::{DagreLayout, LayoutEngine};
use crate::models::{EntityId, NeighborhoodPayload};
use crate::reconcile::reconcile;
use crate::render::{RenderAdapter, Scene};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

// ============================================================================
// Errors and Outcomes
// ============================================================================

/// Every failure a load can end in. `Display` gives the user-facing text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error(transparent)]
    Parse(#[from] FocusParseError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Drawn(Scene),
    Failed(GraphError),
    /// A newer request was issued before this one came back.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    serial: u64,
    target: EntityId,
}

impl RequestTicket {
    pub fn target(&self) -> EntityId {
        self.target
    }
}

// ============================================================================
// Session
// ============================================================================

pub struct GraphSession<E: LayoutEngine = DagreLayout> {
    state: GraphState,
    renderer: RenderAdapter<E>,
    issued: u64,
    pending: Option<RequestTicket>,
}

impl Default for GraphSession<DagreLayout> {
    fn default() -> Self {
        Self::new(DagreLayout, LayoutHints::default())
    }
}

impl<E: LayoutEngine> GraphSession<E> {
    pub fn new(engine: E, hints: LayoutHints) -> Self {
        Self {
            state: GraphState::new(hints),
            renderer: RenderAdapter::new(engine),
            issued: 0,
            pending: None,
        }
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn scene(&self) -> &Scene {
        self.renderer.scene()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Decide what a click on `clicked` does. Before the first load every
    /// node counts as a re-focus.
    pub fn click(&self, clicked: EntityId) -> ClickAction {
        match self.state.focus() {
            Some(focus) => click_action(focus, clicked),
            None => ClickAction::Refocus { target: clicked },
        }
    }

    /// Issue a ticket for a neighborhood request, superseding any request
    /// still in flight.
    pub fn begin_request(&mut self, target: EntityId) -> RequestTicket {
        self.issued += 1;
        let ticket = RequestTicket {
            serial: self.issued,
            target,
        };
        if let Some(previous) = self.pending.replace(ticket) {
            debug!(previous = %previous.target, %target, "superseding in-flight request");
        }
        ticket
    }

    /// Apply the result of a request. Reconciles and draws on success; on
    /// failure the store is left exactly as it was.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        result: Result<NeighborhoodPayload, FetchError>,
    ) -> LoadOutcome {
        if self.pending != Some(ticket) {
            debug!(focus = %ticket.target, "dropping superseded response");
            return LoadOutcome::Superseded;
        }
        self.pending = None;

        match result {
            // A neighborhood that leaves out its own center would leave the
            // store without a focus node.
            Ok(payload)
                if !payload.nodes.is_empty()
                    && !payload.nodes.iter().any(|n| n.id == ticket.target) =>
            {
                warn!(focus = %ticket.target, "neighborhood payload does not contain its focus entity");
                let description = format!(
                    "neighborhood of {} does not include {}",
                    ticket.target, ticket.target
                );
                LoadOutcome::Failed(FetchError::Application { description }.into())
            }
            Ok(payload) => {
                let report = reconcile(&mut self.state, payload, ticket.target);
                let scene = self.renderer.draw(&mut self.state, report.transition());
                LoadOutcome::Drawn(scene.clone())
            }
            Err(err) => LoadOutcome::Failed(err.into()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fetch `target`'s neighborhood and fold it into the session. The lock is
/// released while the request is in flight.
pub async fn load<E, S>(session: &Mutex<GraphSession<E>>, source: &S, target: EntityId) -> LoadOutcome
where
    E: LayoutEngine,
    S: NeighborhoodSource + ?Sized,
{
    let ticket = lock(session).begin_request(target);
    let result = source.fetch_neighborhood(target).await;
    lock(session).complete(ticket, result)
}

/// Resolve the focus from a location and load it. An unparseable location
/// fails before any request is made.
pub async fn open<E, S>(session: &Mutex<GraphSession<E>>, source: &S, location: &str) -> LoadOutcome
where
    E: LayoutEngine,
    S: NeighborhoodSource + ?Sized,
{
    match resolve_focus(location) {
        Ok(focus) => load(session, source, focus).await,
        Err(err) => LoadOutcome::Failed(err.into()),
    }
}
