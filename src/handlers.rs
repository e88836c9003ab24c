//! HTTP route handlers.
//!
//! A browser is identified by the session cookie; each full page load opens
//! its own page view with a graph session of its own. The fragment route
//! serves refocus requests issued by the in-page script, which names its
//! view in the `x-graph-view` header.

use crate::focus::resolve_focus;
use crate::models::EntityId;
use crate::session::{self, LoadOutcome};
use crate::templates::{error_html, graph_page as render_page, render_scene};
use crate::{AppState, SharedSession, ViewHandle, SESSION_COOKIE, SESSION_TTL, VIEW_HEADER};
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::{Arc, PoisonError};
use tracing::{info, warn};

/// Resolve the page view for this request, plus any headers the response
/// must carry (a fresh cookie, the view token).
fn resolve_view(state: &AppState, jar: &CookieJar, view: Option<&str>) -> (HeaderMap, ViewHandle) {
    let presented = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let handle = state.view(presented.as_deref(), view);

    let mut headers = HeaderMap::new();
    if presented.as_deref() != Some(handle.browser.as_str()) {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            handle.browser,
            SESSION_TTL.as_secs()
        );
        if let Ok(value) = cookie.parse() {
            headers.insert(SET_COOKIE, value);
        }
    }
    if let Ok(value) = HeaderValue::from_str(&handle.view) {
        headers.insert(VIEW_HEADER, value);
    }
    (headers, handle)
}

async fn run_open(state: &AppState, session: &SharedSession, uri: &Uri) -> LoadOutcome {
    let outcome = session::open(&**session, state.source.as_ref(), uri.path()).await;
    match &outcome {
        LoadOutcome::Drawn(scene) => info!(
            path = %uri.path(),
            nodes = scene.nodes.len(),
            edges = scene.edges.len(),
            "drew neighborhood"
        ),
        LoadOutcome::Failed(err) => warn!(path = %uri.path(), error = %err, "graph load failed"),
        LoadOutcome::Superseded => info!(path = %uri.path(), "dropped superseded response"),
    }
    outcome
}

// ============================================================================
// Graph Handlers
// ============================================================================

/// Container markup for a finished load, and the focus the heading names.
fn page_contents(
    outcome: LoadOutcome,
    session: &SharedSession,
    uri: &Uri,
) -> (String, Option<EntityId>) {
    match outcome {
        LoadOutcome::Drawn(scene) => (render_scene(&scene), scene.focus),
        LoadOutcome::Failed(err) => (error_html(&err), resolve_focus(uri.path()).ok()),
        // A newer request owns the view; show whatever it drew.
        LoadOutcome::Superseded => {
            let guard = session.lock().unwrap_or_else(PoisonError::into_inner);
            (render_scene(guard.scene()), guard.scene().focus)
        }
    }
}

/// `GET /graph/{id}/`: full page with the neighborhood drawn in place.
pub async fn graph_page(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    jar: CookieJar,
) -> Response {
    let (headers, handle) = resolve_view(&state, &jar, None);

    let outcome = run_open(&state, &handle.session, &uri).await;
    let (container, focus) = page_contents(outcome, &handle.session, &uri);

    let page = render_page(focus, &handle.view, &container);
    (headers, Html(page)).into_response()
}

/// `GET /view/graph/{id}/`: just the container contents, for the click
/// script. A response overtaken by a newer click in the same view answers
/// 204.
pub async fn graph_fragment(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    jar: CookieJar,
    request_headers: HeaderMap,
) -> Response {
    let view = request_headers
        .get(VIEW_HEADER)
        .and_then(|v| v.to_str().ok());
    let (headers, handle) = resolve_view(&state, &jar, view);

    match run_open(&state, &handle.session, &uri).await {
        LoadOutcome::Drawn(scene) => (headers, Html(render_scene(&scene))).into_response(),
        LoadOutcome::Failed(err) => (headers, Html(error_html(&err))).into_response(),
        LoadOutcome::Superseded => (headers, StatusCode::NO_CONTENT).into_response(),
    }
}
