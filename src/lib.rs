//! Tune graph library - re-exports for testing and external use.
//!
//! The pipeline runs leaf-first: `focus` resolves the entity to center on,
//! `client` fetches its neighborhood, `reconcile` merges that into the
//! session's `graph` store, `render` lays it out and draws it, and
//! `controller` decides what a click on a drawn node does.

use rand::Rng;
use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use url::Url;

pub mod client;
pub mod controller;
pub mod focus;
pub mod graph;
pub mod handlers;
pub mod layout;
pub mod models;
pub mod reconcile;
pub mod render;
pub mod session;
pub mod templates;

use client::{HttpNeighborhoodClient, NeighborhoodSource};
use graph::Padding;
use session::GraphSession;

// ============================================================================
// Configuration
// ============================================================================

pub const CANVAS_WIDTH: f64 = 960.0;
pub const CANVAS_HEIGHT: f64 = 480.0;
/// Vertical offset of the drawing inside the canvas.
pub const GRAPH_TOP_OFFSET: f64 = 20.0;
/// Canvas height beyond the drawing's own height.
pub const GRAPH_MARGIN: f64 = 40.0;

pub const RANK_SEPARATION: f64 = 90.0;
pub const NODE_SEPARATION: f64 = 16.0;
pub const NODE_PADDING: Padding = Padding {
    x: 20.0,
    top: 12.0,
    bottom: 16.0,
};

/// Weight of links touching the focus; pulls its neighbors in closer.
pub const FOCUS_EDGE_WEIGHT: u32 = 4;
pub const DEFAULT_EDGE_WEIGHT: u32 = 1;

pub const FAST_TRANSITION: Duration = Duration::from_millis(500);
pub const SLOW_TRANSITION: Duration = Duration::from_millis(1000);

pub const SESSION_COOKIE: &str = "tunegraph_session";
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 3600);
/// Header carrying the page view token between the click script and the
/// fragment route.
pub const VIEW_HEADER: &str = "x-graph-view";

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_UPSTREAM: &str = "http://127.0.0.1:8000/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid TUNEGRAPH_UPSTREAM '{value}': {source}")]
    Upstream {
        value: String,
        source: url::ParseError,
    },
    #[error("invalid TUNEGRAPH_TIMEOUT_SECS '{0}'")]
    Timeout(String),
}

/// Runtime settings, read from `TUNEGRAPH_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: String,
    /// Base URL of the tune database that answers `/ajax/graph/<id>/`.
    pub upstream: Url,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = lookup("TUNEGRAPH_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());

        let upstream_str =
            lookup("TUNEGRAPH_UPSTREAM").unwrap_or_else(|| DEFAULT_UPSTREAM.to_string());
        let mut upstream = Url::parse(&upstream_str).map_err(|source| ConfigError::Upstream {
            value: upstream_str.clone(),
            source,
        })?;
        // Endpoints are joined relative to the base, which needs a trailing slash.
        if !upstream.path().ends_with('/') {
            let path = format!("{}/", upstream.path());
            upstream.set_path(&path);
        }

        let timeout = match lookup("TUNEGRAPH_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Timeout(raw))?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            bind,
            upstream,
            timeout,
        })
    }
}

// ============================================================================
// Application State
// ============================================================================

pub type SharedSession = Arc<Mutex<GraphSession>>;

/// Page views one browser may keep open before the least recently used is
/// dropped.
pub const MAX_VIEWS_PER_BROWSER: usize = 16;

struct ViewEntry {
    session: SharedSession,
    /// Value of the browser's access counter when last resolved.
    used_at: u64,
}

struct BrowserEntry {
    views: HashMap<String, ViewEntry>,
    accesses: u64,
    last_used: Instant,
}

/// A resolved page view: the browser it belongs to, its own token, and the
/// graph session behind it.
pub struct ViewHandle {
    pub browser: String,
    pub view: String,
    pub session: SharedSession,
}

/// Server state: the neighborhood source, and one graph session per page
/// view, grouped by browser.
pub struct AppState {
    pub source: Arc<dyn NeighborhoodSource>,
    browsers: Mutex<HashMap<String, BrowserEntry>>,
}

fn new_token() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

impl AppState {
    pub fn new(source: Arc<dyn NeighborhoodSource>) -> Self {
        Self {
            source,
            browsers: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = HttpNeighborhoodClient::new(config.upstream.clone(), config.timeout)?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Resolve the page view named by `view` within `browser`, starting a new
    /// browser entry or view where either is unknown. Every full page load
    /// passes `view: None` and so gets a graph of its own.
    pub fn view(&self, browser: Option<&str>, view: Option<&str>) -> ViewHandle {
        let mut browsers = self.browsers.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        let browser = match browser.filter(|b| browsers.contains_key(*b)) {
            Some(known) => known.to_string(),
            None => {
                browsers.retain(|_, entry| now.duration_since(entry.last_used) < SESSION_TTL);
                tracing::debug!(active = browsers.len() + 1, "starting browser session");
                new_token()
            }
        };
        let entry = browsers
            .entry(browser.clone())
            .or_insert_with(|| BrowserEntry {
                views: HashMap::new(),
                accesses: 0,
                last_used: now,
            });
        entry.last_used = now;
        entry.accesses += 1;
        let tick = entry.accesses;

        if let Some((token, existing)) = view.and_then(|v| entry.views.get_mut(v).map(|e| (v, e))) {
            existing.used_at = tick;
            return ViewHandle {
                browser,
                view: token.to_string(),
                session: Arc::clone(&existing.session),
            };
        }

        let token = new_token();
        let session: SharedSession = Arc::new(Mutex::new(GraphSession::default()));
        entry.views.insert(
            token.clone(),
            ViewEntry {
                session: Arc::clone(&session),
                used_at: tick,
            },
        );
        if entry.views.len() > MAX_VIEWS_PER_BROWSER {
            let oldest = entry
                .views
                .iter()
                .filter(|(t, _)| **t != token)
                .min_by_key(|(_, v)| v.used_at)
                .map(|(t, _)| t.clone());
            if let Some(oldest) = oldest {
                entry.views.remove(&oldest);
            }
        }
        ViewHandle {
            browser,
            view: token,
            session,
        }
    }

    pub fn browser_count(&self) -> usize {
        self.browsers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn view_count(&self, browser: &str) -> usize {
        self.browsers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(browser)
            .map_or(0, |entry| entry.views.len())
    }
}

// Re-export commonly used types
pub use client::FetchError;
pub use focus::{resolve_focus, FocusParseError};
pub use graph::{Edge, EdgeKey, GraphState, LayoutHints, Node};
pub use layout::{DagreLayout, LayoutEngine};
pub use models::{EntityId, EntityKind, NeighborhoodPayload, PayloadLink, PayloadNode};
pub use reconcile::{reconcile, ReconcileReport};
pub use render::{RenderAdapter, Scene};
pub use session::{GraphError, LoadOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind, "127.0.0.1:3000");
        assert_eq!(config.upstream.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(|key| match key {
            "TUNEGRAPH_UPSTREAM" => Some("https://tunes.example/abcdb".to_string()),
            "TUNEGRAPH_TIMEOUT_SECS" => Some("3".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.upstream.as_str(), "https://tunes.example/abcdb/");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    struct NoSource;

    #[async_trait::async_trait]
    impl NeighborhoodSource for NoSource {
        async fn fetch_neighborhood(
            &self,
            _id: models::EntityId,
        ) -> Result<models::NeighborhoodPayload, FetchError> {
            Err(FetchError::Transport {
                reason: "connection failed".to_string(),
            })
        }
    }

    #[test]
    fn test_views_are_scoped_to_their_browser() {
        let state = AppState::new(Arc::new(NoSource));
        let first = state.view(None, None);
        let second = state.view(Some(first.browser.as_str()), None);
        assert_eq!(first.browser, second.browser);
        assert_ne!(first.view, second.view);
        assert!(!Arc::ptr_eq(&first.session, &second.session));
        assert_eq!(state.browser_count(), 1);
        assert_eq!(state.view_count(&first.browser), 2);

        let again = state.view(Some(first.browser.as_str()), Some(first.view.as_str()));
        assert_eq!(again.view, first.view);
        assert!(Arc::ptr_eq(&again.session, &first.session));

        // A view token only resolves inside the browser that owns it.
        let stranger = state.view(None, Some(first.view.as_str()));
        assert_ne!(stranger.browser, first.browser);
        assert_ne!(stranger.view, first.view);
        assert_eq!(state.browser_count(), 2);
    }

    #[test]
    fn test_least_recently_used_view_is_dropped() {
        let state = AppState::new(Arc::new(NoSource));
        let first = state.view(None, None);
        for _ in 0..MAX_VIEWS_PER_BROWSER {
            state.view(Some(first.browser.as_str()), None);
        }
        assert_eq!(state.view_count(&first.browser), MAX_VIEWS_PER_BROWSER);
        let revived = state.view(Some(first.browser.as_str()), Some(first.view.as_str()));
        assert_ne!(revived.view, first.view);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let bad_url = Config::from_lookup(|key| {
            (key == "TUNEGRAPH_UPSTREAM").then(|| "not a url".to_string())
        });
        assert!(matches!(bad_url, Err(ConfigError::Upstream { .. })));

        let bad_timeout = Config::from_lookup(|key| {
            (key == "TUNEGRAPH_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(bad_timeout, Err(ConfigError::Timeout(_))));
    }
}
