//! Neighborhood client.
//!
//! Fetches the nodes and links around an entity from the upstream tune
//! database. Every request is one-shot: failures are reported to the caller
//! and never retried.

use crate::models::{EntityId, NeighborhoodPayload, NeighborhoodResponse};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

// ============================================================================
// Errors
// ============================================================================

/// Why a neighborhood request produced no payload. The `Display` text is the
/// message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// No response reached us (connection refused, aborted, timed out).
    #[error("An error occurred while trying to request the tune graph ('0 {reason}').")]
    Transport { reason: String },
    /// The endpoint answered with a non-success status, or with a body that
    /// is not a neighborhood response.
    #[error("Tune graph loading failed with '{status} {status_text}'.")]
    Remote { status: u16, status_text: String },
    /// The endpoint answered but reported a failure of its own.
    #[error("The server replied with '{description}'.")]
    Application { description: String },
}

// ============================================================================
// Source Abstraction
// ============================================================================

/// Anything that can answer a neighborhood query.
#[async_trait]
pub trait NeighborhoodSource: Send + Sync {
    async fn fetch_neighborhood(&self, id: EntityId) -> Result<NeighborhoodPayload, FetchError>;
}

// ============================================================================
// HTTP Client
// ============================================================================

pub struct HttpNeighborhoodClient {
    client: reqwest::Client,
    base: Url,
}

impl HttpNeighborhoodClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    /// `<base>/ajax/graph/<id>/`
    pub fn endpoint(&self, id: EntityId) -> Result<Url, url::ParseError> {
        self.base.join(&format!("ajax/graph/{}/", id))
    }
}

fn transport_reason(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timeout".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        "request aborted".to_string()
    }
}

#[async_trait]
impl NeighborhoodSource for HttpNeighborhoodClient {
    async fn fetch_neighborhood(&self, id: EntityId) -> Result<NeighborhoodPayload, FetchError> {
        let url = self.endpoint(id).map_err(|e| FetchError::Transport {
            reason: e.to_string(),
        })?;
        debug!(%url, "requesting neighborhood");

        let response = self
            .client
            .get(url.clone())
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "neighborhood request did not complete");
                FetchError::Transport {
                    reason: transport_reason(&e),
                }
            })?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "neighborhood request rejected");
            return Err(FetchError::Remote {
                status: status.as_u16(),
                status_text,
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            reason: transport_reason(&e),
        })?;
        let decoded: NeighborhoodResponse = serde_json::from_slice(&body).map_err(|e| {
            warn!(%url, error = %e, "neighborhood response is not valid");
            FetchError::Remote {
                status: status.as_u16(),
                status_text: status_text.clone(),
            }
        })?;

        decoded.into_result().map_err(|description| {
            warn!(%url, %description, "upstream reported an error");
            FetchError::Application { description }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::get,
        Router,
    };

    async fn upstream(Path(id): Path<String>, headers: HeaderMap) -> Response {
        if headers.get("x-requested-with").map(|v| v.as_bytes()) != Some(b"XMLHttpRequest") {
            return StatusCode::BAD_REQUEST.into_response();
        }
        match id.as_str() {
            "s803" => (
                [("content-type", "application/json")],
                r#"{"error": false, "nodes": [{"id": "s803"}, {"id": "t12", "title": "Kesh"}],
                    "links": [{"source": "s803", "target": "t12"}]}"#,
            )
                .into_response(),
            "s1" => (
                [("content-type", "application/json")],
                r#"{"error": true, "description": "not found"}"#,
            )
                .into_response(),
            "s2" => "<html>oops</html>".into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn spawn_upstream() -> Url {
        let app = Router::new().route("/ajax/graph/{id}/", get(upstream));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{}/", addr)).unwrap()
    }

    fn client(base: Url) -> HttpNeighborhoodClient {
        HttpNeighborhoodClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint() {
        let c = client(Url::parse("http://tunes.example/abc/").unwrap());
        assert_eq!(
            c.endpoint(EntityId::Instance(4)).unwrap().as_str(),
            "http://tunes.example/abc/ajax/graph/i4/"
        );
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let c = client(spawn_upstream().await);
        let payload = c.fetch_neighborhood(EntityId::Song(803)).await.unwrap();
        assert_eq!(payload.nodes.len(), 2);
        assert_eq!(payload.links.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_application_error() {
        let c = client(spawn_upstream().await);
        let err = c.fetch_neighborhood(EntityId::Song(1)).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Application {
                description: "not found".to_string()
            }
        );
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_fetch_remote_error() {
        let c = client(spawn_upstream().await);
        let err = c.fetch_neighborhood(EntityId::Title(99)).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Remote {
                status: 404,
                status_text: "Not Found".to_string()
            }
        );
        assert_eq!(err.to_string(), "Tune graph loading failed with '404 Not Found'.");
    }

    #[tokio::test]
    async fn test_fetch_undecodable_body() {
        let c = client(spawn_upstream().await);
        let err = c.fetch_neighborhood(EntityId::Song(2)).await.unwrap_err();
        assert!(matches!(err, FetchError::Remote { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_fetch_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let c = client(Url::parse(&format!("http://{}/", addr)).unwrap());
        let err = c.fetch_neighborhood(EntityId::Song(803)).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
        assert!(err.to_string().starts_with("An error occurred while trying to request"));
    }
}
