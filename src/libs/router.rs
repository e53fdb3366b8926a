// router.rs
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::to_bytes;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::libs::error::RelayError;
use crate::libs::relay::Relay;

/// Every relayed path starts with this.
pub const API_PREFIX: &str = "/lab5/api/v1/sql";

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

/// Build the HTTP surface: one dispatch handler plus CORS headers that are
/// stamped on every response, preflight or not.
pub fn router(relay: Arc<Relay>) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(AppState { relay })
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
}

/// Method and path are settled before the body is touched, so only a POST
/// under the prefix ever buffers it.
async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    if parts.method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    let path = parts.uri.path();
    if !path.starts_with(API_PREFIX) {
        return RelayError::NotFound.into_response();
    }

    let query = match parts.method {
        Method::GET => query_from_path(path),
        Method::POST => match to_bytes(body, usize::MAX).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                debug!(error = %e, "request body unreadable");
                return RelayError::NoQuery.into_response();
            }
        },
        _ => return RelayError::MethodNotAllowed.into_response(),
    };

    match state.relay.process(&query).await {
        Ok(outcome) => outcome.into_response(),
        Err(err) => err.into_response(),
    }
}

/// Text after `<prefix>/`, percent-decoded. `+` stays a plus sign.
fn query_from_path(path: &str) -> String {
    let separator = format!("{}/", API_PREFIX);
    match path.strip_prefix(&separator) {
        Some(encoded) => percent_decode_str(encoded).decode_utf8_lossy().into_owned(),
        None => String::new(),
    }
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(relay: Arc<Relay>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, prefix = API_PREFIX, "relay listening");
    axum::serve(listener, router(relay)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_path_segment() {
        assert_eq!(
            query_from_path("/lab5/api/v1/sql/SELECT%20*%20FROM%20patient"),
            "SELECT * FROM patient"
        );
        assert_eq!(query_from_path("/lab5/api/v1/sql/a+b"), "a+b");
    }

    #[test]
    fn bare_prefix_has_no_query() {
        assert_eq!(query_from_path("/lab5/api/v1/sql"), "");
        assert_eq!(query_from_path("/lab5/api/v1/sqlite"), "");
    }

    #[test]
    fn keeps_slashes_after_prefix() {
        assert_eq!(
            query_from_path("/lab5/api/v1/sql/SELECT%201%20/%201"),
            "SELECT 1 / 1"
        );
    }
}
