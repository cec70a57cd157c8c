//! HTTP front end: maps axum requests onto [`Handler`] events.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{any, get};
use axum::Router;
use bytes::Bytes;
use url::Url;

use crate::error::TranslatorError;
use crate::handler::{Event, Handler, Response};
use crate::normalize::ScriptNormalizer;
use crate::source::MappingSource;

/// Path component of the configured form action.
pub fn route_path(action: &str) -> String {
    let path = match Url::parse(action) {
        Ok(url) => url.path().to_string(),
        Err(_) => action.split(&['?', '#'][..]).next().unwrap_or_default().to_string(),
    };
    if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    }
}

pub fn build_router<S, N>(handler: Arc<Handler<S, N>>) -> Router
where
    S: MappingSource + 'static,
    N: ScriptNormalizer + 'static,
{
    let path = route_path(handler.config().form_action());
    Router::new()
        .route(&path, any(translate::<S, N>))
        .route("/health", get(health))
        .with_state(handler)
}

async fn translate<S, N>(
    State(handler): State<Arc<Handler<S, N>>>,
    method: Method,
    body: Bytes,
) -> axum::response::Response
where
    S: MappingSource + 'static,
    N: ScriptNormalizer + 'static,
{
    let body = match String::from_utf8(body.to_vec()) {
        Ok(body) => body,
        Err(e) => {
            let err = TranslatorError::BadRequest(format!("body is not valid UTF-8: {}", e));
            return into_http(Response::from(err));
        }
    };
    let resp = handler.handle(Event::new(method.as_str(), body)).await;
    into_http(resp)
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn into_http(resp: Response) -> axum::response::Response {
    let status = StatusCode::from_u16(resp.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut out = (status, resp.body).into_response();
    for (name, value) in resp.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            out.headers_mut().insert(name, value);
        }
    }
    out
}
