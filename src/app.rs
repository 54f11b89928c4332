use std::sync::Arc;

use anyhow::Error;
use axum::{extract::Request, middleware::from_fn, routing::get, Router};
use http::StatusCode;
use tower_http::trace::TraceLayer;

use crate::{
    middleware::{apply_mock, request_id::layer as request_id_layer},
    proxy::proxy_handler,
    state::AppState,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Builds the dev server: mock rules first, then the upstream proxy (or 404)
/// for anything the rules do not claim.
pub fn create_app(state: Arc<AppState>) -> Result<Router, Error> {
    let mock = state.mock.clone();

    let router = Router::new()
        .route("/__devmock/health", get(|| async { (StatusCode::OK, "OK") }))
        .fallback(proxy_handler)
        .with_state(state);

    let router = apply_mock(router, mock);

    Ok(router
        .layer(
        TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

            tracing::info_span!(
                    "request",
                    id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
            )
        })
        )
        .layer(from_fn(request_id_layer))
    )
}
