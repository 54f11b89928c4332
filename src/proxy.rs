//! Fall-through handler forwarding unmatched requests to the real backend.

use axum::{body::Body, extract::State, http::HeaderMap, response::Response};
use bytes::Bytes;
use http::{Method, Uri, header};
use http_body_util::BodyExt;
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::{errors::AppError, state::AppState};

/// Headers that describe a single hop and must not be forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn filter_hop_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for (name, value) in headers {
        if !HOP_BY_HOP.contains(&name.as_str()) && *name != header::HOST {
            forwarded.append(name, value.clone());
        }
    }
    forwarded
}

/// Joins the upstream base with the request path and query.
pub fn destination_url(upstream: &Url, uri: &Uri) -> Result<Url, AppError> {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let base = upstream.as_str().trim_end_matches('/');
    Url::parse(&format!("{}{}", base, path_and_query))
        .map_err(|_| AppError::InvalidUpstream(upstream.to_string()))
}

pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, AppError> {
    let upstream = state.upstream.as_ref().ok_or(AppError::NoUpstream)?;
    let destination = destination_url(upstream, &uri)?;
    info!(destination = %destination, "Forwarding unmatched request upstream");

    let body_bytes: Bytes = body
        .collect()
        .await
        .map_err(|_| AppError::InternalServerError)?
        .to_bytes();

    let request = state
        .http_client
        .request(method, destination.clone())
        .headers(filter_hop_headers(&headers))
        .body(body_bytes)
        .build()
        .map_err(|_| AppError::InvalidUpstream(destination.to_string()))?;

    let response = state.http_client.execute(request).await?;

    let status = response.status();
    let response_headers = filter_hop_headers(response.headers());
    let bytes = response.bytes().await?;

    let mut builder = Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        headers.extend(response_headers);
    }
    builder
        .body(Body::from(bytes))
        .map_err(|_| AppError::InternalServerError)
}
