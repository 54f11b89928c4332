//! Uniform request handling for compiled rules.

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::debug;

use crate::{
    constants::body::MAX_BODY_SIZE,
    errors::AppError,
    mock::{
        body::{decode_body, decode_multipart, decode_query, is_multipart, merge_fields, read_body},
        handler::{BoxedHandler, MockReply, MockRequest},
        pattern::PathParams,
        rule::MockMethod,
    },
};

/// A handler value as declared in the configuration, resolved at compile time.
#[derive(Clone)]
pub enum HandlerValue {
    Function(BoxedHandler),
    Static(Value),
}

/// A handler ready to serve requests for one method.
#[derive(Clone)]
pub enum WrappedHandler {
    /// Pre-serialized JSON body.
    Static(Bytes),
    Function { handler: BoxedHandler, decode_body: bool },
}

/// Result of running a wrapped handler.
pub enum Outcome {
    Respond(Response),
    /// The handler passed; the request is handed back intact.
    FallThrough(Request),
}

/// Wraps a handler value for `method`. Static values are serialized once here.
pub fn wrap(method: MockMethod, value: &HandlerValue) -> Result<WrappedHandler, serde_json::Error> {
    match value {
        HandlerValue::Static(json) => Ok(WrappedHandler::Static(Bytes::from(serde_json::to_vec(json)?))),
        HandlerValue::Function(handler) => Ok(WrappedHandler::Function {
            handler: handler.clone(),
            decode_body: method.decodes_body(),
        }),
    }
}

impl WrappedHandler {
    pub fn kind(&self) -> &'static str {
        match self {
            WrappedHandler::Static(_) => "static",
            WrappedHandler::Function { .. } => "function",
        }
    }

    pub async fn handle(&self, req: Request, params: PathParams) -> Outcome {
        match self {
            WrappedHandler::Static(json) => Outcome::Respond(
                ([(CONTENT_TYPE, "application/json")], json.clone()).into_response(),
            ),
            WrappedHandler::Function { handler, decode_body: decode } => {
                let (parts, body) = req.into_parts();
                let buffered = read_body(body, MAX_BODY_SIZE).await;
                let raw = buffered.decodable();

                let mut decoded = if *decode { decode_body(&parts.headers, &raw) } else { Value::Null };
                let mut files = Vec::new();
                if !raw.is_empty() && is_multipart(&parts.headers) {
                    let (fields, uploaded) = decode_multipart(&parts.headers, raw.clone()).await;
                    merge_fields(&mut decoded, fields);
                    files = uploaded;
                }

                let mock_req = MockRequest {
                    method: parts.method.clone(),
                    uri: parts.uri.clone(),
                    headers: parts.headers.clone(),
                    params,
                    query: decode_query(parts.uri.query()),
                    raw_body: raw,
                    body: decoded,
                    files,
                };

                match handler.call(mock_req).await {
                    MockReply::Respond(response) => Outcome::Respond(response),
                    MockReply::Next => {
                        debug!("Mock handler passed {} {}", parts.method, parts.uri);
                        match buffered.into_body() {
                            Some(body) => Outcome::FallThrough(Request::from_parts(parts, body)),
                            None => Outcome::Respond(AppError::UnreadableBody.into_response()),
                        }
                    }
                }
            }
        }
    }
}
