//! Permissive request body decoding for function handlers.
//!
//! Nothing here fails a request: every decoder returns whatever it managed to
//! extract and logs the rest at debug level.

use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{FromRequest, Multipart},
    http::Request,
};
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, stream};
use http::{HeaderMap, header::CONTENT_TYPE};
use http_body_util::BodyExt;
use serde_json::{Map, Value};
use tracing::debug;
use url::form_urlencoded;

use crate::mock::handler::UploadedFile;

/// Outcome of buffering a request body against a size cap.
pub enum BufferedBody {
    Complete(Bytes),
    /// The cap was exceeded. `prefix` holds what was read so far and `rest`
    /// the unread remainder of the stream.
    Overflow { prefix: Bytes, rest: Body },
    /// The stream failed; the body is gone.
    Failed,
}

impl BufferedBody {
    /// The bytes a handler gets to decode. Anything but a complete body is
    /// treated as empty.
    pub fn decodable(&self) -> Bytes {
        match self {
            BufferedBody::Complete(bytes) => bytes.clone(),
            _ => Bytes::new(),
        }
    }

    /// Reassembles the original body for the next middleware, or `None` if
    /// it could not be read.
    pub fn into_body(self) -> Option<Body> {
        match self {
            BufferedBody::Complete(bytes) => Some(Body::from(bytes)),
            BufferedBody::Overflow { prefix, rest } => {
                let head = stream::iter([Ok::<Bytes, axum::Error>(prefix)]);
                Some(Body::from_stream(head.chain(rest.into_data_stream())))
            }
            BufferedBody::Failed => None,
        }
    }
}

/// Buffers the body up to `limit` bytes without losing anything past it.
pub async fn read_body(mut body: Body, limit: usize) -> BufferedBody {
    let mut buf = BytesMut::new();
    loop {
        match body.frame().await {
            None => return BufferedBody::Complete(buf.freeze()),
            Some(Ok(frame)) => {
                // Trailers carry no body data
                let Ok(data) = frame.into_data() else { continue };
                buf.extend_from_slice(&data);
                if buf.len() > limit {
                    debug!(limit, "Request body exceeds decode limit, skipping decoding");
                    return BufferedBody::Overflow { prefix: buf.freeze(), rest: body };
                }
            }
            Some(Err(e)) => {
                debug!("Discarding unreadable request body: {}", e);
                return BufferedBody::Failed;
            }
        }
    }
}

fn media_type(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = value.split(';').next()?.trim().to_ascii_lowercase();
    Some(essence)
}

/// Decodes the body the way a lenient JSON parser followed by a form parser
/// would: JSON wins when the content type says JSON, otherwise URL-encoded
/// form fields are tried.
pub fn decode_body(headers: &HeaderMap, bytes: &Bytes) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }

    match media_type(headers).as_deref() {
        Some(mt) if mt == "application/json" || mt.ends_with("+json") => {
            serde_json::from_slice(bytes).unwrap_or_else(|e| {
                debug!("Ignoring malformed JSON body: {}", e);
                Value::Null
            })
        }
        Some("application/x-www-form-urlencoded") => Value::Object(decode_form(bytes)),
        _ => Value::Null,
    }
}

/// Form fields; repeated keys collect into an array in arrival order.
pub fn decode_form(bytes: &[u8]) -> Map<String, Value> {
    let mut fields = Map::new();
    for (key, value) in form_urlencoded::parse(bytes) {
        insert_field(&mut fields, key.into_owned(), Value::String(value.into_owned()));
    }
    fields
}

pub fn decode_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn insert_field(fields: &mut Map<String, Value>, key: String, value: Value) {
    match fields.get_mut(&key) {
        Some(Value::Array(existing)) => existing.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            fields.insert(key, value);
        }
    }
}

pub fn is_multipart(headers: &HeaderMap) -> bool {
    media_type(headers).is_some_and(|mt| mt == "multipart/form-data")
}

/// Parses a `multipart/form-data` body into text fields and files. Stops at
/// the first malformed part and keeps what was read before it.
pub async fn decode_multipart(headers: &HeaderMap, bytes: Bytes) -> (Map<String, Value>, Vec<UploadedFile>) {
    let mut fields = Map::new();
    let mut files = Vec::new();

    let mut req = Request::new(Body::from(bytes));
    *req.headers_mut() = headers.clone();

    let mut multipart = match Multipart::from_request(req, &()).await {
        Ok(multipart) => multipart,
        Err(e) => {
            debug!("Skipping multipart decoding: {}", e);
            return (fields, files);
        }
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                debug!("Stopping at malformed multipart field: {}", e);
                break;
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        if file_name.is_some() {
            match field.bytes().await {
                Ok(data) => files.push(UploadedFile { field: name, file_name, content_type, data }),
                Err(e) => {
                    debug!("Dropping unreadable multipart file {}: {}", name, e);
                    break;
                }
            }
        } else {
            match field.text().await {
                Ok(text) => insert_field(&mut fields, name, Value::String(text)),
                Err(e) => {
                    debug!("Dropping unreadable multipart field {}: {}", name, e);
                    break;
                }
            }
        }
    }

    (fields, files)
}

/// Folds multipart text fields into the decoded body.
pub fn merge_fields(body: &mut Value, fields: Map<String, Value>) {
    if fields.is_empty() {
        return;
    }
    match body {
        Value::Object(existing) => existing.extend(fields),
        _ => *body = Value::Object(fields),
    }
}
