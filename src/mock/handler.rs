//! User handlers and the registry that makes them addressable from config.
//!
//! A configuration file cannot carry code, so function handlers are written
//! in Rust, registered here under a name and referenced from the mock file
//! with a `!fn <name>` tag.

use std::{collections::HashMap, future::Future, sync::Arc};

use async_trait::async_trait;
use axum::{Json, response::{IntoResponse, Response}};
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde_json::Value;

use crate::mock::pattern::PathParams;

/// A file received in a `multipart/form-data` body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// The request as seen by a function handler, with its body already decoded.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub params: PathParams,
    pub query: HashMap<String, String>,
    /// Raw body bytes as received.
    pub raw_body: Bytes,
    /// Best-effort decoded body: JSON, form fields and multipart text fields.
    /// `Value::Null` when nothing could be decoded.
    pub body: Value,
    pub files: Vec<UploadedFile>,
}

impl MockRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// What a function handler decided to do with a request.
pub enum MockReply {
    Respond(Response),
    /// Let the request continue to the next middleware.
    Next,
}

impl MockReply {
    pub fn respond(response: impl IntoResponse) -> Self {
        MockReply::Respond(response.into_response())
    }

    pub fn json(value: Value) -> Self {
        MockReply::Respond(Json(value).into_response())
    }
}

#[async_trait]
pub trait MockHandler: Send + Sync {
    async fn call(&self, req: MockRequest) -> MockReply;
}

#[async_trait]
impl<F, Fut> MockHandler for F
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockReply> + Send + 'static,
{
    async fn call(&self, req: MockRequest) -> MockReply {
        (self)(req).await
    }
}

pub type BoxedHandler = Arc<dyn MockHandler>;

/// Named function handlers available to the mock configuration.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, BoxedHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H: MockHandler + 'static>(mut self, name: impl Into<String>, handler: H) -> Self {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn get(&self, name: &str) -> Option<BoxedHandler> {
        self.handlers.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
