//! Handlers the `devmock` binary registers out of the box.

use async_trait::async_trait;
use http::StatusCode;
use serde_json::{Value, json};
use tracing::debug;

use super::handler::{HandlerRegistry, MockHandler, MockReply, MockRequest};

/// Replies with everything the handler saw: method, path, params, query,
/// decoded body and uploaded file names.
pub struct EchoHandler;

#[async_trait]
impl MockHandler for EchoHandler {
    async fn call(&self, req: MockRequest) -> MockReply {
        let files: Vec<Value> = req
            .files
            .iter()
            .map(|f| json!({ "field": f.field, "fileName": f.file_name, "size": f.data.len() }))
            .collect();

        MockReply::json(json!({
            "method": req.method.as_str(),
            "path": req.uri.path(),
            "params": req.params,
            "query": req.query,
            "body": req.body,
            "files": files,
        }))
    }
}

/// Always hands the request on. Placed before a broader rule it carves a
/// hole in it.
pub struct PassHandler;

#[async_trait]
impl MockHandler for PassHandler {
    async fn call(&self, req: MockRequest) -> MockReply {
        debug!("PassHandler: {} {}", req.method, req.uri.path());
        MockReply::Next
    }
}

pub struct NoContentHandler;

#[async_trait]
impl MockHandler for NoContentHandler {
    async fn call(&self, _req: MockRequest) -> MockReply {
        MockReply::respond(StatusCode::NO_CONTENT)
    }
}

impl HandlerRegistry {
    /// Registry preloaded with `echo`, `pass` and `no_content`.
    pub fn with_builtins() -> Self {
        Self::new()
            .register("echo", EchoHandler)
            .register("pass", PassHandler)
            .register("no_content", NoContentHandler)
    }
}
