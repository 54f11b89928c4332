#![allow(dead_code)]

use std::{fs, sync::Arc};

use axum::{Router, body::Body, http::Request, response::Response};
use devmock::{
    apply_mock,
    config::MockSettings,
    mock::{HandlerRegistry, MockContext},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct Harness {
    pub dir: TempDir,
    pub ctx: Arc<MockContext>,
}

impl Harness {
    /// A mock directory holding `index.yaml` with `config`, compiled once.
    pub fn new(config: &str, registry: HandlerRegistry) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.yaml"), config).unwrap();
        let settings = MockSettings { watch: false, ..MockSettings::new(dir.path()) };
        let ctx = MockContext::new(settings, registry);
        ctx.apply();
        Self { dir, ctx }
    }

    pub fn rewrite(&self, config: &str) {
        fs::write(self.dir.path().join("index.yaml"), config).unwrap();
    }

    /// Router whose fallback plays the real backend: echoes the body.
    pub fn router(&self) -> Router {
        let backend = Router::new().fallback(|body: Body| async move {
            let bytes = body.collect().await.map(|c| c.to_bytes()).unwrap_or_default();
            format!("backend:{}", String::from_utf8_lossy(&bytes))
        });
        apply_mock(backend, self.ctx.clone())
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        self.router().oneshot(req).await.unwrap()
    }
}

pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

pub fn request_with(method: &str, uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", content_type)
        .body(body.into())
        .unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
