//! The mock interception layer.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{Next, from_fn_with_state},
    response::Response,
};
use tracing::debug;

use crate::mock::{context::MockContext, matcher::match_request, wrapper::Outcome};

/// Registers the mock layer on `router`. Routes and fallbacks added before
/// this call are shadowed by matching mock rules; everything else falls
/// through untouched.
pub fn apply_mock<S>(router: Router<S>, ctx: Arc<MockContext>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(ctx, layer))
}

pub async fn layer(State(ctx): State<Arc<MockContext>>, req: Request, next: Next) -> Response {
    let rules = ctx.rules();
    if rules.is_empty() {
        return next.run(req).await;
    }

    let Some(matched) = match_request(req.method(), req.uri().path(), &rules) else {
        return next.run(req).await;
    };
    debug!("mock matched: [{}] {}", matched.rule.method, matched.rule.pattern);

    match matched.rule.handler.handle(req, matched.params).await {
        Outcome::Respond(response) => response,
        Outcome::FallThrough(req) => next.run(req).await,
    }
}
