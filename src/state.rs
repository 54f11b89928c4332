use std::sync::Arc;

use reqwest::Client;
use url::Url;

use crate::mock::context::MockContext;

pub struct AppState {
    pub mock: Arc<MockContext>,
    /// Where unmatched requests are forwarded; `None` answers them with 404.
    pub upstream: Option<Url>,
    pub http_client: Client,
}
