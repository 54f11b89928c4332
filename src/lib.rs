//! # devmock
//!
//! A mock layer for local development servers built on Axum, featuring:
//! - Route keys like `"GET /api/user/:id"` mapped to static JSON or Rust handlers
//! - First-match rule ordering with method expansion for method-less keys
//! - Hot reload of `mock/index.yaml` without restarting the server
//! - Degraded mode that lets every request through while the config is broken
//! - Fall-through to a real upstream for unmatched requests

pub mod config;
pub mod errors;
pub mod app;
pub mod state;
pub mod proxy;
pub mod middleware;
pub mod mock;
pub mod utils;
pub mod constants;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Result;
use dotenvy::dotenv;
use reqwest::Client;
use tokio::net::TcpListener;
use tracing::info;
use url::Url;

use crate::config::DevServerConfig;
use crate::mock::{HandlerRegistry, MockContext};
use crate::state::AppState;
use crate::utils::logging::*;

pub use crate::middleware::apply_mock;

/// Command-line overrides applied on top of the settings file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub addr: Option<String>,
    pub mock_dir: Option<PathBuf>,
    pub upstream: Option<String>,
    pub no_watch: bool,
}

/// Starts the dev server.
///
/// # Arguments
/// * `settings_path` - Path to the devmock.yaml settings file (optional on disk)
/// * `overrides` - CLI values that win over the file
/// * `registry` - Function handlers the mock config may reference with `!fn`
pub async fn run(settings_path: PathBuf, overrides: Overrides, registry: HandlerRegistry) -> Result<()> {
    dotenv().ok();
    init_tracing();

    log_startup("settings", "loading", None);
    let mut config = DevServerConfig::load_or_default(&settings_path)?;
    if let Some(addr) = overrides.addr {
        config.server.addr = addr;
    }
    if let Some(dir) = overrides.mock_dir {
        config.mock.dir = dir;
    }
    if let Some(url) = overrides.upstream {
        config.upstream = Some(crate::config::UpstreamConfig { url });
    }
    if overrides.no_watch {
        config.mock.watch = false;
    }
    config.validate()?;
    log_startup("settings", "loaded", None);

    let upstream = config
        .upstream
        .as_ref()
        .map(|u| Url::parse(&u.url))
        .transpose()?;
    if let Some(url) = &upstream {
        log_startup("upstream", "configured", Some(url.as_str()));
    }

    log_startup("mock", "compiling", None);
    let mock = MockContext::start(config.mock.clone(), registry);

    let app_state = Arc::new(AppState {
        mock: mock.clone(),
        upstream,
        http_client: Client::new(),
    });

    let app = app::create_app(app_state)?;

    let addr = config.server.addr.clone();
    let listener = TcpListener::bind(&addr).await?;
    info!("devmock listening on {}", &addr);

    let served = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    mock.dispose();
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
