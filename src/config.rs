use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Ok};
use serde::Deserialize;
use url::Url;

use crate::constants::{mock, server};

/// Settings for the `devmock` dev server, read from `devmock.yaml`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DevServerConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub mock: MockSettings,
    pub upstream: Option<UpstreamConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: default_addr() }
    }
}

fn default_addr() -> String {
    server::DEFAULT_ADDR.to_string()
}

/// Where the mock configuration lives and how changes to it are watched.
#[derive(Debug, Deserialize, Clone)]
pub struct MockSettings {
    #[serde(default = "default_mock_dir")]
    pub dir: PathBuf,
    /// Directory names whose file changes never trigger a reload.
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,
    #[serde(default = "default_watch")]
    pub watch: bool,
}

impl MockSettings {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), ..Self::default() }
    }
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            dir: default_mock_dir(),
            ignored_dirs: default_ignored_dirs(),
            watch: default_watch(),
        }
    }
}

fn default_mock_dir() -> PathBuf {
    PathBuf::from(mock::DEFAULT_DIR)
}

fn default_ignored_dirs() -> Vec<String> {
    mock::IGNORED_DIRS.iter().map(|d| d.to_string()).collect()
}

fn default_watch() -> bool {
    true
}

/// Real backend that unmatched requests are forwarded to.
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub url: String,
}

impl DevServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: DevServerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(upstream) = &self.upstream {
            let url = Url::parse(&upstream.url)
                .with_context(|| format!("Invalid upstream URL: {}", upstream.url))?;
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("Only HTTP and HTTPS upstreams are supported, got: {}", url.scheme());
            }
        }
        Ok(())
    }
}
