use std::path::PathBuf;

use clap::Parser;
use devmock::{Overrides, constants::server, mock::HandlerRegistry, run};

/// Serve mock routes from ./mock/index.yaml in front of an optional backend.
#[derive(Debug, Parser)]
#[command(name = "devmock", version)]
struct Cli {
    /// Settings file
    #[arg(short, long, default_value = server::DEFAULT_SETTINGS_FILE)]
    config: PathBuf,

    /// Address to listen on
    #[arg(long)]
    addr: Option<String>,

    /// Directory holding index.yaml
    #[arg(long)]
    mock_dir: Option<PathBuf>,

    /// Forward unmatched requests to this URL
    #[arg(long)]
    upstream: Option<String>,

    /// Do not watch the mock directory
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    let overrides = Overrides {
        addr: cli.addr,
        mock_dir: cli.mock_dir,
        upstream: cli.upstream,
        no_watch: cli.no_watch,
    };
    run(cli.config, overrides, HandlerRegistry::with_builtins()).await
}
