//! Org directory server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! cache, starts loading the directory in the background and serves the JSON
//! API over HTTP. Reads answer `503` until the first load completes.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use orgdir_server::ServerConfig;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Org directory API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  let directory = orgdir_server::build_directory(&server_cfg).await?;

  // Initial load runs behind the listener.
  tokio::spawn({
    let directory = directory.clone();
    async move {
      directory.load().await;
    }
  });

  let app = orgdir_server::app(directory);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      tokio::signal::ctrl_c().await.ok();
    })
    .await
    .context("server error")?;

  Ok(())
}
