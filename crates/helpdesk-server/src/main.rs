//! helpdesk server binary.
//!
//! Reads `helpdesk.toml` (or the path given with `--config`) plus
//! `HELPDESK_*` environment overrides, opens the SQLite store, and serves
//! the JSON API over HTTP.
//!
//! ```sh
//! cargo run -p helpdesk-server -- --config helpdesk.toml --seed-demo
//! ```

mod seed;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use helpdesk_api::{EventHub, api_router};
use helpdesk_core::Helpdesk;
use helpdesk_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Helpdesk ticketing server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "helpdesk.toml")]
  config: PathBuf,

  /// Populate an empty directory with demo issue types and analysts.
  #[arg(long)]
  seed_demo: bool,
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

  let database_path = expand_tilde(&server_cfg.database_path);
  let store = SqliteStore::open(&database_path)
    .await
    .with_context(|| format!("failed to open store at {database_path:?}"))?;

  let events = Arc::new(EventHub::new());
  let desk = Arc::new(
    Helpdesk::new(store)
      .with_sla(server_cfg.sla)
      .with_notifier(events.clone()),
  );

  if cli.seed_demo {
    seed::demo_directory(&*desk)
      .await
      .context("failed to seed demo directory")?;
  }

  let app = api_router(desk, events).layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!(sla = ?server_cfg.sla, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
