//! Runtime configuration.
//!
//! Layered from an optional TOML file and then `HELPDESK_*` environment
//! variables, with `__` separating nested keys:
//!
//! ```toml
//! host          = "0.0.0.0"
//! port          = 8080
//! database_path = "~/.local/share/helpdesk/helpdesk.db"
//!
//! [sla]
//! urgent_hours = 8
//! ```
//!
//! `HELPDESK_PORT=9000` or `HELPDESK_SLA__URGENT_HOURS=4` override the file.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use helpdesk_core::sla::SlaPolicy;
use serde::Deserialize;

pub const ENV_PREFIX: &str = "HELPDESK";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub database_path: PathBuf,
  pub sla:           SlaPolicy,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:          "127.0.0.1".to_string(),
      port:          8080,
      database_path: PathBuf::from("helpdesk.db"),
      sla:           SlaPolicy::default(),
    }
  }
}

/// `HELPDESK_*` variables, `_` after the prefix and `__` between nested keys.
pub fn environment() -> config::Environment {
  config::Environment::with_prefix(ENV_PREFIX)
    .prefix_separator("_")
    .separator("__")
    .try_parsing(true)
}

impl ServerConfig {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> { Self::load_with(path, environment()) }

  fn load_with(path: &Path, env: config::Environment) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(env)
      .build()
      .with_context(|| format!("failed to read config from {path:?}"))?;

    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.sla.validate().context("invalid [sla] section")?;
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
