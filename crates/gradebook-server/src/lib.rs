//! Server assembly for the gradebook: configuration, seeding, and the HTTP
//! application.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use config::{ConfigError, Environment, File, Source};
use gradebook_core::{policy::AveragingPolicy, record::ReferenceData, store::GradebookStore};
use gradebook_engine::Engine;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `GRADEBOOK_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// JSON [`ReferenceData`] loaded into the store at startup.
  pub seed_path:  Option<PathBuf>,
  #[serde(default)]
  pub averaging:  AveragingPolicy,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("gradebook.db") }

impl ServerConfig {
  /// Read `path` (optional) overlaid by the environment. Nested keys use a
  /// double underscore, e.g. `GRADEBOOK_AVERAGING__FINAL_WEIGHT=3`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_source(File::from(path).required(false))
  }

  fn from_source(file: impl Source + Send + Sync + 'static) -> Result<Self, ConfigError> {
    config::Config::builder()
      .add_source(file)
      .add_source(
        Environment::with_prefix("GRADEBOOK")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Seeding ──────────────────────────────────────────────────────────────────

pub fn load_seed(path: &Path) -> anyhow::Result<ReferenceData> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read seed file {path:?}"))?;
  serde_json::from_str(&raw).with_context(|| format!("failed to parse seed file {path:?}"))
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

// ─── Application ──────────────────────────────────────────────────────────────

/// The API router with request tracing.
pub fn app<S>(engine: Arc<Engine<S>>) -> Router
where
  S: GradebookStore + 'static,
{
  gradebook_api::api_router(engine).layer(TraceLayer::new_for_http())
}
