//! Bulletin server wiring: configuration, admin bootstrap and the HTTP app.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use bulletin_core::{
  store::GradeStore,
  user::{NewUser, Role},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `bulletin.toml` and
/// `BULLETIN_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  /// Account created on first start when the users table is empty.
  pub admin_username:      Option<String>,
  /// PHC string produced by `--hash-password`.
  pub admin_password_hash: Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("bulletin.db") }

/// Load configuration from `path` (optional) overlaid with the environment.
pub fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("BULLETIN"))
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
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

// ─── Bootstrap ────────────────────────────────────────────────────────────────

/// Create the configured admin account if no user exists yet.
///
/// Returns whether an account was created.
pub async fn bootstrap_admin<S: GradeStore>(
  store: &S,
  config: &ServerConfig,
) -> anyhow::Result<bool> {
  let existing = store.count_users().await.context("failed to count users")?;
  if existing > 0 {
    return Ok(false);
  }

  let (Some(username), Some(password_hash)) =
    (&config.admin_username, &config.admin_password_hash)
  else {
    tracing::warn!(
      "no user exists and admin_username/admin_password_hash are not set; every request will be rejected"
    );
    return Ok(false);
  };

  store
    .add_user(NewUser {
      username:      username.clone(),
      password_hash: password_hash.clone(),
      role:          Role::Admin,
      student_id:    None,
    })
    .await
    .with_context(|| format!("failed to create admin user {username:?}"))?;
  tracing::info!(%username, "created initial admin account");
  Ok(true)
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full HTTP application: the JSON API under `/api`, with request
/// tracing.
pub fn app<S>(store: Arc<S>) -> Router
where
  S: GradeStore + 'static,
{
  Router::new()
    .nest("/api", bulletin_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}
