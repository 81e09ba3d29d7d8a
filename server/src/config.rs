// server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

const MIN_SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// `None` selects the in-process store.
  pub database_url: Option<String>,
  pub access_token_secret: String,
  pub token_ttl_secs: i64,
  /// Marks the credential cookie `Secure` with `SameSite=None`.
  pub cookie_secure: bool,
  pub run_migrations: bool,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("access_token_secret", &"[REDACTED]")
      .field("token_ttl_secs", &self.token_ttl_secs)
      .field("cookie_secure", &self.cookie_secure)
      .field("run_migrations", &self.run_migrations)
      .finish()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let get_bool = |var_name: &str, default: bool| -> Result<bool> {
      match env::var(var_name) {
        Ok(raw) => raw
          .trim()
          .parse::<bool>()
          .map_err(|e| AppError::Config(format!("Invalid {} value: {}", var_name, e))),
        Err(_) => Ok(default),
      }
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "5000".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());

    let access_token_secret = get_env("ACCESS_TOKEN_SECRET")?;
    if access_token_secret.len() < MIN_SECRET_LEN {
      return Err(AppError::Config(format!(
        "ACCESS_TOKEN_SECRET must be at least {} bytes",
        MIN_SECRET_LEN
      )));
    }

    let token_ttl_secs = get_env("TOKEN_TTL_SECS")
      .unwrap_or_else(|_| foodlane::DEFAULT_TOKEN_TTL_SECS.to_string())
      .parse::<i64>()
      .map_err(|e| AppError::Config(format!("Invalid TOKEN_TTL_SECS: {}", e)))?;
    if token_ttl_secs <= 0 {
      return Err(AppError::Config("TOKEN_TTL_SECS must be positive".to_string()));
    }

    let cookie_secure = get_bool("COOKIE_SECURE", true)?;
    let run_migrations = get_bool("RUN_MIGRATIONS", true)?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      access_token_secret,
      token_ttl_secs,
      cookie_secure,
      run_migrations,
    })
  }

  pub fn token_ttl(&self) -> chrono::Duration {
    chrono::Duration::seconds(self.token_ttl_secs)
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
