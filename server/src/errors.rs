// server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use foodlane::MarketError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Market(#[from] MarketError),

  /// Malformed body, path or query, rejected before reaching the domain.
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl AppError {
  fn client_message(&self) -> String {
    match self {
      AppError::Market(MarketError::Unauthenticated { .. }) => "unauthorized access".to_string(),
      AppError::Market(MarketError::Forbidden) => "forbidden access".to_string(),
      AppError::Market(MarketError::SelfPurchase) => "You cannot buy your own food".to_string(),
      AppError::Market(MarketError::InsufficientStock { .. }) => "Not enough food".to_string(),
      AppError::Market(MarketError::NotFound { entity, .. }) => format!("{} not found", entity),
      AppError::Market(MarketError::Validation(m)) | AppError::Validation(m) => m.clone(),
      AppError::Market(MarketError::DuplicateIdempotencyKey) => {
        "An order with this idempotency key already exists".to_string()
      }
      _ => "Internal error".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Market(err) => match err {
        MarketError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
        MarketError::Forbidden => StatusCode::FORBIDDEN,
        MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
        MarketError::SelfPurchase | MarketError::InsufficientStock { .. } | MarketError::Validation(_) => {
          StatusCode::BAD_REQUEST
        }
        MarketError::DuplicateIdempotencyKey => StatusCode::CONFLICT,
        MarketError::Storage { .. } | MarketError::Workflow(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Migrate(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      // Full detail stays in the log; the caller only sees the generic message.
      tracing::error!(application_error = ?self, "Responding with internal error");
    } else {
      tracing::info!(application_error = %self, status = status.as_u16(), "Responding with client error");
    }
    HttpResponse::build(status).json(json!({ "message": self.client_message() }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
