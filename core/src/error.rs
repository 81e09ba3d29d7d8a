// core/src/error.rs

//! Error taxonomy shared by every marketplace operation.
//!
//! Client-facing outcomes (`Unauthenticated`, `Forbidden`, `NotFound`,
//! `SelfPurchase`, `InsufficientStock`, `Validation`) are reported
//! synchronously and never retried. `Storage` is the only transient class.

use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },
}

#[derive(Debug, Error)]
pub enum MarketError {
  #[error("Unauthenticated: {reason}")]
  Unauthenticated { reason: String },

  #[error("Forbidden: caller is not entitled to this subject")]
  Forbidden,

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("Buyer cannot purchase their own food item")]
  SelfPurchase,

  #[error("Insufficient stock: requested {requested}, available {available}")]
  InsufficientStock { requested: i32, available: i32 },

  #[error("Validation error: {0}")]
  Validation(String),

  #[error("An order with this idempotency key already exists")]
  DuplicateIdempotencyKey,

  #[error("Storage fault: {source}")]
  Storage {
    #[source]
    source: AnyhowError,
  },

  #[error("Workflow error: {0}")]
  Workflow(#[from] WorkflowError),
}

impl MarketError {
  pub fn unauthenticated(reason: impl Into<String>) -> Self {
    MarketError::Unauthenticated { reason: reason.into() }
  }

  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    MarketError::NotFound {
      entity,
      id: id.to_string(),
    }
  }

  pub fn storage(source: impl Into<AnyhowError>) -> Self {
    MarketError::Storage { source: source.into() }
  }

  /// True for outcomes caused by the request itself (4xx-class).
  pub fn is_client_error(&self) -> bool {
    !matches!(self, MarketError::Storage { .. } | MarketError::Workflow(_))
  }
}

pub type Result<T, E = MarketError> = std::result::Result<T, E>;
