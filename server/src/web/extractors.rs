// server/src/web/extractors.rs

use actix_web::{web, FromRequest, HttpRequest};
use foodlane::Identity;
use futures_util::future::{ready, Ready};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

pub const CREDENTIAL_COOKIE: &str = "token";

/// The verified caller of a protected route. Extraction fails with 401
/// before the handler body runs.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl AuthenticatedUser {
  pub fn email(&self) -> &str {
    &self.0.email
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
      warn!("AuthenticatedUser extractor: AppState is not registered.");
      return ready(Err(AppError::Internal("application state missing".to_string())));
    };
    let credential = req.cookie(CREDENTIAL_COOKIE);
    let result = state
      .gate
      .authenticate(credential.as_ref().map(|c| c.value()))
      .map(AuthenticatedUser)
      .map_err(AppError::from);
    ready(result)
  }
}
