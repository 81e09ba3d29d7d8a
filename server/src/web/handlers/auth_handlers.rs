// server/src/web/handlers/auth_handlers.rs

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpResponse};
use foodlane::IdentityClaim;
use serde_json::json;
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::state::AppState;
use crate::web::extractors::CREDENTIAL_COOKIE;

/// Cross-site cookies must be `Secure`; plain-HTTP deployments fall back to
/// a same-site-only cookie.
fn credential_cookie(config: &AppConfig, value: String, max_age_secs: i64) -> Cookie<'static> {
  let same_site = if config.cookie_secure { SameSite::None } else { SameSite::Strict };
  Cookie::build(CREDENTIAL_COOKIE, value)
    .path("/")
    .http_only(true)
    .secure(config.cookie_secure)
    .same_site(same_site)
    .max_age(CookieDuration::seconds(max_age_secs))
    .finish()
}

#[instrument(name = "handler::issue_token", skip(app_state, payload), fields(email = %payload.email))]
pub async fn issue_token_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<IdentityClaim>,
) -> Result<HttpResponse> {
  let issued = app_state.tokens.issue(payload.into_inner())?;
  let cookie = credential_cookie(
    &app_state.config,
    issued.token,
    app_state.tokens.ttl().num_seconds(),
  );
  info!(expires_at = %issued.expires_at, "Credential issued.");
  Ok(HttpResponse::Ok().cookie(cookie).json(json!({ "success": true })))
}

pub async fn logout_handler(app_state: web::Data<AppState>) -> HttpResponse {
  let mut cookie = credential_cookie(&app_state.config, String::new(), 0);
  cookie.make_removal();
  HttpResponse::Ok().cookie(cookie).json(json!({ "success": true }))
}
