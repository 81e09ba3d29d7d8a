// server/src/web/handlers/user_handlers.rs

use actix_web::{web, HttpResponse};
use foodlane::NewUser;
use tracing::{info, instrument};

use crate::errors::Result;
use crate::state::AppState;

#[instrument(name = "handler::create_user", skip(app_state, payload), fields(email = %payload.email))]
pub async fn create_user_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<NewUser>,
) -> Result<HttpResponse> {
  let new_user = payload.into_inner();
  new_user.validate()?;
  let user = app_state.users.insert_user(new_user).await?;
  info!(user_id = %user.id, "User profile stored.");
  Ok(HttpResponse::Created().json(user))
}
