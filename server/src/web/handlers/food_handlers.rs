// server/src/web/handlers/food_handlers.rs

use actix_web::{web, HttpResponse};
use foodlane::{FoodPatch, MarketError, NewFoodItem, Page, Scope};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::Result;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

pub const TOP_FOODS_LIMIT: usize = 6;

/// Raw paging values; anything unparseable falls back to the defaults.
#[derive(Deserialize, Debug)]
pub struct ListFoodsQuery {
  pub page: Option<String>,
  pub size: Option<String>,
}

#[instrument(name = "handler::list_foods", skip(app_state, query))]
pub async fn list_foods_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListFoodsQuery>,
) -> Result<HttpResponse> {
  let page = Page::from_query(query.page.as_deref(), query.size.as_deref());
  let foods = app_state.store.list_page(page).await?;
  info!(page = page.number(), size = page.size(), returned = foods.len(), "Listed foods.");
  Ok(HttpResponse::Ok().json(foods))
}

/// Responds `null` for unknown or malformed ids.
#[instrument(name = "handler::get_food", skip(app_state, path), fields(food_id = %path.as_str()))]
pub async fn get_food_handler(app_state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
  let food = match Uuid::parse_str(path.trim()) {
    Ok(id) => app_state.store.get_food(id).await?,
    Err(_) => None,
  };
  Ok(HttpResponse::Ok().json(food))
}

#[instrument(name = "handler::list_foods_by_seller", skip(app_state, path), fields(seller = %path.as_str()))]
pub async fn list_foods_by_seller_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse> {
  let foods = app_state.store.list_by_seller(path.trim()).await?;
  Ok(HttpResponse::Ok().json(foods))
}

pub async fn count_foods_handler(app_state: web::Data<AppState>) -> Result<HttpResponse> {
  let count = app_state.store.count_foods().await?;
  Ok(HttpResponse::Ok().json(json!({ "count": count })))
}

pub async fn top_foods_handler(app_state: web::Data<AppState>) -> Result<HttpResponse> {
  let foods = app_state.store.list_top_ordered(TOP_FOODS_LIMIT).await?;
  Ok(HttpResponse::Ok().json(foods))
}

#[instrument(
  name = "handler::create_food",
  skip(app_state, auth_user, payload),
  fields(caller = %auth_user.email(), name = %payload.name)
)]
pub async fn create_food_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<NewFoodItem>,
) -> Result<HttpResponse> {
  let mut new_item = payload.into_inner();
  new_item.validate()?;
  if let Some(seller) = new_item.seller_email.as_deref() {
    app_state.gate.authorize(&auth_user.0, Scope::Subject(seller))?;
  }

  let seller_email = auth_user.email().to_string();
  if new_item.seller_name.is_none() {
    new_item.seller_name = auth_user.0.name.clone();
  }
  let created = app_state.store.insert_food(new_item.into_item(seller_email)).await?;
  info!(food_id = %created.id, "Food listed.");
  Ok(HttpResponse::Created().json(created))
}

#[instrument(
  name = "handler::update_food",
  skip(app_state, auth_user, path, payload),
  fields(caller = %auth_user.email(), food_id = %*path)
)]
pub async fn update_food_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<FoodPatch>,
) -> Result<HttpResponse> {
  let food_id = path.into_inner();
  let patch = payload.into_inner();
  patch.validate()?;

  let existing = app_state
    .store
    .get_food(food_id)
    .await?
    .ok_or_else(|| MarketError::not_found("food", food_id))?;
  app_state
    .gate
    .authorize(&auth_user.0, Scope::Subject(&existing.seller_email))?;

  if patch.is_empty() {
    warn!("Empty patch; returning the listing unchanged.");
    return Ok(HttpResponse::Ok().json(existing));
  }
  let updated = app_state.store.update_food(food_id, &patch).await?;
  info!("Food updated.");
  Ok(HttpResponse::Ok().json(updated))
}

#[instrument(
  name = "handler::delete_food",
  skip(app_state, auth_user, path),
  fields(caller = %auth_user.email(), food_id = %*path)
)]
pub async fn delete_food_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let food_id = path.into_inner();
  let existing = app_state
    .store
    .get_food(food_id)
    .await?
    .ok_or_else(|| MarketError::not_found("food", food_id))?;
  app_state
    .gate
    .authorize(&auth_user.0, Scope::Subject(&existing.seller_email))?;

  app_state.store.delete_food(food_id).await?;
  info!("Food deleted.");
  Ok(HttpResponse::NoContent().finish())
}
