// server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use foodlane::{MarketError, PlaceOrder, Scope};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

#[derive(Deserialize, Debug)]
pub struct OrdersQuery {
  pub email: Option<String>,
}

/// Clients send the quantity either as a JSON number or as a numeric string.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum QuantityInput {
  Number(i64),
  Text(String),
}

impl QuantityInput {
  fn to_quantity(&self) -> Result<i32> {
    let raw = match self {
      QuantityInput::Number(n) => *n,
      QuantityInput::Text(s) => s
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("'{}' is not a whole number", s)))?,
    };
    i32::try_from(raw).map_err(|_| AppError::Validation("quantity is out of range".to_string()))
  }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderPayload {
  pub food_id: Uuid,
  pub quantity: QuantityInput,
  pub buyer_email: Option<String>,
  pub buyer_name: Option<String>,
  pub idempotency_key: Option<String>,
}

#[instrument(name = "handler::list_orders", skip(app_state, auth_user, query), fields(caller = %auth_user.email()))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query: web::Query<OrdersQuery>,
) -> Result<HttpResponse> {
  // Without an email there is no subject to match, so nothing is visible.
  let buyer_email = query.email.as_deref().ok_or(MarketError::Forbidden)?;
  app_state.gate.authorize(&auth_user.0, Scope::Subject(buyer_email))?;

  let orders = app_state.store.list_by_buyer(buyer_email.trim()).await?;
  info!(returned = orders.len(), "Listed orders.");
  Ok(HttpResponse::Ok().json(orders))
}

/// `201` for a fresh order, `200` when the idempotency key replays an
/// earlier one.
#[instrument(
  name = "handler::place_order",
  skip(app_state, auth_user, req, payload),
  fields(caller = %auth_user.email(), food_id = %payload.food_id)
)]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req: HttpRequest,
  payload: web::Json<PlaceOrderPayload>,
) -> Result<HttpResponse> {
  let payload = payload.into_inner();
  if let Some(buyer_email) = payload.buyer_email.as_deref() {
    app_state.gate.authorize(&auth_user.0, Scope::Subject(buyer_email))?;
  }

  let header_key = match req.headers().get(IDEMPOTENCY_KEY_HEADER) {
    Some(value) => Some(
      value
        .to_str()
        .map_err(|_| AppError::Validation("Idempotency-Key must be visible ASCII".to_string()))?
        .to_string(),
    ),
    None => None,
  };

  let intent = PlaceOrder {
    buyer_email: auth_user.email().to_string(),
    buyer_name: payload.buyer_name.or_else(|| auth_user.0.name.clone()),
    food_id: payload.food_id,
    quantity: payload.quantity.to_quantity()?,
    idempotency_key: header_key.or(payload.idempotency_key),
  };

  let placement = app_state.coordinator.place_order(intent).await?;
  info!(order_id = %placement.order.id, replayed = placement.replayed, "Order placed.");
  if placement.replayed {
    Ok(HttpResponse::Ok().json(placement.order))
  } else {
    Ok(HttpResponse::Created().json(placement.order))
  }
}

#[instrument(
  name = "handler::delete_order",
  skip(app_state, auth_user, path),
  fields(caller = %auth_user.email(), order_id = %*path)
)]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let order_id = path.into_inner();
  let order = app_state
    .store
    .get_order(order_id)
    .await?
    .ok_or_else(|| MarketError::not_found("order", order_id))?;
  app_state
    .gate
    .authorize(&auth_user.0, Scope::Subject(&order.buyer_email))?;

  app_state.store.delete_order(order_id).await?;
  info!("Order deleted.");
  Ok(HttpResponse::NoContent().finish())
}
