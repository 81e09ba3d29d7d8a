// server/src/models/order.rs

use chrono::{DateTime, Utc};
use foodlane::Order;
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub buyer_email: String,
  pub buyer_name: Option<String>,
  pub food_id: Uuid,
  pub food_name: String,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub total_price: Decimal,
  pub idempotency_key: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
  fn from(row: OrderRow) -> Self {
    Order {
      id: row.id,
      buyer_email: row.buyer_email,
      buyer_name: row.buyer_name,
      food_id: row.food_id,
      food_name: row.food_name,
      quantity: row.quantity,
      unit_price: row.unit_price,
      total_price: row.total_price,
      idempotency_key: row.idempotency_key,
      created_at: row.created_at,
    }
  }
}
