// server/src/models/food.rs

use chrono::{DateTime, Utc};
use foodlane::FoodItem;
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct FoodRow {
  pub id: Uuid,
  pub seller_email: String,
  pub seller_name: Option<String>,
  pub name: String,
  pub category: Option<String>,
  pub image_url: Option<String>,
  pub origin: Option<String>,
  pub description: Option<String>,
  pub price: Decimal,
  pub quantity: i32,
  pub order_count: i32,
  pub created_at: DateTime<Utc>,
}

impl From<FoodRow> for FoodItem {
  fn from(row: FoodRow) -> Self {
    FoodItem {
      id: row.id,
      seller_email: row.seller_email,
      seller_name: row.seller_name,
      name: row.name,
      category: row.category,
      image_url: row.image_url,
      origin: row.origin,
      description: row.description,
      price: row.price,
      quantity: row.quantity,
      order_count: row.order_count,
      created_at: row.created_at,
    }
  }
}
