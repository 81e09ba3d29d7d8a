// core/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MarketError, Result};
use crate::models::food::validate_email;

/// A buyer's completed purchase against one food item. Immutable once
/// written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub buyer_email: String,
  pub buyer_name: Option<String>,
  pub food_id: Uuid,
  pub food_name: String,
  pub quantity: i32,
  /// Catalog price at the moment of purchase.
  pub unit_price: Decimal,
  pub total_price: Decimal,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub idempotency_key: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// What the coordinator hands to the store once stock is reserved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
  pub buyer_email: String,
  pub buyer_name: Option<String>,
  pub food_id: Uuid,
  pub food_name: String,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub idempotency_key: Option<String>,
}

/// Largest order total the ledger stores (`NUMERIC(14, 2)`).
pub const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// `unit_price * quantity`, refused rather than overflowing or exceeding
/// what the ledger can hold.
pub fn order_total(unit_price: Decimal, quantity: i32) -> Result<Decimal> {
  unit_price
    .checked_mul(Decimal::from(quantity))
    .filter(|total| *total <= MAX_ORDER_TOTAL)
    .ok_or_else(|| MarketError::Validation(format!("order total must not exceed {}", MAX_ORDER_TOTAL)))
}

impl NewOrder {
  pub fn into_order(self) -> Result<Order> {
    Ok(Order {
      id: Uuid::new_v4(),
      total_price: order_total(self.unit_price, self.quantity)?,
      buyer_email: self.buyer_email,
      buyer_name: self.buyer_name,
      food_id: self.food_id,
      food_name: self.food_name,
      quantity: self.quantity,
      unit_price: self.unit_price,
      idempotency_key: self.idempotency_key,
      created_at: Utc::now(),
    })
  }
}

/// A purchase intent, already bound to a verified buyer.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrder {
  pub buyer_email: String,
  pub buyer_name: Option<String>,
  pub food_id: Uuid,
  pub quantity: i32,
  pub idempotency_key: Option<String>,
}

impl PlaceOrder {
  pub fn new(buyer_email: impl Into<String>, food_id: Uuid, quantity: i32) -> Self {
    Self {
      buyer_email: buyer_email.into(),
      buyer_name: None,
      food_id,
      quantity,
      idempotency_key: None,
    }
  }

  pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
    self.idempotency_key = Some(key.into());
    self
  }

  pub fn validate(&self) -> Result<()> {
    validate_email(&self.buyer_email)?;
    if self.quantity <= 0 {
      return Err(MarketError::Validation("quantity must be a positive number".to_string()));
    }
    if let Some(key) = &self.idempotency_key {
      if key.trim().is_empty() || key.len() > 128 {
        return Err(MarketError::Validation(
          "idempotency key must be 1-128 characters".to_string(),
        ));
      }
    }
    Ok(())
  }
}

/// Result of `place_order`: the order plus whether it was a replay of an
/// earlier request carrying the same idempotency key.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
  pub order: Order,
  pub replayed: bool,
}
