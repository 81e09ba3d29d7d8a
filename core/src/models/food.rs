// core/src/models/food.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MarketError, Result};

/// A seller's listed product.
///
/// `quantity` never goes negative; `order_count` only ever grows, and only
/// through a successful reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
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

/// Body of a create request. The seller defaults to the caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFoodItem {
  pub seller_email: Option<String>,
  pub seller_name: Option<String>,
  pub name: String,
  pub category: Option<String>,
  pub image_url: Option<String>,
  pub origin: Option<String>,
  pub description: Option<String>,
  pub price: Decimal,
  pub quantity: i32,
}

impl NewFoodItem {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(MarketError::Validation("name is required".to_string()));
    }
    validate_price(self.price)?;
    validate_quantity(self.quantity)?;
    if let Some(email) = &self.seller_email {
      validate_email(email)?;
    }
    Ok(())
  }

  /// Materializes the record owned by `seller_email`.
  pub fn into_item(self, seller_email: String) -> FoodItem {
    FoodItem {
      id: Uuid::new_v4(),
      seller_email,
      seller_name: self.seller_name,
      name: self.name.trim().to_string(),
      category: self.category,
      image_url: self.image_url,
      origin: self.origin,
      description: self.description,
      price: self.price,
      quantity: self.quantity,
      order_count: 0,
      created_at: Utc::now(),
    }
  }
}

/// Seller edit. `id`, `sellerEmail` and `orderCount` are not editable;
/// unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodPatch {
  pub seller_name: Option<String>,
  pub name: Option<String>,
  pub category: Option<String>,
  pub image_url: Option<String>,
  pub origin: Option<String>,
  pub description: Option<String>,
  pub price: Option<Decimal>,
  pub quantity: Option<i32>,
}

impl FoodPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(name) = &self.name {
      if name.trim().is_empty() {
        return Err(MarketError::Validation("name cannot be empty".to_string()));
      }
    }
    if let Some(price) = self.price {
      validate_price(price)?;
    }
    if let Some(quantity) = self.quantity {
      validate_quantity(quantity)?;
    }
    Ok(())
  }

  pub fn is_empty(&self) -> bool {
    *self == FoodPatch::default()
  }

  pub fn apply_to(&self, item: &mut FoodItem) {
    if let Some(v) = &self.seller_name {
      item.seller_name = Some(v.clone());
    }
    if let Some(v) = &self.name {
      item.name = v.trim().to_string();
    }
    if let Some(v) = &self.category {
      item.category = Some(v.clone());
    }
    if let Some(v) = &self.image_url {
      item.image_url = Some(v.clone());
    }
    if let Some(v) = &self.origin {
      item.origin = Some(v.clone());
    }
    if let Some(v) = &self.description {
      item.description = Some(v.clone());
    }
    if let Some(v) = self.price {
      item.price = v;
    }
    if let Some(v) = self.quantity {
      item.quantity = v;
    }
  }
}

/// Prices carry at most cents.
pub const PRICE_SCALE: u32 = 2;
/// Largest unit price the catalog stores (`NUMERIC(12, 2)`).
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, PRICE_SCALE);

fn validate_price(price: Decimal) -> Result<()> {
  if price.is_sign_negative() && !price.is_zero() {
    return Err(MarketError::Validation("price must not be negative".to_string()));
  }
  if price.normalize().scale() > PRICE_SCALE {
    return Err(MarketError::Validation(format!(
      "price must have at most {} decimal places",
      PRICE_SCALE
    )));
  }
  if price > MAX_UNIT_PRICE {
    return Err(MarketError::Validation(format!("price must not exceed {}", MAX_UNIT_PRICE)));
  }
  Ok(())
}

fn validate_quantity(quantity: i32) -> Result<()> {
  if quantity < 0 {
    return Err(MarketError::Validation("quantity must not be negative".to_string()));
  }
  Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<()> {
  let trimmed = email.trim();
  if trimmed.is_empty() || !trimmed.contains('@') {
    return Err(MarketError::Validation(format!("'{}' is not a valid email", email)));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal::Decimal;

  fn sample_new() -> NewFoodItem {
    NewFoodItem {
      name: "Pad Thai".to_string(),
      price: Decimal::new(1250, 2),
      quantity: 4,
      ..Default::default()
    }
  }

  #[test]
  fn new_item_starts_with_zero_order_count() {
    let item = sample_new().into_item("s@x.com".to_string());
    assert_eq!(item.order_count, 0);
    assert_eq!(item.seller_email, "s@x.com");
  }

  #[test]
  fn rejects_negative_price_and_quantity() {
    let mut bad = sample_new();
    bad.price = Decimal::new(-1, 0);
    assert!(matches!(bad.validate(), Err(MarketError::Validation(_))));

    let mut bad = sample_new();
    bad.quantity = -3;
    assert!(matches!(bad.validate(), Err(MarketError::Validation(_))));
  }

  #[test]
  fn price_is_bounded_to_cents_and_column_range() {
    assert_eq!(MAX_UNIT_PRICE, Decimal::new(999_999_999_999, 2));

    let mut item = sample_new();
    item.price = MAX_UNIT_PRICE;
    assert!(item.validate().is_ok());
    item.price = Decimal::new(150, 2);
    assert!(item.validate().is_ok());
    item.price = Decimal::new(15000, 4);
    assert!(item.validate().is_ok(), "trailing zeros are not extra precision");

    for bad in [Decimal::new(1005, 3), MAX_UNIT_PRICE + Decimal::new(1, 2), Decimal::MAX / Decimal::from(2)] {
      item.price = bad;
      assert!(matches!(item.validate(), Err(MarketError::Validation(_))), "{} accepted", bad);
    }

    let patch = FoodPatch {
      price: Some(Decimal::new(1005, 3)),
      ..Default::default()
    };
    assert!(matches!(patch.validate(), Err(MarketError::Validation(_))));
  }

  #[test]
  fn patch_ignores_identity_fields() {
    let patch: FoodPatch =
      serde_json::from_str(r#"{"_id":"abc","sellerEmail":"evil@x.com","orderCount":99,"quantity":7}"#).unwrap();
    let mut item = sample_new().into_item("s@x.com".to_string());
    patch.apply_to(&mut item);
    assert_eq!(item.quantity, 7);
    assert_eq!(item.seller_email, "s@x.com");
    assert_eq!(item.order_count, 0);
  }
}
