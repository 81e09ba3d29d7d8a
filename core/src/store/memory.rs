// core/src/store/memory.rs

//! In-process store. All tables sit behind one `parking_lot::RwLock`; every
//! mutation happens inside a single critical section and no guard is ever
//! held across an `.await`, so the conditional decrement is linearizable.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{MarketError, Result};
use crate::models::{FoodItem, FoodPatch, NewOrder, NewUser, Order, User};
use crate::store::{FoodCatalog, MarketStore, OrderLedger, Page, ReservationTx, UserDirectory};

#[derive(Debug, Default)]
struct Tables {
  // Vec order is insertion order, which is the catalog's natural order.
  foods: Vec<FoodItem>,
  orders: Vec<Order>,
  users: Vec<User>,
}

impl Tables {
  fn food_mut(&mut self, id: Uuid) -> Result<&mut FoodItem> {
    self
      .foods
      .iter_mut()
      .find(|f| f.id == id)
      .ok_or_else(|| MarketError::not_found("food", id))
  }

  fn reserve(&mut self, id: Uuid, quantity: i32) -> Result<FoodItem> {
    self.check_stock(id, quantity, 0)?;
    let item = self.food_mut(id)?;
    item.quantity -= quantity;
    item.order_count = item.order_count.saturating_add(1);
    Ok(item.clone())
  }

  /// Checks that `quantity` more units can come out of `id` on top of
  /// `already_claimed`, without mutating anything.
  fn check_stock(&self, id: Uuid, quantity: i32, already_claimed: i32) -> Result<&FoodItem> {
    if quantity <= 0 {
      return Err(MarketError::Validation("quantity must be a positive number".to_string()));
    }
    let item = self
      .foods
      .iter()
      .find(|f| f.id == id)
      .ok_or_else(|| MarketError::not_found("food", id))?;
    let available = item.quantity - already_claimed;
    if available < quantity {
      return Err(MarketError::InsufficientStock {
        requested: quantity,
        available: available.max(0),
      });
    }
    Ok(item)
  }

  fn key_taken(&self, order: &Order) -> bool {
    match &order.idempotency_key {
      Some(key) => self
        .orders
        .iter()
        .any(|o| o.buyer_email == order.buyer_email && o.idempotency_key.as_ref() == Some(key)),
      None => false,
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl FoodCatalog for MemoryStore {
  async fn get_food(&self, id: Uuid) -> Result<Option<FoodItem>> {
    Ok(self.tables.read().foods.iter().find(|f| f.id == id).cloned())
  }

  async fn list_page(&self, page: Page) -> Result<Vec<FoodItem>> {
    let tables = self.tables.read();
    Ok(
      tables
        .foods
        .iter()
        .skip(page.offset() as usize)
        .take(page.size() as usize)
        .cloned()
        .collect(),
    )
  }

  async fn list_by_seller(&self, seller_email: &str) -> Result<Vec<FoodItem>> {
    let tables = self.tables.read();
    Ok(
      tables
        .foods
        .iter()
        .filter(|f| f.seller_email == seller_email)
        .cloned()
        .collect(),
    )
  }

  async fn list_top_ordered(&self, limit: usize) -> Result<Vec<FoodItem>> {
    let mut foods = self.tables.read().foods.clone();
    // Stable sort: ties stay in insertion order.
    foods.sort_by(|a, b| b.order_count.cmp(&a.order_count));
    foods.truncate(limit);
    Ok(foods)
  }

  async fn count_foods(&self) -> Result<u64> {
    Ok(self.tables.read().foods.len() as u64)
  }

  async fn insert_food(&self, item: FoodItem) -> Result<FoodItem> {
    let mut tables = self.tables.write();
    if tables.foods.iter().any(|f| f.id == item.id) {
      return Err(MarketError::Validation(format!("food {} already exists", item.id)));
    }
    tables.foods.push(item.clone());
    Ok(item)
  }

  async fn update_food(&self, id: Uuid, patch: &FoodPatch) -> Result<FoodItem> {
    patch.validate()?;
    let mut tables = self.tables.write();
    let item = tables.food_mut(id)?;
    patch.apply_to(item);
    Ok(item.clone())
  }

  async fn delete_food(&self, id: Uuid) -> Result<()> {
    let mut tables = self.tables.write();
    let before = tables.foods.len();
    tables.foods.retain(|f| f.id != id);
    if tables.foods.len() == before {
      return Err(MarketError::not_found("food", id));
    }
    Ok(())
  }

  async fn reserve(&self, id: Uuid, quantity: i32) -> Result<FoodItem> {
    self.tables.write().reserve(id, quantity)
  }
}

#[async_trait]
impl OrderLedger for MemoryStore {
  async fn insert_order(&self, order: NewOrder) -> Result<Order> {
    let order = order.into_order()?;
    let mut tables = self.tables.write();
    if tables.key_taken(&order) {
      return Err(MarketError::DuplicateIdempotencyKey);
    }
    tables.orders.push(order.clone());
    Ok(order)
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    Ok(self.tables.read().orders.iter().find(|o| o.id == id).cloned())
  }

  async fn list_by_buyer(&self, buyer_email: &str) -> Result<Vec<Order>> {
    let tables = self.tables.read();
    Ok(
      tables
        .orders
        .iter()
        .filter(|o| o.buyer_email == buyer_email)
        .cloned()
        .collect(),
    )
  }

  async fn find_by_idempotency_key(&self, buyer_email: &str, key: &str) -> Result<Option<Order>> {
    let tables = self.tables.read();
    Ok(
      tables
        .orders
        .iter()
        .find(|o| o.buyer_email == buyer_email && o.idempotency_key.as_deref() == Some(key))
        .cloned(),
    )
  }

  async fn delete_order(&self, id: Uuid) -> Result<()> {
    let mut tables = self.tables.write();
    let before = tables.orders.len();
    tables.orders.retain(|o| o.id != id);
    if tables.orders.len() == before {
      return Err(MarketError::not_found("order", id));
    }
    Ok(())
  }
}

#[async_trait]
impl UserDirectory for MemoryStore {
  async fn insert_user(&self, user: NewUser) -> Result<User> {
    let user = user.into_user();
    self.tables.write().users.push(user.clone());
    Ok(user)
  }
}

#[async_trait]
impl MarketStore for MemoryStore {
  async fn begin_reservation(&self) -> Result<Box<dyn ReservationTx>> {
    Ok(Box::new(MemoryReservation {
      tables: Arc::clone(&self.tables),
      claims: Vec::new(),
      staged: Vec::new(),
    }))
  }
}

/// Reservation against `MemoryStore`.
///
/// Nothing touches the shared tables before `commit`: `reserve` only checks
/// stock and stages a claim, `record_order` stages the order. `commit`
/// re-checks every claim and publishes decrements and orders under one
/// write lock. Other callers never see a half-applied reservation, and
/// dropping one uncommitted is a no-op.
pub struct MemoryReservation {
  tables: Arc<RwLock<Tables>>,
  claims: Vec<(Uuid, i32)>,
  staged: Vec<Order>,
}

impl MemoryReservation {
  fn claimed(&self, food_id: Uuid) -> i32 {
    self
      .claims
      .iter()
      .filter(|(id, _)| *id == food_id)
      .map(|(_, qty)| *qty)
      .sum()
  }
}

#[async_trait]
impl ReservationTx for MemoryReservation {
  /// Returns the item as it will look once this reservation commits.
  #[instrument(name = "MemoryReservation::reserve", skip(self), err(Display))]
  async fn reserve(&mut self, food_id: Uuid, quantity: i32) -> Result<FoodItem> {
    let already_claimed = self.claimed(food_id);
    let mut projected = self
      .tables
      .read()
      .check_stock(food_id, quantity, already_claimed)?
      .clone();
    let claims_on_item = self.claims.iter().filter(|(id, _)| *id == food_id).count() as i32;
    projected.quantity -= already_claimed + quantity;
    projected.order_count = projected.order_count.saturating_add(claims_on_item + 1);
    self.claims.push((food_id, quantity));
    Ok(projected)
  }

  async fn record_order(&mut self, order: NewOrder) -> Result<Order> {
    let order = order.into_order()?;
    let staged_clash = order.idempotency_key.is_some()
      && self
        .staged
        .iter()
        .any(|o| o.buyer_email == order.buyer_email && o.idempotency_key == order.idempotency_key);
    if staged_clash || self.tables.read().key_taken(&order) {
      return Err(MarketError::DuplicateIdempotencyKey);
    }
    self.staged.push(order.clone());
    Ok(order)
  }

  async fn commit(self: Box<Self>) -> Result<()> {
    let MemoryReservation { tables, claims, staged } = *self;
    let mut tables = tables.write();

    // Validate everything first so a refusal leaves the tables untouched.
    // A concurrent twin may have published the same key since staging.
    if staged.iter().any(|o| tables.key_taken(o)) {
      return Err(MarketError::DuplicateIdempotencyKey);
    }
    let mut checked: Vec<(Uuid, i32)> = Vec::new();
    for (food_id, quantity) in &claims {
      let earlier: i32 = checked.iter().filter(|(id, _)| id == food_id).map(|(_, q)| *q).sum();
      tables.check_stock(*food_id, *quantity, earlier)?;
      checked.push((*food_id, *quantity));
    }

    for (food_id, quantity) in &claims {
      tables.reserve(*food_id, *quantity)?;
    }
    tables.orders.extend(staged);
    debug!(claims = claims.len(), "Memory reservation committed.");
    Ok(())
  }
}
