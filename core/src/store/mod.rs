// core/src/store/mod.rs

//! Storage seam. Components receive an explicit store handle built once at
//! startup; nothing reaches for a process-global client.
//!
//! The only mutation with a business invariant is the reservation: a
//! conditional decrement that re-validates stock at the point of mutation.
//! `ReservationTx` couples that decrement with the order insert so that both
//! happen or neither does. Dropping an uncommitted transaction rolls back.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{FoodItem, FoodPatch, NewOrder, NewUser, Order, User};

pub use memory::MemoryStore;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// One-based page request. Construction clamps to sane bounds so a store
/// never sees a zero page or size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  number: u32,
  size: u32,
}

impl Page {
  pub fn new(number: u32, size: u32) -> Self {
    Self {
      number: number.max(1),
      size: size.clamp(1, MAX_PAGE_SIZE),
    }
  }

  /// Lenient parse of raw query values: missing, zero, negative or
  /// unparseable inputs fall back to page 1 / `DEFAULT_PAGE_SIZE`.
  pub fn from_query(page: Option<&str>, size: Option<&str>) -> Self {
    let parse = |raw: Option<&str>, default: u32| {
      raw
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map(|v| v.min(u32::MAX as i64) as u32)
        .unwrap_or(default)
    };
    Self::new(parse(page, 1), parse(size, DEFAULT_PAGE_SIZE))
  }

  pub fn number(&self) -> u32 {
    self.number
  }

  pub fn size(&self) -> u32 {
    self.size
  }

  pub fn offset(&self) -> u64 {
    (self.number as u64 - 1) * self.size as u64
  }
}

impl Default for Page {
  fn default() -> Self {
    Self::new(1, DEFAULT_PAGE_SIZE)
  }
}

#[async_trait]
pub trait FoodCatalog: Send + Sync {
  async fn get_food(&self, id: Uuid) -> Result<Option<FoodItem>>;

  /// Natural storage order (insertion order); beyond the last page is empty.
  async fn list_page(&self, page: Page) -> Result<Vec<FoodItem>>;

  async fn list_by_seller(&self, seller_email: &str) -> Result<Vec<FoodItem>>;

  /// Highest `order_count` first; ties keep a stable order across calls.
  async fn list_top_ordered(&self, limit: usize) -> Result<Vec<FoodItem>>;

  async fn count_foods(&self) -> Result<u64>;

  async fn insert_food(&self, item: FoodItem) -> Result<FoodItem>;

  async fn update_food(&self, id: Uuid, patch: &FoodPatch) -> Result<FoodItem>;

  async fn delete_food(&self, id: Uuid) -> Result<()>;

  /// Standalone conditional decrement, committed on its own.
  ///
  /// Fails with `InsufficientStock` (no effect) when `quantity` exceeds the
  /// stock at the moment of mutation, `NotFound` when the item is gone.
  async fn reserve(&self, id: Uuid, quantity: i32) -> Result<FoodItem>;
}

#[async_trait]
pub trait OrderLedger: Send + Sync {
  async fn insert_order(&self, order: NewOrder) -> Result<Order>;

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>>;

  async fn list_by_buyer(&self, buyer_email: &str) -> Result<Vec<Order>>;

  async fn find_by_idempotency_key(&self, buyer_email: &str, key: &str) -> Result<Option<Order>>;

  async fn delete_order(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
  async fn insert_user(&self, user: NewUser) -> Result<User>;
}

/// A store that can run a reservation and its order insert as one unit.
#[async_trait]
pub trait MarketStore: FoodCatalog + OrderLedger {
  async fn begin_reservation(&self) -> Result<Box<dyn ReservationTx>>;
}

/// An open all-or-nothing reservation. Every effect is discarded unless
/// `commit` succeeds.
#[async_trait]
pub trait ReservationTx: Send {
  /// Conditionally decrements stock and bumps the order count; returns the
  /// post-image of the item.
  async fn reserve(&mut self, food_id: Uuid, quantity: i32) -> Result<FoodItem>;

  /// Persists the order; it only becomes visible on commit.
  async fn record_order(&mut self, order: NewOrder) -> Result<Order>;

  async fn commit(self: Box<Self>) -> Result<()>;
}
