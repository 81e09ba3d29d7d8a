// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use foodlane::{
  ContextData, FoodCatalog, FoodItem, FoodPatch, MarketError, MarketStore, MemoryStore, NewFoodItem, NewOrder, Order,
  OrderLedger, Page, ReservationTx, Result, StepControl,
};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

pub const SELLER: &str = "s@x.com";
pub const BUYER: &str = "b@x.com";

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Fixtures ---
pub fn food(name: &str, seller: &str, quantity: i32) -> FoodItem {
  NewFoodItem {
    name: name.to_string(),
    price: Decimal::new(1200, 2),
    quantity,
    ..Default::default()
  }
  .into_item(seller.to_string())
}

pub async fn seed(store: &MemoryStore, name: &str, quantity: i32) -> FoodItem {
  store.insert_food(food(name, SELLER, quantity)).await.unwrap()
}

// --- Workflow test context ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

pub static HANDLER_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  HANDLER_EXEC_COUNTER.store(0, Ordering::SeqCst);
}

pub type BoxedStep = Pin<Box<dyn Future<Output = Result<StepControl>> + Send>>;

pub fn simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> impl Fn(ContextData<TestContext>) -> BoxedStep + Send + Sync + 'static {
  move |ctx: ContextData<TestContext>| -> BoxedStep {
    Box::pin(async move {
      HANDLER_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      tracing::debug!(target: "test_handlers", step = step_name, counter = guard.counter, "executed");
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(StepControl::Stop);
      }
      Ok(StepControl::Continue)
    })
  }
}

pub fn failing_handler(step_name: &'static str) -> impl Fn(ContextData<TestContext>) -> BoxedStep + Send + Sync + 'static {
  move |ctx: ContextData<TestContext>| -> BoxedStep {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(MarketError::Validation(format!("{} failed", step_name)))
    })
  }
}

// --- Fault injection ---

/// Delegates everything to a `MemoryStore`, except that orders recorded
/// inside a reservation fail with a storage fault after the decrement.
#[derive(Clone, Default)]
pub struct FailingOrderStore {
  pub inner: MemoryStore,
  pub failed_inserts: Arc<AtomicUsize>,
}

struct FailingReservation {
  inner: Box<dyn ReservationTx>,
  failed_inserts: Arc<AtomicUsize>,
}

#[async_trait]
impl ReservationTx for FailingReservation {
  async fn reserve(&mut self, food_id: Uuid, quantity: i32) -> Result<FoodItem> {
    self.inner.reserve(food_id, quantity).await
  }

  async fn record_order(&mut self, _order: NewOrder) -> Result<Order> {
    self.failed_inserts.fetch_add(1, Ordering::SeqCst);
    Err(MarketError::storage(anyhow::anyhow!("injected order insert failure")))
  }

  async fn commit(self: Box<Self>) -> Result<()> {
    self.inner.commit().await
  }
}

#[async_trait]
impl FoodCatalog for FailingOrderStore {
  async fn get_food(&self, id: Uuid) -> Result<Option<FoodItem>> {
    self.inner.get_food(id).await
  }
  async fn list_page(&self, page: Page) -> Result<Vec<FoodItem>> {
    self.inner.list_page(page).await
  }
  async fn list_by_seller(&self, seller_email: &str) -> Result<Vec<FoodItem>> {
    self.inner.list_by_seller(seller_email).await
  }
  async fn list_top_ordered(&self, limit: usize) -> Result<Vec<FoodItem>> {
    self.inner.list_top_ordered(limit).await
  }
  async fn count_foods(&self) -> Result<u64> {
    self.inner.count_foods().await
  }
  async fn insert_food(&self, item: FoodItem) -> Result<FoodItem> {
    self.inner.insert_food(item).await
  }
  async fn update_food(&self, id: Uuid, patch: &FoodPatch) -> Result<FoodItem> {
    self.inner.update_food(id, patch).await
  }
  async fn delete_food(&self, id: Uuid) -> Result<()> {
    self.inner.delete_food(id).await
  }
  async fn reserve(&self, id: Uuid, quantity: i32) -> Result<FoodItem> {
    FoodCatalog::reserve(&self.inner, id, quantity).await
  }
}

#[async_trait]
impl OrderLedger for FailingOrderStore {
  async fn insert_order(&self, order: NewOrder) -> Result<Order> {
    self.inner.insert_order(order).await
  }
  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    self.inner.get_order(id).await
  }
  async fn list_by_buyer(&self, buyer_email: &str) -> Result<Vec<Order>> {
    self.inner.list_by_buyer(buyer_email).await
  }
  async fn find_by_idempotency_key(&self, buyer_email: &str, key: &str) -> Result<Option<Order>> {
    self.inner.find_by_idempotency_key(buyer_email, key).await
  }
  async fn delete_order(&self, id: Uuid) -> Result<()> {
    self.inner.delete_order(id).await
  }
}

#[async_trait]
impl MarketStore for FailingOrderStore {
  async fn begin_reservation(&self) -> Result<Box<dyn ReservationTx>> {
    Ok(Box::new(FailingReservation {
      inner: self.inner.begin_reservation().await?,
      failed_inserts: Arc::clone(&self.failed_inserts),
    }))
  }
}
