// core/src/reservation.rs

//! Order placement with inventory reservation.
//!
//! `ReservationCoordinator::place_order` runs the `place_order` workflow:
//!
//! 1. `validate_intent`
//! 2. `replay_idempotent_order` (stops the run when the key was seen before)
//! 3. `load_food_item`
//! 4. `reject_self_purchase`
//! 5. `check_available_stock`
//! 6. `reserve_stock_and_record_order`
//!
//! Step 5 also refuses an order whose total would not fit the ledger. Its
//! stock test is only a fast rejection against a possibly stale read. The stock
//! condition that actually matters is re-checked by the store inside step 6,
//! where the decrement and the order insert share one transaction.

use anyhow::anyhow;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{MarketError, Result};
use crate::models::{order_total, FoodItem, NewOrder, PlaceOrder, Placement};
use crate::store::{FoodCatalog, MarketStore, OrderLedger};
use crate::workflow::{ContextData, StepControl, Workflow};

pub const PLACE_ORDER_STEPS: &[(&str, bool)] = &[
  ("validate_intent", false),
  ("replay_idempotent_order", true),
  ("load_food_item", false),
  ("reject_self_purchase", false),
  ("check_available_stock", false),
  ("reserve_stock_and_record_order", false),
];

/// Per-call state threaded through the steps.
#[derive(Debug, Clone)]
pub struct PlaceOrderCtx {
  pub intent: PlaceOrder,
  pub food: Option<FoodItem>,
  pub placement: Option<Placement>,
}

impl PlaceOrderCtx {
  pub fn new(intent: PlaceOrder) -> Self {
    Self {
      intent,
      food: None,
      placement: None,
    }
  }
}

pub struct ReservationCoordinator {
  store: Arc<dyn MarketStore>,
  workflow: Workflow<PlaceOrderCtx, MarketError>,
}

impl std::fmt::Debug for ReservationCoordinator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ReservationCoordinator")
      .field("steps", &self.workflow.step_names())
      .finish()
  }
}

impl ReservationCoordinator {
  pub fn new(store: Arc<dyn MarketStore>) -> Self {
    let workflow = build_place_order_workflow(Arc::clone(&store));
    Self { store, workflow }
  }

  pub fn store(&self) -> &Arc<dyn MarketStore> {
    &self.store
  }

  #[instrument(
    name = "ReservationCoordinator::place_order",
    skip(self, intent),
    fields(buyer = %intent.buyer_email, food_id = %intent.food_id, quantity = intent.quantity),
    err(Display)
  )]
  pub async fn place_order(&self, intent: PlaceOrder) -> Result<Placement> {
    let ctx = ContextData::new(PlaceOrderCtx::new(intent));
    let outcome = self.workflow.run(ctx.clone()).await?;
    debug!(?outcome, "place_order workflow finished.");

    let placement = ctx.read().placement.clone();
    placement.ok_or_else(|| MarketError::storage(anyhow!("place_order finished without producing an order")))
  }
}

fn build_place_order_workflow(store: Arc<dyn MarketStore>) -> Workflow<PlaceOrderCtx, MarketError> {
  let mut wf = Workflow::<PlaceOrderCtx, MarketError>::new("place_order", PLACE_ORDER_STEPS);

  wf.on_step("validate_intent", |ctx: ContextData<PlaceOrderCtx>| async move {
    ctx.read().intent.validate()?;
    Ok::<_, MarketError>(StepControl::Continue)
  });

  let replay_store = Arc::clone(&store);
  wf.on_step("replay_idempotent_order", move |ctx: ContextData<PlaceOrderCtx>| {
    let store = Arc::clone(&replay_store);
    async move {
      let (buyer, key) = {
        let guard = ctx.read();
        (guard.intent.buyer_email.clone(), guard.intent.idempotency_key.clone())
      };
      let Some(key) = key else {
        return Ok::<_, MarketError>(StepControl::Continue);
      };
      match store.find_by_idempotency_key(&buyer, &key).await? {
        Some(order) => {
          info!(order_id = %order.id, "Idempotency key seen before, replaying existing order.");
          ctx.write().placement = Some(Placement { order, replayed: true });
          Ok(StepControl::Stop)
        }
        None => Ok(StepControl::Continue),
      }
    }
  });

  let load_store = Arc::clone(&store);
  wf.on_step("load_food_item", move |ctx: ContextData<PlaceOrderCtx>| {
    let store = Arc::clone(&load_store);
    async move {
      let food_id = ctx.read().intent.food_id;
      let food = store
        .get_food(food_id)
        .await?
        .ok_or_else(|| MarketError::not_found("food", food_id))?;
      ctx.write().food = Some(food);
      Ok::<_, MarketError>(StepControl::Continue)
    }
  });

  wf.on_step("reject_self_purchase", |ctx: ContextData<PlaceOrderCtx>| async move {
    let guard = ctx.read();
    let seller = guard.food.as_ref().map(|f| f.seller_email.trim());
    if seller == Some(guard.intent.buyer_email.trim()) {
      warn!(buyer = %guard.intent.buyer_email, "Self-purchase rejected.");
      return Err(MarketError::SelfPurchase);
    }
    Ok(StepControl::Continue)
  });

  wf.on_step("check_available_stock", |ctx: ContextData<PlaceOrderCtx>| async move {
    let guard = ctx.read();
    let available = guard.food.as_ref().map(|f| f.quantity).unwrap_or(0);
    if guard.intent.quantity > available {
      return Err(MarketError::InsufficientStock {
        requested: guard.intent.quantity,
        available,
      });
    }
    if let Some(food) = guard.food.as_ref() {
      order_total(food.price, guard.intent.quantity)?;
    }
    Ok(StepControl::Continue)
  });

  let reserve_store = Arc::clone(&store);
  wf.on_step("reserve_stock_and_record_order", move |ctx: ContextData<PlaceOrderCtx>| {
    let store = Arc::clone(&reserve_store);
    async move {
      let intent = ctx.read().intent.clone();
      match reserve_and_record(store.as_ref(), &intent).await {
        Ok(placement) => {
          info!(order_id = %placement.order.id, "Order placed.");
          ctx.write().placement = Some(placement);
          Ok(StepControl::Continue)
        }
        Err(MarketError::DuplicateIdempotencyKey) => {
          // A concurrent twin won; our transaction has already rolled back.
          let key = intent.idempotency_key.as_deref().unwrap_or_default();
          let order = store
            .find_by_idempotency_key(&intent.buyer_email, key)
            .await?
            .ok_or(MarketError::DuplicateIdempotencyKey)?;
          info!(order_id = %order.id, "Concurrent duplicate collapsed onto existing order.");
          ctx.write().placement = Some(Placement { order, replayed: true });
          Ok(StepControl::Continue)
        }
        Err(e) => Err(e),
      }
    }
  });

  wf
}

/// Decrement, insert, commit. Any early return drops the transaction,
/// which discards the decrement.
async fn reserve_and_record(store: &dyn MarketStore, intent: &PlaceOrder) -> Result<Placement> {
  let mut tx = store.begin_reservation().await?;
  let reserved = tx.reserve(intent.food_id, intent.quantity).await?;
  let order = tx
    .record_order(NewOrder {
      buyer_email: intent.buyer_email.trim().to_string(),
      buyer_name: intent.buyer_name.clone(),
      food_id: reserved.id,
      food_name: reserved.name.clone(),
      quantity: intent.quantity,
      unit_price: reserved.price,
      idempotency_key: intent.idempotency_key.clone(),
    })
    .await?;
  tx.commit().await?;
  debug!(remaining = reserved.quantity, order_count = reserved.order_count, "Stock reserved.");
  Ok(Placement { order, replayed: false })
}
