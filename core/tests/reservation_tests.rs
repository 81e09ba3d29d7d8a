// tests/reservation_tests.rs
mod common;

use common::*;
use foodlane::{
  FoodCatalog, FoodPatch, MarketError, MarketStore, MemoryStore, OrderLedger, PlaceOrder, ReservationCoordinator,
  ReservationTx,
};
use rust_decimal::Decimal;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn test_end_to_end_second_order_hits_insufficient_stock() {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let f1 = seed(&store, "F1", 5).await;
  let coordinator = ReservationCoordinator::new(store.clone());

  let first = coordinator.place_order(PlaceOrder::new(BUYER, f1.id, 3)).await.unwrap();
  assert_eq!(first.order.buyer_email, BUYER);
  assert_eq!(first.order.food_id, f1.id);
  assert_eq!(first.order.quantity, 3);

  let after_first = store.get_food(f1.id).await.unwrap().unwrap();
  assert_eq!((after_first.quantity, after_first.order_count), (2, 1));

  let second = coordinator.place_order(PlaceOrder::new(BUYER, f1.id, 3)).await;
  assert!(matches!(
    second,
    Err(MarketError::InsufficientStock { requested: 3, available: 2 })
  ));

  let after_second = store.get_food(f1.id).await.unwrap().unwrap();
  assert_eq!((after_second.quantity, after_second.order_count), (2, 1));
  assert_eq!(store.list_by_buyer(BUYER).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_self_purchase_changes_nothing() {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let item = seed(&store, "Curry", 4).await;
  let coordinator = ReservationCoordinator::new(store.clone());

  let result = coordinator.place_order(PlaceOrder::new(SELLER, item.id, 1)).await;
  assert!(matches!(result, Err(MarketError::SelfPurchase)));

  let unchanged = store.get_food(item.id).await.unwrap().unwrap();
  assert_eq!((unchanged.quantity, unchanged.order_count), (4, 0));
  assert!(store.list_by_buyer(SELLER).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_food_is_not_found() {
  let store = Arc::new(MemoryStore::new());
  let coordinator = ReservationCoordinator::new(store);
  let result = coordinator.place_order(PlaceOrder::new(BUYER, Uuid::new_v4(), 1)).await;
  assert!(matches!(result, Err(MarketError::NotFound { entity: "food", .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_orders_never_oversell() {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let food_id = seed(&store, "Bao", 10).await.id;
  let coordinator = Arc::new(ReservationCoordinator::new(store.clone()));

  // 20 buyers race for 1..=3 units each against a stock of 10.
  let mut tasks = Vec::new();
  for i in 0..20 {
    let coordinator = Arc::clone(&coordinator);
    let quantity = (i % 3) + 1;
    tasks.push(tokio::spawn(async move {
      let buyer = format!("buyer{}@x.com", i);
      (quantity, coordinator.place_order(PlaceOrder::new(buyer, food_id, quantity)).await)
    }));
  }

  let mut accepted = 0;
  let mut accepted_orders = 0;
  for task in tasks {
    let (quantity, result) = task.await.unwrap();
    match result {
      Ok(_) => {
        accepted += quantity;
        accepted_orders += 1;
      }
      Err(MarketError::InsufficientStock { .. }) => {}
      Err(other) => panic!("unexpected error: {other}"),
    }
  }

  let final_item = store.get_food(food_id).await.unwrap().unwrap();
  assert!(accepted <= 10);
  assert!(final_item.quantity >= 0);
  assert_eq!(final_item.quantity, 10 - accepted);
  assert_eq!(final_item.order_count, accepted_orders);
}

#[tokio::test]
async fn test_failed_order_insert_rolls_back_stock() {
  setup_tracing();
  let store = Arc::new(FailingOrderStore::default());
  let item = store.inner.insert_food(food("Laksa", SELLER, 5)).await.unwrap();
  let coordinator = ReservationCoordinator::new(store.clone());

  let result = coordinator.place_order(PlaceOrder::new(BUYER, item.id, 2)).await;
  assert!(matches!(result, Err(MarketError::Storage { .. })));
  assert_eq!(store.failed_inserts.load(Ordering::SeqCst), 1);

  let restored = store.inner.get_food(item.id).await.unwrap().unwrap();
  assert_eq!((restored.quantity, restored.order_count), (5, 0));
  assert!(store.inner.list_by_buyer(BUYER).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_placement_leaves_no_partial_decrement() {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let item = seed(&store, "Pho", 3).await;

  {
    let mut tx = store.begin_reservation().await.unwrap();
    let projected = tx.reserve(item.id, 2).await.unwrap();
    assert_eq!(projected.quantity, 1);
    // Nothing is visible to other callers before commit.
    let visible = store.get_food(item.id).await.unwrap().unwrap();
    assert_eq!((visible.quantity, visible.order_count), (3, 0));
    // Dropped without commit, as when the request future is abandoned.
  }

  let restored = store.get_food(item.id).await.unwrap().unwrap();
  assert_eq!((restored.quantity, restored.order_count), (3, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicates_collapse_to_one_order() {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let food_id = seed(&store, "Tacos", 10).await.id;
  let coordinator = Arc::new(ReservationCoordinator::new(store.clone()));

  let mut tasks = Vec::new();
  for _ in 0..5 {
    let coordinator = Arc::clone(&coordinator);
    tasks.push(tokio::spawn(async move {
      coordinator
        .place_order(PlaceOrder::new(BUYER, food_id, 2).with_idempotency_key("checkout-42"))
        .await
    }));
  }

  let mut ids = Vec::new();
  for task in tasks {
    ids.push(task.await.unwrap().unwrap().order.id);
  }
  ids.dedup();
  assert_eq!(ids.len(), 1);

  assert_eq!(store.list_by_buyer(BUYER).await.unwrap().len(), 1);
  let after = store.get_food(food_id).await.unwrap().unwrap();
  assert_eq!((after.quantity, after.order_count), (8, 1));
}

#[tokio::test]
async fn test_open_reservation_does_not_block_competing_buyers() {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let item = seed(&store, "Arepa", 3).await;
  let coordinator = ReservationCoordinator::new(store.clone());

  let mut open_tx = store.begin_reservation().await.unwrap();
  open_tx.reserve(item.id, 3).await.unwrap();

  let competing = coordinator.place_order(PlaceOrder::new("c@x.com", item.id, 1)).await;
  assert!(competing.is_ok(), "competing order refused: {:?}", competing.err());

  // The open claim no longer fits; commit re-checks and refuses it whole.
  let result = open_tx.commit().await;
  assert!(matches!(
    result,
    Err(MarketError::InsufficientStock { requested: 3, available: 2 })
  ));
  let after = store.get_food(item.id).await.unwrap().unwrap();
  assert_eq!((after.quantity, after.order_count), (2, 1));
}

#[tokio::test]
async fn test_discarded_reservation_keeps_seller_edits() {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let item = seed(&store, "Empanada", 3).await;

  {
    let mut tx = store.begin_reservation().await.unwrap();
    tx.reserve(item.id, 3).await.unwrap();
    let sold_out = FoodPatch {
      quantity: Some(0),
      ..Default::default()
    };
    store.update_food(item.id, &sold_out).await.unwrap();
  }

  let after = store.get_food(item.id).await.unwrap().unwrap();
  assert_eq!((after.quantity, after.order_count), (0, 0));
}

#[tokio::test]
async fn test_commit_after_seller_lowers_stock_is_refused() {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let item = seed(&store, "Poutine", 4).await;

  let mut tx = store.begin_reservation().await.unwrap();
  tx.reserve(item.id, 3).await.unwrap();
  let lowered = FoodPatch {
    quantity: Some(1),
    ..Default::default()
  };
  store.update_food(item.id, &lowered).await.unwrap();

  assert!(matches!(tx.commit().await, Err(MarketError::InsufficientStock { .. })));
  let after = store.get_food(item.id).await.unwrap().unwrap();
  assert_eq!((after.quantity, after.order_count), (1, 0));
  assert!(store.list_by_buyer(BUYER).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_oversized_order_total_is_refused_without_panicking() {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let mut listing = food("Caviar", SELLER, 10);
  // Inserted directly, bypassing NewFoodItem validation.
  listing.price = Decimal::MAX / Decimal::from(2);
  let item = store.insert_food(listing).await.unwrap();
  let coordinator = Arc::new(ReservationCoordinator::new(store.clone()));

  let food_id = item.id;
  let handle = tokio::spawn(async move { coordinator.place_order(PlaceOrder::new(BUYER, food_id, 3)).await });
  let result = handle.await.expect("place_order must not panic");
  assert!(matches!(result, Err(MarketError::Validation(_))));

  let unchanged = store.get_food(item.id).await.unwrap().unwrap();
  assert_eq!((unchanged.quantity, unchanged.order_count), (10, 0));
}

#[tokio::test]
async fn test_recording_an_oversized_total_rolls_the_claim_back() {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let mut listing = food("Truffle", SELLER, 10);
  listing.price = Decimal::MAX / Decimal::from(2);
  let item = store.insert_food(listing).await.unwrap();

  let mut tx = store.begin_reservation().await.unwrap();
  let reserved = tx.reserve(item.id, 3).await.unwrap();
  let recorded = tx
    .record_order(foodlane::NewOrder {
      buyer_email: BUYER.to_string(),
      buyer_name: None,
      food_id: item.id,
      food_name: reserved.name.clone(),
      quantity: 3,
      unit_price: reserved.price,
      idempotency_key: None,
    })
    .await;
  assert!(matches!(recorded, Err(MarketError::Validation(_))));
  drop(tx);

  assert_eq!(store.get_food(item.id).await.unwrap().unwrap().quantity, 10);
}
