// core/examples/place_order.rs

use chrono::Duration;
use foodlane::{
  AccessGate, FoodCatalog, IdentityClaim, MarketError, MemoryStore, NewFoodItem, OrderLedger, PlaceOrder,
  ReservationCoordinator, Scope, TokenAuthority,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), MarketError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Place Order Walkthrough ---");

  // 1. A store and a seller's listing.
  let store = Arc::new(MemoryStore::new());
  let listing = NewFoodItem {
    name: "Khao Soi".to_string(),
    price: Decimal::new(1150, 2),
    quantity: 5,
    ..Default::default()
  };
  listing.validate()?;
  let item = store.insert_food(listing.into_item("s@x.com".to_string())).await?;
  info!(food_id = %item.id, quantity = item.quantity, "Listed.");

  // 2. The buyer logs in and presents the credential.
  let tokens = Arc::new(TokenAuthority::new(
    "walkthrough-secret-not-for-production-use",
    Duration::hours(1),
  )?);
  let gate = AccessGate::new(tokens.clone());
  let credential = tokens.issue(IdentityClaim {
    email: "b@x.com".to_string(),
    name: Some("Bo".to_string()),
  })?;

  // 3. Place an order as the verified buyer.
  let coordinator = ReservationCoordinator::new(store.clone());
  let placed = gate
    .guard(Some(&credential.token), Scope::Authenticated, |buyer| {
      coordinator.place_order(PlaceOrder::new(buyer.email, item.id, 3))
    })
    .await?;
  info!(order_id = %placed.order.id, total = %placed.order.total_price, "Order placed.");

  // 4. The same request again runs out of stock.
  match coordinator.place_order(PlaceOrder::new("b@x.com", item.id, 3)).await {
    Err(MarketError::InsufficientStock { requested, available }) => {
      warn!(requested, available, "Second order rejected.")
    }
    other => info!(?other, "Unexpected outcome."),
  }

  let after = store.get_food(item.id).await?;
  let orders = store.list_by_buyer("b@x.com").await?;
  info!(?after, orders = orders.len(), "Final state.");

  Ok(())
}
