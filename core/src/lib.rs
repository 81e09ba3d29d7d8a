// core/src/lib.rs

//! Foodlane: the marketplace core.
//!
//! Sellers list food items, buyers place orders against the listed stock,
//! and every mutating call is tied to a verified caller identity.
//!
//!  - `identity`: credential issuance and verification.
//!  - `access`: the per-request gate binding an identity to the data it may touch.
//!  - `store`: the catalog and ledger seams plus an in-process store.
//!  - `reservation`: order placement with an all-or-nothing stock reservation.
//!  - `workflow`: the small step engine `reservation` is built on.

pub mod access;
pub mod error;
pub mod identity;
pub mod models;
pub mod reservation;
pub mod store;
pub mod workflow;

pub use crate::access::{AccessGate, Scope};
pub use crate::error::{MarketError, Result, WorkflowError};
pub use crate::identity::{
  Identity, IdentityClaim, IdentityVerifier, IssuedCredential, TokenAuthority, DEFAULT_TOKEN_TTL_SECS,
};
pub use crate::models::{
  FoodItem, FoodPatch, NewFoodItem, NewOrder, NewUser, Order, PlaceOrder, Placement, User, MAX_ORDER_TOTAL,
  MAX_UNIT_PRICE,
};
pub use crate::reservation::ReservationCoordinator;
pub use crate::store::{
  FoodCatalog, MarketStore, MemoryStore, OrderLedger, Page, ReservationTx, UserDirectory, DEFAULT_PAGE_SIZE,
  MAX_PAGE_SIZE,
};
pub use crate::workflow::{ContextData, StepControl, Workflow, WorkflowResult};
