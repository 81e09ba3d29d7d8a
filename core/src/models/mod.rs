// core/src/models/mod.rs

//! Records owned by the catalog, the order ledger and the user directory.

pub mod food;
pub mod order;
pub mod user;

pub use food::{FoodItem, FoodPatch, NewFoodItem, MAX_UNIT_PRICE};
pub use order::{order_total, NewOrder, Order, PlaceOrder, Placement, MAX_ORDER_TOTAL};
pub use user::{NewUser, User};
