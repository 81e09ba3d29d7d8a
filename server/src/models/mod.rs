// server/src/models/mod.rs

//! Row shapes of the PostgreSQL tables, converted into the domain records.

pub mod food;
pub mod order;
pub mod user;

pub use food::FoodRow;
pub use order::OrderRow;
pub use user::UserRow;
