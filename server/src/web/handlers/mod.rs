// server/src/web/handlers/mod.rs

pub mod auth_handlers;
pub mod food_handlers;
pub mod order_handlers;
pub mod user_handlers;
