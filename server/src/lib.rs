// server/src/lib.rs

//! HTTP surface of the food marketplace: configuration, the error to
//! response mapping, the PostgreSQL store and the actix-web routes.

pub mod config;
pub mod errors;
pub mod models;
pub mod state;
pub mod store;
pub mod web;

pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use state::AppState;
