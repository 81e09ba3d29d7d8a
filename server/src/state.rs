// server/src/state.rs

use crate::config::AppConfig;
use crate::errors::Result;
use foodlane::{AccessGate, MarketStore, ReservationCoordinator, TokenAuthority, UserDirectory};
use std::sync::Arc;

/// Everything a handler needs, built once at startup and shared by clone.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn MarketStore>,
  pub users: Arc<dyn UserDirectory>,
  pub coordinator: Arc<ReservationCoordinator>,
  pub tokens: Arc<TokenAuthority>,
  pub gate: AccessGate,
  pub config: Arc<AppConfig>,
}

impl AppState {
  pub fn new<S>(config: Arc<AppConfig>, store: Arc<S>) -> Result<Self>
  where
    S: MarketStore + UserDirectory + 'static,
  {
    let tokens = Arc::new(TokenAuthority::new(&config.access_token_secret, config.token_ttl())?);
    let market: Arc<dyn MarketStore> = store.clone();
    Ok(Self {
      coordinator: Arc::new(ReservationCoordinator::new(Arc::clone(&market))),
      gate: AccessGate::new(tokens.clone()),
      users: store,
      store: market,
      tokens,
      config,
    })
  }
}
