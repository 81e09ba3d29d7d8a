// server/src/store/postgres.rs

//! PostgreSQL implementation of the store seam.
//!
//! The reservation is one conditional `UPDATE ... WHERE quantity >= $1` so
//! the stock check and the decrement are a single statement. It runs inside
//! a transaction together with the order insert; `sqlx` rolls the
//! transaction back when it is dropped without `commit`.

use async_trait::async_trait;
use foodlane::{
  FoodCatalog, FoodItem, FoodPatch, MarketError, MarketStore, NewOrder, NewUser, Order, OrderLedger, Page,
  ReservationTx, Result, User, UserDirectory,
};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::models::{FoodRow, OrderRow, UserRow};

const UNIQUE_VIOLATION: &str = "23505";

const SELECT_FOOD: &str = "SELECT id, seller_email, seller_name, name, category, image_url, origin, description, \
   price, quantity, order_count, created_at FROM foods";

const SELECT_ORDER: &str = "SELECT id, buyer_email, buyer_name, food_id, food_name, quantity, unit_price, \
   total_price, idempotency_key, created_at FROM orders";

const RESERVE_SQL: &str = "UPDATE foods SET quantity = quantity - $1, order_count = order_count + 1 \
   WHERE id = $2 AND quantity >= $1 \
   RETURNING id, seller_email, seller_name, name, category, image_url, origin, description, \
   price, quantity, order_count, created_at";

const INSERT_ORDER_SQL: &str = "INSERT INTO orders \
   (id, buyer_email, buyer_name, food_id, food_name, quantity, unit_price, total_price, idempotency_key, created_at) \
   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
   RETURNING id, buyer_email, buyer_name, food_id, food_name, quantity, unit_price, total_price, \
   idempotency_key, created_at";

fn storage(err: sqlx::Error) -> MarketError {
  MarketError::storage(err)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
  matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

/// Conditional decrement on `conn`. On a miss, tells a vanished item apart
/// from one with too little stock.
async fn reserve_on(conn: &mut PgConnection, id: Uuid, quantity: i32) -> Result<FoodItem> {
  if quantity <= 0 {
    return Err(MarketError::Validation("quantity must be a positive number".to_string()));
  }

  let reserved = sqlx::query_as::<_, FoodRow>(RESERVE_SQL)
    .bind(quantity)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(storage)?;

  if let Some(row) = reserved {
    return Ok(row.into());
  }

  let available: Option<i32> = sqlx::query_scalar("SELECT quantity FROM foods WHERE id = $1")
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(storage)?;

  match available {
    Some(available) => Err(MarketError::InsufficientStock {
      requested: quantity,
      available,
    }),
    None => Err(MarketError::not_found("food", id)),
  }
}

async fn insert_order_on(conn: &mut PgConnection, order: NewOrder) -> Result<Order> {
  let order = order.into_order()?;
  let row = sqlx::query_as::<_, OrderRow>(INSERT_ORDER_SQL)
    .bind(order.id)
    .bind(&order.buyer_email)
    .bind(&order.buyer_name)
    .bind(order.food_id)
    .bind(&order.food_name)
    .bind(order.quantity)
    .bind(order.unit_price)
    .bind(order.total_price)
    .bind(&order.idempotency_key)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
      if is_unique_violation(&e) {
        MarketError::DuplicateIdempotencyKey
      } else {
        storage(e)
      }
    })?;
  Ok(row.into())
}

#[async_trait]
impl FoodCatalog for PgStore {
  async fn get_food(&self, id: Uuid) -> Result<Option<FoodItem>> {
    let sql = format!("{} WHERE id = $1", SELECT_FOOD);
    let row = sqlx::query_as::<_, FoodRow>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(storage)?;
    Ok(row.map(Into::into))
  }

  async fn list_page(&self, page: Page) -> Result<Vec<FoodItem>> {
    let sql = format!("{} ORDER BY seq LIMIT $1 OFFSET $2", SELECT_FOOD);
    let rows = sqlx::query_as::<_, FoodRow>(&sql)
      .bind(page.size() as i64)
      .bind(page.offset() as i64)
      .fetch_all(&self.pool)
      .await
      .map_err(storage)?;
    Ok(rows.into_iter().map(Into::into).collect())
  }

  async fn list_by_seller(&self, seller_email: &str) -> Result<Vec<FoodItem>> {
    let sql = format!("{} WHERE seller_email = $1 ORDER BY seq", SELECT_FOOD);
    let rows = sqlx::query_as::<_, FoodRow>(&sql)
      .bind(seller_email)
      .fetch_all(&self.pool)
      .await
      .map_err(storage)?;
    Ok(rows.into_iter().map(Into::into).collect())
  }

  async fn list_top_ordered(&self, limit: usize) -> Result<Vec<FoodItem>> {
    let sql = format!("{} ORDER BY order_count DESC, seq LIMIT $1", SELECT_FOOD);
    let rows = sqlx::query_as::<_, FoodRow>(&sql)
      .bind(limit as i64)
      .fetch_all(&self.pool)
      .await
      .map_err(storage)?;
    Ok(rows.into_iter().map(Into::into).collect())
  }

  async fn count_foods(&self) -> Result<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM foods")
      .fetch_one(&self.pool)
      .await
      .map_err(storage)?;
    Ok(count.max(0) as u64)
  }

  #[instrument(name = "PgStore::insert_food", skip(self, item), fields(food_id = %item.id), err(Display))]
  async fn insert_food(&self, item: FoodItem) -> Result<FoodItem> {
    let row = sqlx::query_as::<_, FoodRow>(
      "INSERT INTO foods \
       (id, seller_email, seller_name, name, category, image_url, origin, description, price, quantity, order_count, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
       RETURNING id, seller_email, seller_name, name, category, image_url, origin, description, \
       price, quantity, order_count, created_at",
    )
    .bind(item.id)
    .bind(&item.seller_email)
    .bind(&item.seller_name)
    .bind(&item.name)
    .bind(&item.category)
    .bind(&item.image_url)
    .bind(&item.origin)
    .bind(&item.description)
    .bind(item.price)
    .bind(item.quantity)
    .bind(item.order_count)
    .bind(item.created_at)
    .fetch_one(&self.pool)
    .await
    .map_err(storage)?;
    Ok(row.into())
  }

  #[instrument(name = "PgStore::update_food", skip(self, patch), err(Display))]
  async fn update_food(&self, id: Uuid, patch: &FoodPatch) -> Result<FoodItem> {
    patch.validate()?;
    let row = sqlx::query_as::<_, FoodRow>(
      "UPDATE foods SET \
       seller_name = COALESCE($2, seller_name), \
       name = COALESCE($3, name), \
       category = COALESCE($4, category), \
       image_url = COALESCE($5, image_url), \
       origin = COALESCE($6, origin), \
       description = COALESCE($7, description), \
       price = COALESCE($8, price), \
       quantity = COALESCE($9, quantity) \
       WHERE id = $1 \
       RETURNING id, seller_email, seller_name, name, category, image_url, origin, description, \
       price, quantity, order_count, created_at",
    )
    .bind(id)
    .bind(&patch.seller_name)
    .bind(patch.name.as_ref().map(|n| n.trim().to_string()))
    .bind(&patch.category)
    .bind(&patch.image_url)
    .bind(&patch.origin)
    .bind(&patch.description)
    .bind(patch.price)
    .bind(patch.quantity)
    .fetch_optional(&self.pool)
    .await
    .map_err(storage)?;
    row.map(Into::into).ok_or_else(|| MarketError::not_found("food", id))
  }

  async fn delete_food(&self, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM foods WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(storage)?;
    if result.rows_affected() == 0 {
      return Err(MarketError::not_found("food", id));
    }
    Ok(())
  }

  async fn reserve(&self, id: Uuid, quantity: i32) -> Result<FoodItem> {
    let mut conn = self.pool.acquire().await.map_err(storage)?;
    reserve_on(&mut conn, id, quantity).await
  }
}

#[async_trait]
impl OrderLedger for PgStore {
  async fn insert_order(&self, order: NewOrder) -> Result<Order> {
    let mut conn = self.pool.acquire().await.map_err(storage)?;
    insert_order_on(&mut conn, order).await
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    let sql = format!("{} WHERE id = $1", SELECT_ORDER);
    let row = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(storage)?;
    Ok(row.map(Into::into))
  }

  async fn list_by_buyer(&self, buyer_email: &str) -> Result<Vec<Order>> {
    let sql = format!("{} WHERE buyer_email = $1 ORDER BY seq", SELECT_ORDER);
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(buyer_email)
      .fetch_all(&self.pool)
      .await
      .map_err(storage)?;
    Ok(rows.into_iter().map(Into::into).collect())
  }

  async fn find_by_idempotency_key(&self, buyer_email: &str, key: &str) -> Result<Option<Order>> {
    let sql = format!("{} WHERE buyer_email = $1 AND idempotency_key = $2", SELECT_ORDER);
    let row = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(buyer_email)
      .bind(key)
      .fetch_optional(&self.pool)
      .await
      .map_err(storage)?;
    Ok(row.map(Into::into))
  }

  async fn delete_order(&self, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(storage)?;
    if result.rows_affected() == 0 {
      return Err(MarketError::not_found("order", id));
    }
    Ok(())
  }
}

#[async_trait]
impl UserDirectory for PgStore {
  async fn insert_user(&self, user: NewUser) -> Result<User> {
    let user = user.into_user();
    let row = sqlx::query_as::<_, UserRow>(
      "INSERT INTO users (id, email, name, photo_url, created_at) VALUES ($1, $2, $3, $4, $5) \
       RETURNING id, email, name, photo_url, created_at",
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.photo_url)
    .bind(user.created_at)
    .fetch_one(&self.pool)
    .await
    .map_err(storage)?;
    Ok(row.into())
  }
}

#[async_trait]
impl MarketStore for PgStore {
  async fn begin_reservation(&self) -> Result<Box<dyn ReservationTx>> {
    let tx = self.pool.begin().await.map_err(storage)?;
    Ok(Box::new(PgReservation { tx }))
  }
}

pub struct PgReservation {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ReservationTx for PgReservation {
  #[instrument(name = "PgReservation::reserve", skip(self), err(Display))]
  async fn reserve(&mut self, food_id: Uuid, quantity: i32) -> Result<FoodItem> {
    reserve_on(&mut self.tx, food_id, quantity).await
  }

  async fn record_order(&mut self, order: NewOrder) -> Result<Order> {
    insert_order_on(&mut self.tx, order).await
  }

  async fn commit(self: Box<Self>) -> Result<()> {
    let PgReservation { tx } = *self;
    tx.commit().await.map_err(|e| {
      if is_unique_violation(&e) {
        MarketError::DuplicateIdempotencyKey
      } else {
        warn!(error = %e, "Reservation commit failed.");
        storage(e)
      }
    })?;
    debug!("Reservation committed.");
    Ok(())
  }
}
