// server/src/models/user.rs

use chrono::{DateTime, Utc};
use foodlane::User;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
  pub id: Uuid,
  pub email: String,
  pub name: Option<String>,
  pub photo_url: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
  fn from(row: UserRow) -> Self {
    User {
      id: row.id,
      email: row.email,
      name: row.name,
      photo_url: row.photo_url,
      created_at: row.created_at,
    }
  }
}
