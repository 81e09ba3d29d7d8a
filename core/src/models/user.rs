// core/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::food::validate_email;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: Uuid,
  pub email: String,
  pub name: Option<String>,
  pub photo_url: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
  pub email: String,
  pub name: Option<String>,
  pub photo_url: Option<String>,
}

impl NewUser {
  pub fn validate(&self) -> Result<()> {
    validate_email(&self.email)
  }

  pub fn into_user(self) -> User {
    User {
      id: Uuid::new_v4(),
      email: self.email.trim().to_string(),
      name: self.name,
      photo_url: self.photo_url,
      created_at: Utc::now(),
    }
  }
}
