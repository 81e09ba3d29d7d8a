// core/src/identity.rs

//! Caller identity: verification of inbound credentials and issuance of new
//! ones after the out-of-band login step.
//!
//! Credentials are compact HS256 tokens (`header.claims.signature`, each part
//! base64url without padding) signed with a server secret and valid for a
//! bounded time. Verification is pure: no session state is kept.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, instrument};

use crate::error::{MarketError, Result};
use crate::models::food::validate_email;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
const MIN_SECRET_LEN: usize = 32;

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub email: String,
  pub name: Option<String>,
  pub expires_at: DateTime<Utc>,
}

/// What a caller asserts at login.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityClaim {
  pub email: String,
  pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IssuedCredential {
  pub token: String,
  pub expires_at: DateTime<Utc>,
}

pub trait IdentityVerifier: Send + Sync {
  /// `None` means the request carried no credential at all.
  fn verify(&self, credential: Option<&str>) -> Result<Identity>;
}

/// Only the exact header this authority issues is accepted.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Header {
  alg: String,
  typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  email: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  name: Option<String>,
  iat: i64,
  exp: i64,
}

pub struct TokenAuthority {
  secret: Vec<u8>,
  ttl: Duration,
}

impl std::fmt::Debug for TokenAuthority {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TokenAuthority")
      .field("secret", &"[REDACTED]")
      .field("ttl", &self.ttl)
      .finish()
  }
}

impl TokenAuthority {
  pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self> {
    let secret = secret.as_ref();
    if secret.len() < MIN_SECRET_LEN {
      return Err(MarketError::Validation(format!(
        "token secret must be at least {} bytes",
        MIN_SECRET_LEN
      )));
    }
    if ttl <= Duration::zero() {
      return Err(MarketError::Validation("token ttl must be positive".to_string()));
    }
    Ok(Self {
      secret: secret.to_vec(),
      ttl,
    })
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  pub fn issue(&self, claim: IdentityClaim) -> Result<IssuedCredential> {
    self.issue_at(claim, Utc::now())
  }

  #[instrument(name = "TokenAuthority::issue", skip(self, claim), fields(email = %claim.email), err(Display))]
  pub fn issue_at(&self, claim: IdentityClaim, now: DateTime<Utc>) -> Result<IssuedCredential> {
    validate_email(&claim.email)?;
    let expires_at = now + self.ttl;
    let header = Header {
      alg: "HS256".to_string(),
      typ: "JWT".to_string(),
    };
    let claims = Claims {
      email: claim.email.trim().to_string(),
      name: claim.name,
      iat: now.timestamp(),
      exp: expires_at.timestamp(),
    };

    let header_json = serde_json::to_vec(&header).map_err(MarketError::storage)?;
    let claims_json = serde_json::to_vec(&claims).map_err(MarketError::storage)?;
    let signing_input = format!(
      "{}.{}",
      URL_SAFE_NO_PAD.encode(header_json),
      URL_SAFE_NO_PAD.encode(claims_json)
    );
    let signature = self.mac(&signing_input)?.finalize().into_bytes();
    debug!("Credential issued.");

    Ok(IssuedCredential {
      token: format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)),
      expires_at,
    })
  }

  pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity> {
    let mut parts = token.trim().split('.');
    let (header_b64, claims_b64, signature_b64) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
      (Some(h), Some(c), Some(s), None) => (h, c, s),
      _ => return Err(MarketError::unauthenticated("malformed credential")),
    };

    let header: Header = decode_json(header_b64)?;
    if header.alg != "HS256" {
      return Err(MarketError::unauthenticated("unsupported credential algorithm"));
    }
    if header.typ != "JWT" {
      return Err(MarketError::unauthenticated("unsupported credential type"));
    }

    let signature = URL_SAFE_NO_PAD
      .decode(signature_b64)
      .map_err(|_| MarketError::unauthenticated("malformed credential signature"))?;
    let signing_input = format!("{}.{}", header_b64, claims_b64);
    self
      .mac(&signing_input)?
      .verify_slice(&signature)
      .map_err(|_| MarketError::unauthenticated("credential signature mismatch"))?;

    let claims: Claims = decode_json(claims_b64)?;
    let expires_at = Utc
      .timestamp_opt(claims.exp, 0)
      .single()
      .ok_or_else(|| MarketError::unauthenticated("credential expiry out of range"))?;
    if expires_at <= now {
      return Err(MarketError::unauthenticated("credential expired"));
    }

    Ok(Identity {
      email: claims.email,
      name: claims.name,
      expires_at,
    })
  }

  fn mac(&self, signing_input: &str) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(&self.secret)
      .map_err(|e| MarketError::Validation(format!("invalid signing key: {}", e)))?;
    mac.update(signing_input.as_bytes());
    Ok(mac)
  }
}

impl IdentityVerifier for TokenAuthority {
  fn verify(&self, credential: Option<&str>) -> Result<Identity> {
    match credential {
      Some(token) if !token.trim().is_empty() => self.verify_at(token, Utc::now()),
      _ => Err(MarketError::unauthenticated("missing credential")),
    }
  }
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T> {
  let bytes = URL_SAFE_NO_PAD
    .decode(segment)
    .map_err(|_| MarketError::unauthenticated("malformed credential encoding"))?;
  serde_json::from_slice(&bytes).map_err(|_| MarketError::unauthenticated("malformed credential payload"))
}
